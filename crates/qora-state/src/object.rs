use crate::{AttributeId, AttributeValue, ClassId, ObjectId};
use std::collections::{BTreeMap, BTreeSet};

/// `{ name, width, id }` — spec.md §3. Names are unique within a
/// [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttributeType {
    pub id: AttributeId,
    pub name: String,
    pub width: usize,
}

/// `{ name, attribute_ids, id }` — spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ObjectClass {
    pub id: ClassId,
    pub name: String,
    pub attribute_ids: BTreeSet<AttributeId>,
}

/// `{ id, name }` — spec.md §3. Ids `0..4` are reserved for the five
/// standard actions once [`Registry::add_standard_actions`](crate::Registry::add_standard_actions)
/// has been called.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub id: crate::ActionId,
    pub name: String,
}

/// A typed object: class id + object id + a map from attribute id to
/// [`AttributeValue`] (spec.md §3).
///
/// Invariant: every attribute present must belong to the class's
/// `attribute_ids`, and the value's width must equal the attribute type's
/// declared width. Both invariants are enforced at construction time by
/// [`Registry::create_object`](crate::Registry::create_object) and by
/// [`Object::set_attribute`], which is the only public mutator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Object {
    pub class_id: ClassId,
    pub object_id: ObjectId,
    attributes: BTreeMap<AttributeId, AttributeValue>,
}

impl Object {
    pub(crate) fn new(class_id: ClassId, object_id: ObjectId) -> Self {
        Self {
            class_id,
            object_id,
            attributes: BTreeMap::new(),
        }
    }

    pub(crate) fn insert_attribute(&mut self, id: AttributeId, value: AttributeValue) {
        self.attributes.insert(id, value);
    }

    pub fn attribute(&self, id: AttributeId) -> Option<&AttributeValue> {
        self.attributes.get(&id)
    }

    pub fn has_attribute(&self, id: AttributeId) -> bool {
        self.attributes.contains_key(&id)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (AttributeId, &AttributeValue)> {
        self.attributes.iter().map(|(&k, v)| (k, v))
    }

    pub fn attribute_ids(&self) -> impl Iterator<Item = AttributeId> + '_ {
        self.attributes.keys().copied()
    }

    /// Overwrite an existing attribute's value. Setting an attribute that
    /// does not already belong to this object is a programming error
    /// (spec.md §3 invariant).
    pub fn set_attribute(&mut self, id: AttributeId, value: AttributeValue) {
        assert!(
            self.attributes.contains_key(&id),
            "attribute {id} does not belong to object {} (class {})",
            self.object_id,
            self.class_id
        );
        self.attributes.insert(id, value);
    }

    /// Insert or overwrite an attribute regardless of whether it was
    /// already present. Used to build objects up one attribute at a time
    /// — e.g. a state distribution's candidate objects, which start out
    /// attribute-less and accumulate attributes via repeated cartesian
    /// products (spec.md §4.C5) — where [`set_attribute`](Self::set_attribute)'s
    /// "must already exist" invariant does not apply.
    pub fn insert_or_set_attribute(&mut self, id: AttributeId, value: AttributeValue) {
        self.attributes.insert(id, value);
    }

    /// L1 distance between two objects: sum of the `length()` of the
    /// elementwise difference over the attribute ids both objects share.
    pub fn distance(&self, other: &Object) -> i64 {
        self.attributes
            .iter()
            .filter_map(|(id, value)| {
                other
                    .attribute(*id)
                    .map(|ov| (value.clone() - ov.clone()).length())
            })
            .sum()
    }
}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Object {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.class_id, self.object_id, &self.attributes).cmp(&(
            other.class_id,
            other.object_id,
            &other.attributes,
        ))
    }
}
