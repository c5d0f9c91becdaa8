use crate::{ClassId, Object, ObjectId};
use qora_core::{QoraError, Result};
use std::collections::BTreeMap;

/// `{ next_object_id, objects }` (spec.md §3).
///
/// `next_object_id` is monotonically non-decreasing and is the source of
/// fresh object ids. Object ids are unique within a state. Equality and
/// the total order are both derived from `objects` alone — `next_object_id`
/// takes no part in either, matching the reference implementation's
/// `State::operator==` (`Environment.cpp`), which compares the object map
/// only. This keeps `Eq` consistent with `Ord` (line ~184) and is what
/// makes the persistence round-trip `decode(encode(s)) == s` hold even
/// though `encode_state` drops `next_object_id` and `decode_state` rederives
/// it as `max(object_id) + 1`, which need not match the original value
/// (e.g. after a `remove` of the highest-id object).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct State {
    next_object_id: u32,
    objects: BTreeMap<ObjectId, Object>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects
    }
}
impl Eq for State {}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    pub fn new() -> Self {
        Self {
            next_object_id: 0,
            objects: BTreeMap::new(),
        }
    }

    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    /// Allocate a fresh object id from the monotonic counter, without
    /// inserting anything. Callers typically pass the result straight to
    /// [`crate::Registry::create_object`] and then [`State::insert`].
    pub fn fresh_object_id(&mut self) -> ObjectId {
        let id = ObjectId::new(self.next_object_id);
        self.next_object_id += 1;
        id
    }

    /// Create a new object of `class_id` from `registry`, assign it a
    /// fresh id, insert it, and return that id.
    pub fn insert_fresh(&mut self, registry: &crate::Registry, class_id: ClassId) -> ObjectId {
        let id = self.fresh_object_id();
        let object = registry.create_object(class_id, id);
        self.objects.insert(id, object);
        id
    }

    /// Insert an object at its own id, bumping `next_object_id` if needed
    /// to keep the "source of fresh ids" invariant intact.
    pub fn insert(&mut self, object: Object) {
        self.next_object_id = self.next_object_id.max(object.object_id.raw() + 1);
        self.objects.insert(object.object_id, object);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// A lazy view over the subset of objects belonging to `class_id`.
    pub fn objects_of_class(&self, class_id: ClassId) -> impl Iterator<Item = &Object> {
        self.objects
            .values()
            .filter(move |o| o.class_id == class_id)
    }

    /// Groups every object by class id, for use as the "other objects,
    /// grouped by class" view the hypothesis-search engine needs
    /// (spec.md §9 "Shared object views").
    pub fn class_index(&self) -> BTreeMap<ClassId, Vec<&Object>> {
        let mut index: BTreeMap<ClassId, Vec<&Object>> = BTreeMap::new();
        for object in self.objects.values() {
            index.entry(object.class_id).or_default().push(object);
        }
        index
    }

    /// Sum of each object's attributes' L1 norms.
    pub fn length(&self) -> i64 {
        self.objects
            .values()
            .flat_map(|o| o.attributes())
            .map(|(_, v)| v.length())
            .sum()
    }

    /// Elementwise difference of two states with identical object-id sets:
    /// `self.diff(prev)` yields a state where every attribute holds
    /// `self_value - prev_value`. Fails with `StructuralMismatch` if the
    /// object-id sets differ (spec.md §4.C3, §7).
    pub fn diff(&self, prev: &State) -> Result<State> {
        self.require_same_keys(prev)?;
        let mut objects = BTreeMap::new();
        for (id, object) in &self.objects {
            let prev_object = &prev.objects[id];
            let mut delta = Object::new(object.class_id, *id);
            for (attr_id, value) in object.attributes() {
                let prev_value = prev_object
                    .attribute(attr_id)
                    .cloned()
                    .unwrap_or_else(|| value.clone());
                delta.insert_attribute(attr_id, value.clone() - prev_value);
            }
            objects.insert(*id, delta);
        }
        Ok(State {
            next_object_id: self.next_object_id,
            objects,
        })
    }

    /// Adds `delta`'s attributes elementwise onto `self`'s. Used by the
    /// `s.apply(s.diff(prev)) == s` property (spec.md §8 property 2).
    pub fn apply(&self, delta: &State) -> Result<State> {
        self.require_same_keys(delta)?;
        let mut objects = BTreeMap::new();
        for (id, object) in &self.objects {
            let delta_object = &delta.objects[id];
            let mut applied = Object::new(object.class_id, *id);
            for (attr_id, value) in object.attributes() {
                let delta_value = delta_object
                    .attribute(attr_id)
                    .cloned()
                    .unwrap_or_else(|| crate::AttributeValue::zero(value.width()));
                applied.insert_attribute(attr_id, value.clone() + delta_value);
            }
            objects.insert(*id, applied);
        }
        Ok(State {
            next_object_id: self.next_object_id,
            objects,
        })
    }

    /// `length(self.diff(other))`, requiring matching key sets
    /// (spec.md §4.C3).
    pub fn error(&self, other: &State) -> Result<i64> {
        Ok(self.diff(other)?.length())
    }

    fn require_same_keys(&self, other: &State) -> Result<()> {
        if self.objects.keys().eq(other.objects.keys()) {
            Ok(())
        } else {
            Err(QoraError::structural_mismatch(
                "states do not share an identical object-id set",
            ))
        }
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for State {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.objects.cmp(&other.objects)
    }
}
