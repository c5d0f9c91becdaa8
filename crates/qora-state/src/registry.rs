use crate::{Action, ActionId, AttributeId, AttributeType, AttributeValue, ClassId, Object, ObjectClass, ObjectId};
use qora_core::{standard_actions, QoraError, Result};
use std::collections::BTreeMap;

/// The catalogue of attribute types, object classes, and actions
/// (spec.md §4.C2). Created once at domain initialization and immutable
/// thereafter — there is no API to remove or rename an entry once added.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    attribute_types: Vec<AttributeType>,
    attribute_type_names: BTreeMap<String, AttributeId>,
    object_classes: Vec<ObjectClass>,
    object_class_names: BTreeMap<String, ClassId>,
    actions: Vec<Action>,
    action_names: BTreeMap<String, ActionId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new attribute type, returning its freshly assigned id.
    /// Names must be unique within the registry.
    pub fn add_attribute_type(&mut self, name: impl Into<String>, width: usize) -> AttributeId {
        let name = name.into();
        assert!(
            !self.attribute_type_names.contains_key(&name),
            "attribute type name `{name}` already registered"
        );
        let id = AttributeId::new(self.attribute_types.len() as u32);
        self.attribute_types.push(AttributeType {
            id,
            name: name.clone(),
            width,
        });
        self.attribute_type_names.insert(name, id);
        id
    }

    pub fn attribute_type(&self, id: AttributeId) -> &AttributeType {
        &self.attribute_types[id.index()]
    }

    pub fn attribute_type_by_name(&self, name: &str) -> Result<&AttributeType> {
        self.attribute_type_names
            .get(name)
            .map(|&id| self.attribute_type(id))
            .ok_or_else(|| QoraError::registry_mismatch(format!("unknown attribute type `{name}`")))
    }

    pub fn attribute_types(&self) -> impl Iterator<Item = &AttributeType> {
        self.attribute_types.iter()
    }

    /// Register a new object class with no attributes yet, returning its id.
    pub fn add_object_class(&mut self, name: impl Into<String>) -> ClassId {
        let name = name.into();
        assert!(
            !self.object_class_names.contains_key(&name),
            "object class name `{name}` already registered"
        );
        let id = ClassId::new(self.object_classes.len() as u32);
        self.object_classes.push(ObjectClass {
            id,
            name: name.clone(),
            attribute_ids: Default::default(),
        });
        self.object_class_names.insert(name, id);
        id
    }

    /// Associate an attribute type with an object class.
    pub fn add_attribute_to_class(&mut self, class_id: ClassId, attribute_id: AttributeId) {
        self.object_classes[class_id.index()]
            .attribute_ids
            .insert(attribute_id);
    }

    pub fn object_class(&self, id: ClassId) -> &ObjectClass {
        &self.object_classes[id.index()]
    }

    pub fn object_class_by_name(&self, name: &str) -> Result<&ObjectClass> {
        self.object_class_names
            .get(name)
            .map(|&id| self.object_class(id))
            .ok_or_else(|| QoraError::registry_mismatch(format!("unknown object class `{name}`")))
    }

    pub fn object_classes(&self) -> impl Iterator<Item = &ObjectClass> {
        self.object_classes.iter()
    }

    /// Register a new action, auto-assigning the next dense id.
    pub fn new_action(&mut self, name: impl Into<String>) -> ActionId {
        let name = name.into();
        assert!(
            !self.action_names.contains_key(&name),
            "action name `{name}` already registered"
        );
        let id = ActionId::new(self.actions.len() as u32);
        self.actions.push(Action {
            id,
            name: name.clone(),
        });
        self.action_names.insert(name, id);
        id
    }

    /// Populate the five standard actions (NOOP, MOVE_LEFT, MOVE_RIGHT,
    /// MOVE_UP, MOVE_DOWN) at ids `0..4`. May be called at most once per
    /// registry, and only before any other action has been added
    /// (spec.md §4.C2).
    pub fn add_standard_actions(&mut self) {
        assert!(
            self.actions.is_empty(),
            "add_standard_actions must be called before any other action is registered"
        );
        for name in ["NOOP", "MOVE_LEFT", "MOVE_RIGHT", "MOVE_UP", "MOVE_DOWN"] {
            self.new_action(name);
        }
        debug_assert_eq!(self.actions[standard_actions::NOOP as usize].name, "NOOP");
    }

    pub fn action(&self, id: ActionId) -> &Action {
        &self.actions[id.index()]
    }

    pub fn action_by_name(&self, name: &str) -> Result<&Action> {
        self.action_names
            .get(name)
            .map(|&id| self.action(id))
            .ok_or_else(|| QoraError::registry_mismatch(format!("unknown action `{name}`")))
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Materialize an `Object` with every attribute of `class_id` present,
    /// each set to its zero vector (spec.md §4.C2).
    pub fn create_object(&self, class_id: ClassId, object_id: ObjectId) -> Object {
        let class = self.object_class(class_id);
        let mut object = Object::new(class_id, object_id);
        for &attr_id in &class.attribute_ids {
            let width = self.attribute_type(attr_id).width;
            object.insert_attribute(attr_id, AttributeValue::zero(width));
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_actions_occupy_reserved_ids() {
        let mut registry = Registry::new();
        registry.add_standard_actions();
        assert_eq!(registry.action(ActionId::new(standard_actions::NOOP)).name, "NOOP");
        assert_eq!(
            registry.action(ActionId::new(standard_actions::MOVE_DOWN)).name,
            "MOVE_DOWN"
        );
        assert_eq!(registry.actions().count(), 5);
    }

    #[test]
    #[should_panic]
    fn standard_actions_only_once() {
        let mut registry = Registry::new();
        registry.add_standard_actions();
        registry.add_standard_actions();
    }

    #[test]
    fn create_object_zeroes_every_class_attribute() {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 2);
        let class = registry.add_object_class("player");
        registry.add_attribute_to_class(class, pos);

        let object = registry.create_object(class, ObjectId::new(0));
        assert_eq!(object.attribute(pos).unwrap().width(), 2);
        assert_eq!(object.attribute(pos).unwrap().length(), 0);
    }

    #[test]
    fn lookup_by_unknown_name_is_registry_mismatch() {
        let registry = Registry::new();
        let err = registry.attribute_type_by_name("nope").unwrap_err();
        assert!(matches!(err, QoraError::RegistryMismatch(_)));
    }
}
