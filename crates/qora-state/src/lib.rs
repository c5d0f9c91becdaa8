//! Typed object-attribute state representation.
//!
//! - [`AttributeValue`] — a fixed-length integer vector treated as a single
//!   attribute reading (spec.md §4.C1).
//! - [`Registry`] — the catalogue of attribute types, object classes, and
//!   actions (spec.md §4.C2).
//! - [`Object`] / [`State`] — typed objects and the state that holds them
//!   (spec.md §4.C3).
mod attribute_value;
mod object;
mod registry;
mod state;

pub use attribute_value::AttributeValue;
pub use object::{Action, AttributeType, Object, ObjectClass};
pub use registry::Registry;
pub use state::State;

pub use qora_core::Id;

/// Tags an [`Id`] as naming an [`AttributeType`].
pub struct AttributeTypeTag;
/// Tags an [`Id`] as naming an [`ObjectClass`].
pub struct ObjectClassTag;
/// Tags an [`Id`] as naming an [`Action`].
pub struct ActionTag;
/// Tags an [`Id`] as naming an [`Object`] instance within a [`State`].
pub struct ObjectIdTag;

pub type AttributeId = Id<AttributeTypeTag>;
pub type ClassId = Id<ObjectClassTag>;
pub type ActionId = Id<ActionTag>;
pub type ObjectId = Id<ObjectIdTag>;
