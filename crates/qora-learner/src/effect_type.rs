use qora_state::{AttributeId, ClassId};

/// The `(class, attribute)` pair an effect predictor is responsible for
/// (spec.md §4.C9, grounded in `original_source/QORA/LearnerQORA.h`'s
/// `EffectType`). Used as half of the map key, alongside an `ActionId`,
/// identifying one predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct EffectType {
    pub class_id: ClassId,
    pub attribute_id: AttributeId,
}

impl EffectType {
    pub fn new(class_id: ClassId, attribute_id: AttributeId) -> Self {
        Self {
            class_id,
            attribute_id,
        }
    }
}

impl std::fmt::Display for EffectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.class_id, self.attribute_id)
    }
}
