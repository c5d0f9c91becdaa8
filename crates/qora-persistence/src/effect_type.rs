use qora_core::{QoraError, Result};
use qora_learner::EffectType;
use qora_state::Registry;
use serde_json::{json, Value};

/// `{ object_type: name, attribute_type: name }` (spec.md §6), ported from
/// the reference implementation's `to_json(json&, const EffectType&,
/// const Types&)` in `original_source/QORA/LearnerQORA.cpp`.
pub fn encode_effect_type(effect_type: EffectType, registry: &Registry) -> Value {
    json!({
        "object_type": registry.object_class(effect_type.class_id).name,
        "attribute_type": registry.attribute_type(effect_type.attribute_id).name,
    })
}

pub fn decode_effect_type(json: &Value, registry: &Registry) -> Result<EffectType> {
    let object_type = json
        .get("object_type")
        .and_then(Value::as_str)
        .ok_or_else(|| QoraError::decode("effect_type.object_type", "missing or not a string"))?;
    let attribute_type = json
        .get("attribute_type")
        .and_then(Value::as_str)
        .ok_or_else(|| QoraError::decode("effect_type.attribute_type", "missing or not a string"))?;
    let class = registry.object_class_by_name(object_type)?;
    let attribute = registry.attribute_type_by_name(attribute_type)?;
    Ok(EffectType::new(class.id, attribute.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (Registry, EffectType) {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("player");
        registry.add_attribute_to_class(class, pos);
        (registry, EffectType::new(class, pos))
    }

    #[test]
    fn round_trips_by_name() {
        let (registry, effect_type) = registry();
        let json = encode_effect_type(effect_type, &registry);
        assert_eq!(json["object_type"], "player");
        assert_eq!(json["attribute_type"], "pos");
        let decoded = decode_effect_type(&json, &registry).unwrap();
        assert_eq!(decoded, effect_type);
    }

    #[test]
    fn unknown_name_is_decode_error() {
        let (registry, _effect_type) = registry();
        let json = json!({"object_type": "nope", "attribute_type": "pos"});
        let err = decode_effect_type(&json, &registry).unwrap_err();
        assert!(matches!(err, QoraError::RegistryMismatch(_)));
    }
}
