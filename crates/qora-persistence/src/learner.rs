use crate::{decode_effect_type, decode_predictor, encode_effect_type, encode_predictor};
use qora_core::{QoraError, Result};
use qora_learner::{Parameters, Qora};
use qora_state::{AttributeValue, Registry};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// A decoded persisted-learner document (spec.md §6): the reconstructed
/// [`Qora`] learner plus the `domain` blob, which belongs to the
/// environment rather than the core and is passed through opaquely.
pub struct DecodedLearnerDocument {
    pub qora: Qora,
    pub domain: Value,
}

/// Encode a full persisted-learner document: `{ name: "qora", parameters,
/// domain, observations, model: { effects, predictors } }` (spec.md §6),
/// grounded in `LearnerQORA::to_json` (`original_source/QORA/LearnerQORA.cpp`).
/// `domain` is supplied by the caller — the core learner has no knowledge
/// of the environment that produced its observations (spec.md §1 scope).
pub fn encode_qora(qora: &Qora, registry: &Registry, domain: Value) -> Value {
    let effects: Vec<Value> = qora
        .effects_observed()
        .map(|(effect_type, action, effects)| {
            json!({
                "effect_type": encode_effect_type(effect_type, registry),
                "action": registry.action(action).name,
                "effects": effects.iter().cloned().collect::<Vec<AttributeValue>>(),
            })
        })
        .collect();

    let predictors: Vec<Value> = qora
        .predictors()
        .map(|(effect_type, action, predictor)| {
            json!({
                "effect_type": encode_effect_type(effect_type, registry),
                "action": registry.action(action).name,
                "predictor": encode_predictor(predictor, registry),
            })
        })
        .collect();

    json!({
        "name": "qora",
        "parameters": { "alpha": qora.alpha() },
        "domain": domain,
        "observations": qora.observations(),
        "model": {
            "effects": effects,
            "predictors": predictors,
        },
    })
}

/// Decode a full persisted-learner document against `registry`. Every
/// class/attribute/action name is resolved against `registry`, so a
/// document produced by one registry instance decodes correctly against
/// any other registry built with the same names (spec.md §4.C10).
pub fn decode_qora(document: &Value, registry: &Registry) -> Result<DecodedLearnerDocument> {
    let alpha = document
        .get("parameters")
        .and_then(|p| p.get("alpha"))
        .and_then(Value::as_f64)
        .ok_or_else(|| QoraError::decode("parameters.alpha", "missing or not a number"))?;
    let observations = document
        .get("observations")
        .and_then(Value::as_u64)
        .ok_or_else(|| QoraError::decode("observations", "missing or not a non-negative integer"))?;
    let domain = document.get("domain").cloned().unwrap_or(Value::Null);

    let mut qora = Qora::new(Parameters::new(alpha));
    qora.set_observations(observations);

    let model = document
        .get("model")
        .ok_or_else(|| QoraError::decode("model", "missing field"))?;

    let effects_entries = model
        .get("effects")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("model.effects", "missing or not an array"))?;
    for (index, entry) in effects_entries.iter().enumerate() {
        let effect_type = decode_effect_type(
            entry
                .get("effect_type")
                .ok_or_else(|| QoraError::decode(format!("model.effects[{index}].effect_type"), "missing field"))?,
            registry,
        )?;
        let action_name = entry
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| QoraError::decode(format!("model.effects[{index}].action"), "missing or not a string"))?;
        let action = registry.action_by_name(action_name)?.id;
        let effects: BTreeSet<AttributeValue> = serde_json::from_value(
            entry
                .get("effects")
                .cloned()
                .ok_or_else(|| QoraError::decode(format!("model.effects[{index}].effects"), "missing field"))?,
        )
        .map_err(|err| QoraError::decode(format!("model.effects[{index}].effects"), err))?;
        qora.insert_effects_observed(effect_type, action, effects);
    }

    let predictor_entries = model
        .get("predictors")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("model.predictors", "missing or not an array"))?;
    for (index, entry) in predictor_entries.iter().enumerate() {
        let effect_type = decode_effect_type(
            entry
                .get("effect_type")
                .ok_or_else(|| QoraError::decode(format!("model.predictors[{index}].effect_type"), "missing field"))?,
            registry,
        )?;
        let action_name = entry
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| QoraError::decode(format!("model.predictors[{index}].action"), "missing or not a string"))?;
        let action = registry.action_by_name(action_name)?.id;
        let predictor = decode_predictor(
            entry
                .get("predictor")
                .ok_or_else(|| QoraError::decode(format!("model.predictors[{index}].predictor"), "missing field"))?,
            registry,
            alpha,
        )?;
        qora.insert_predictor(effect_type, action, predictor);
    }

    Ok(DecodedLearnerDocument { qora, domain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_state::{ActionId, ClassId, Id, State};
    use rand::{rngs::SmallRng, SeedableRng};

    fn wall_registry() -> (Registry, ClassId, ClassId, qora_state::AttributeId, ActionId) {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 2);
        let player = registry.add_object_class("player");
        let wall = registry.add_object_class("wall");
        registry.add_attribute_to_class(player, pos);
        registry.add_attribute_to_class(wall, pos);
        let move_right = registry.new_action("MOVE_RIGHT");
        (registry, player, wall, pos, move_right)
    }

    fn step(
        registry: &Registry,
        learner: &mut Qora,
        player: ClassId,
        wall: ClassId,
        pos: qora_state::AttributeId,
        action: ActionId,
        blocked: bool,
    ) {
        let mut prev = State::new();
        let player_id = prev.insert_fresh(registry, player);
        let mut player_object = prev.object(player_id).unwrap().clone();
        player_object.set_attribute(pos, AttributeValue::from_values(vec![0, 0]));
        prev.insert(player_object);
        if blocked {
            let wall_id = prev.insert_fresh(registry, wall);
            let mut wall_object = prev.object(wall_id).unwrap().clone();
            wall_object.set_attribute(pos, AttributeValue::from_values(vec![1, 0]));
            prev.insert(wall_object);
        }

        let mut next = prev.clone();
        let mut next_player = next.object(player_id).unwrap().clone();
        let delta = if blocked { 0 } else { 1 };
        next_player.set_attribute(pos, AttributeValue::from_values(vec![delta, 0]));
        next.insert(next_player);

        learner.observe_transition(registry, &prev, action, &next).unwrap();
    }

    #[test]
    fn round_trips_a_trained_learner() {
        let (registry, player, wall, pos, move_right) = wall_registry();
        let mut learner = Qora::new(Parameters::new(0.05));

        for i in 0..200 {
            step(&registry, &mut learner, player, wall, pos, move_right, i % 3 == 0);
        }

        let json = encode_qora(&learner, &registry, json!({"name": "grid-demo"}));
        assert_eq!(json["name"], "qora");
        assert_eq!(json["observations"], 200);

        let decoded = decode_qora(&json, &registry).unwrap();
        assert_eq!(decoded.domain, json!({"name": "grid-demo"}));
        assert_eq!(decoded.qora.observations(), learner.observations());
        assert_eq!(decoded.qora.alpha(), learner.alpha());

        let mut probe = State::new();
        let player_id = probe.insert_fresh(&registry, player);
        let mut player_object = probe.object(player_id).unwrap().clone();
        player_object.set_attribute(pos, AttributeValue::from_values(vec![0, 0]));
        probe.insert(player_object);

        let original = learner.predict_transition(&registry, &probe, move_right);
        let restored = decoded.qora.predict_transition(&registry, &probe, move_right);
        let mut rng_a = SmallRng::seed_from_u64(9);
        let mut rng_b = SmallRng::seed_from_u64(9);
        assert_eq!(original.sample(&mut rng_a), restored.sample(&mut rng_b));
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let (registry, _player, _wall, _pos, _move_right) = wall_registry();
        let err = decode_qora(&json!({"name": "qora"}), &registry).unwrap_err();
        assert!(matches!(err, QoraError::DecodeError { .. }));
    }
}
