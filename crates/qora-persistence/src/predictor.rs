use crate::{decode_candidate, decode_condition, encode_candidate, encode_condition};
use qora_core::{Alpha, QoraError, Result};
use qora_learner::{FrequencyTable, StochasticEffectPredictor};
use qora_state::Registry;
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// `{ observed, current, hypotheses, baseline, effects }` (spec.md §6),
/// ported from `StochasticEffectPredictor::to_json`/`from_json` in
/// `original_source/QORA/LearnerQORA.cpp`.
pub fn encode_predictor(predictor: &StochasticEffectPredictor, registry: &Registry) -> Value {
    json!({
        "observed": predictor
            .observed()
            .iter()
            .map(|c| encode_condition(c, registry))
            .collect::<Vec<_>>(),
        "current": predictor
            .working()
            .iter()
            .map(|c| encode_candidate(c, registry))
            .collect::<Vec<_>>(),
        "hypotheses": predictor
            .hypotheses()
            .iter()
            .map(|c| encode_candidate(c, registry))
            .collect::<Vec<_>>(),
        "baseline": serde_json::to_value(predictor.baseline())
            .expect("FrequencyTable serialization is infallible"),
        "effects": serde_json::to_value(predictor.effects())
            .expect("AttributeValue serialization is infallible"),
    })
}

/// Decode a predictor at a given `alpha` (the learner's own confidence
/// level, not persisted per-predictor — spec.md §4.C9 "Persistence"
/// notes that `α` is recomputed from the learner's own parameter on
/// decode). Every loaded `FrequencyTable` is immediately recalculated,
/// matching the reference implementation's `from_json`.
pub fn decode_predictor(json: &Value, registry: &Registry, alpha: Alpha) -> Result<StochasticEffectPredictor> {
    let observed = json
        .get("observed")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("observed", "missing or not an array"))?
        .iter()
        .map(|c| decode_condition(c, registry))
        .collect::<Result<BTreeSet<_>>>()?;

    let working = json
        .get("current")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("current", "missing or not an array"))?
        .iter()
        .map(|c| decode_candidate(c, registry, alpha))
        .collect::<Result<Vec<_>>>()?;

    let hypotheses = json
        .get("hypotheses")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("hypotheses", "missing or not an array"))?
        .iter()
        .map(|c| decode_candidate(c, registry, alpha))
        .collect::<Result<Vec<_>>>()?;

    let mut baseline: FrequencyTable = serde_json::from_value(
        json.get("baseline")
            .ok_or_else(|| QoraError::decode("baseline", "missing field"))?
            .clone(),
    )
    .map_err(|err| QoraError::decode("baseline", err))?;
    baseline.recalculate(alpha);

    let effects = serde_json::from_value(
        json.get("effects")
            .ok_or_else(|| QoraError::decode("effects", "missing field"))?
            .clone(),
    )
    .map_err(|err| QoraError::decode("effects", err))?;

    Ok(StochasticEffectPredictor::from_parts(
        alpha, observed, working, hypotheses, baseline, effects,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_condition::ObjectsByClass;
    use qora_state::{AttributeValue, Id};
    use std::collections::BTreeMap;

    fn toggle_registry() -> (Registry, qora_state::ClassId, qora_state::AttributeId) {
        let mut registry = Registry::new();
        let on = registry.add_attribute_type("on", 1);
        let class = registry.add_object_class("light");
        registry.add_attribute_to_class(class, on);
        (registry, class, on)
    }

    #[test]
    fn decoded_predictor_predicts_pointwise_equal_to_the_original() {
        let (registry, class, on) = toggle_registry();
        let mut predictor = StochasticEffectPredictor::new(0.05);
        let objects_by_class: ObjectsByClass<'_> = BTreeMap::new();

        let plus_one = AttributeValue::from_values(vec![1]);
        let minus_one = AttributeValue::from_values(vec![-1]);
        for step in 0..40 {
            let mut target = registry.create_object(class, Id::new(0));
            let is_off = step % 2 == 0;
            target.set_attribute(on, AttributeValue::from_values(vec![if is_off { 0 } else { 1 }]));
            let effect = if is_off { &plus_one } else { &minus_one };
            predictor.observe(&target, &registry, &objects_by_class, effect);
        }

        let json = encode_predictor(&predictor, &registry);
        let decoded = decode_predictor(&json, &registry, 0.05).unwrap();

        let mut off_target = registry.create_object(class, Id::new(0));
        off_target.set_attribute(on, AttributeValue::from_values(vec![0]));

        let original = predictor.predict(&off_target, &objects_by_class);
        let restored = decoded.predict(&off_target, &objects_by_class);
        assert_eq!(original.get(&plus_one), restored.get(&plus_one));
        assert_eq!(original.get(&minus_one), restored.get(&minus_one));
    }
}
