use crate::{decode_condition, encode_condition};
use qora_core::{Alpha, QoraError, Result};
use qora_learner::{Candidate, FrequencyTable};
use qora_state::Registry;
use serde_json::{json, Value};

/// `{ predicates: Condition, counter: FrequencyTable }`, ported from
/// `to_json(json&, const Candidate&, const Types&)` in
/// `original_source/QORA/LearnerQORA.cpp`.
pub fn encode_candidate(candidate: &Candidate, registry: &Registry) -> Value {
    json!({
        "predicates": encode_condition(&candidate.condition, registry),
        "counter": serde_json::to_value(&candidate.table)
            .expect("FrequencyTable serialization is infallible"),
    })
}

/// Decode a candidate and immediately `recalculate` its table at `alpha`,
/// matching the reference implementation's `from_json`, which always
/// recalculates right after loading a table's raw counts.
pub fn decode_candidate(json: &Value, registry: &Registry, alpha: Alpha) -> Result<Candidate> {
    let condition = decode_condition(
        json.get("predicates")
            .ok_or_else(|| QoraError::decode("predicates", "missing field"))?,
        registry,
    )?;
    let table: FrequencyTable = serde_json::from_value(
        json.get("counter")
            .ok_or_else(|| QoraError::decode("counter", "missing field"))?
            .clone(),
    )
    .map_err(|err| QoraError::decode("counter", err))?;
    let mut candidate = Candidate { condition, table };
    candidate.table.recalculate(alpha);
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_condition::{Condition, Predicate, RelationGroup};
    use qora_state::AttributeValue;
    use std::collections::BTreeSet;

    #[test]
    fn round_trips_condition_and_counts() {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);

        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let condition = Condition::new(BTreeSet::from([RelationGroup::new(None, predicates)]));
        let mut candidate = Candidate::new(condition);
        candidate.table.observe(0, 0);
        candidate.table.observe(0, 1);
        candidate.table.recalculate(0.05);

        let json = encode_candidate(&candidate, &registry);
        let decoded = decode_candidate(&json, &registry, 0.05).unwrap();
        assert_eq!(decoded.condition, candidate.condition);
        assert_eq!(decoded.table.success_interval(), candidate.table.success_interval());
    }
}
