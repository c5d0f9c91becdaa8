use qora_condition::{Condition, Predicate, RelationGroup};
use qora_core::{QoraError, Result, Scalar};
use qora_state::{AttributeValue, Registry};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// `{ attribute_type: name, is_relative, is_target, value: [ints] }`,
/// ported from `to_json(json&, const Predicate&, const Types&)` in
/// `original_source/QORA/LearnerQORA.cpp`.
pub fn encode_predicate(predicate: &Predicate, registry: &Registry) -> Value {
    json!({
        "attribute_type": registry.attribute_type(predicate.attribute_id).name,
        "is_relative": predicate.is_relative,
        "is_target": predicate.is_target,
        "value": attribute_value_to_vec(&predicate.value),
    })
}

pub fn decode_predicate(json: &Value, registry: &Registry) -> Result<Predicate> {
    let attribute_type = json
        .get("attribute_type")
        .and_then(Value::as_str)
        .ok_or_else(|| QoraError::decode("attribute_type", "missing or not a string"))?;
    let attribute = registry.attribute_type_by_name(attribute_type)?;
    let is_relative = json
        .get("is_relative")
        .and_then(Value::as_bool)
        .ok_or_else(|| QoraError::decode("is_relative", "missing or not a boolean"))?;
    let is_target = json
        .get("is_target")
        .and_then(Value::as_bool)
        .ok_or_else(|| QoraError::decode("is_target", "missing or not a boolean"))?;
    let value = decode_attribute_value(json.get("value"), attribute.width)?;
    Ok(Predicate {
        attribute_id: attribute.id,
        is_relative,
        is_target,
        value,
    })
}

/// `{ other_object_type: name or null, predicates: [Predicate, ...] }`,
/// ported from `to_json(json&, const RelationGroup&, const Types&)`.
pub fn encode_relation_group(group: &RelationGroup, registry: &Registry) -> Value {
    let other_object_type = match group.other_class {
        Some(class_id) => Value::String(registry.object_class(class_id).name.clone()),
        None => Value::Null,
    };
    json!({
        "other_object_type": other_object_type,
        "predicates": group
            .predicates
            .iter()
            .map(|p| encode_predicate(p, registry))
            .collect::<Vec<_>>(),
    })
}

pub fn decode_relation_group(json: &Value, registry: &Registry) -> Result<RelationGroup> {
    let other_class = match json.get("other_object_type") {
        Some(Value::Null) | None => None,
        Some(Value::String(name)) => Some(registry.object_class_by_name(name)?.id),
        Some(_) => {
            return Err(QoraError::decode(
                "other_object_type",
                "expected a string or null",
            ))
        }
    };
    let predicates = json
        .get("predicates")
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("predicates", "missing or not an array"))?
        .iter()
        .map(|p| decode_predicate(p, registry))
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(RelationGroup::new(other_class, predicates))
}

/// A condition encodes as a bare array of relation groups, ported from
/// `to_json(json&, const Condition&, const Types&)`.
pub fn encode_condition(condition: &Condition, registry: &Registry) -> Value {
    Value::Array(
        condition
            .groups
            .iter()
            .map(|g| encode_relation_group(g, registry))
            .collect(),
    )
}

pub fn decode_condition(json: &Value, registry: &Registry) -> Result<Condition> {
    let groups = json
        .as_array()
        .ok_or_else(|| QoraError::decode("condition", "expected an array of relation groups"))?
        .iter()
        .map(|g| decode_relation_group(g, registry))
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(Condition::new(groups))
}

fn attribute_value_to_vec(value: &AttributeValue) -> Vec<Scalar> {
    (0..value.width()).map(|i| value.get(i)).collect()
}

fn decode_attribute_value(json: Option<&Value>, expected_width: usize) -> Result<AttributeValue> {
    let array = json
        .and_then(Value::as_array)
        .ok_or_else(|| QoraError::decode("value", "missing or not an array"))?;
    if array.len() != expected_width {
        return Err(QoraError::decode(
            "value",
            format!("expected {expected_width} elements, found {}", array.len()),
        ));
    }
    let scalars: Vec<Scalar> = array
        .iter()
        .map(|v| {
            v.as_i64()
                .map(|v| v as Scalar)
                .ok_or_else(|| QoraError::decode("value[]", "expected an integer"))
        })
        .collect::<Result<_>>()?;
    Ok(AttributeValue::from_values(scalars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Registry, qora_state::ClassId, qora_state::AttributeId) {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);
        (registry, class, pos)
    }

    #[test]
    fn predicate_round_trips_by_name() {
        let (registry, _class, pos) = fixture();
        let predicate = Predicate::relative(pos, AttributeValue::from_values(vec![3]));
        let json = encode_predicate(&predicate, &registry);
        let decoded = decode_predicate(&json, &registry).unwrap();
        assert_eq!(decoded, predicate);
    }

    #[test]
    fn relation_group_round_trips_including_none_other_class() {
        let (registry, class, pos) = fixture();
        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let group = RelationGroup::new(None, predicates.clone());
        let json = encode_relation_group(&group, &registry);
        assert_eq!(json["other_object_type"], Value::Null);
        assert_eq!(decode_relation_group(&json, &registry).unwrap(), group);

        let relational = RelationGroup::new(Some(class), predicates);
        let json = encode_relation_group(&relational, &registry);
        assert_eq!(json["other_object_type"], "thing");
        assert_eq!(decode_relation_group(&json, &registry).unwrap(), relational);
    }

    #[test]
    fn condition_round_trips_multiple_groups() {
        let (registry, class, pos) = fixture();
        let mut predicates_a = BTreeSet::new();
        predicates_a.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let mut predicates_b = BTreeSet::new();
        predicates_b.insert(Predicate::relative(pos, AttributeValue::zero(1)));
        let condition = Condition::new(BTreeSet::from([
            RelationGroup::new(None, predicates_a),
            RelationGroup::new(Some(class), predicates_b),
        ]));

        let json = encode_condition(&condition, &registry);
        assert_eq!(decode_condition(&json, &registry).unwrap(), condition);
    }
}
