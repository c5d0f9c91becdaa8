use qora_state::{AttributeId, AttributeValue, Object};
use std::cmp::Ordering;

/// A single unary or relational test over one attribute (spec.md §4.C7).
///
/// - `is_relative`: compares `other.attr - target.attr` against `value`;
///   requires an `other` object and is false when evaluated on the target
///   alone.
/// - otherwise, compares `target.attr` (if `is_target`) or `other.attr`
///   (if not) against `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Predicate {
    pub attribute_id: AttributeId,
    pub is_relative: bool,
    pub is_target: bool,
    pub value: AttributeValue,
}

impl Predicate {
    pub fn relative(attribute_id: AttributeId, value: AttributeValue) -> Self {
        Self {
            attribute_id,
            is_relative: true,
            is_target: true,
            value,
        }
    }

    pub fn unary(attribute_id: AttributeId, is_target: bool, value: AttributeValue) -> Self {
        Self {
            attribute_id,
            is_relative: false,
            is_target,
            value,
        }
    }

    /// Evaluate against the target alone. Always `false` for a relative
    /// predicate or one that reads from `other` — those need a pairing.
    pub fn evaluate_unary(&self, target: &Object) -> bool {
        !self.is_relative
            && self.is_target
            && target.attribute(self.attribute_id) == Some(&self.value)
    }

    /// Evaluate against a `(target, other)` pair.
    pub fn evaluate_pair(&self, target: &Object, other: &Object) -> bool {
        if self.is_relative {
            match (other.attribute(self.attribute_id), target.attribute(self.attribute_id)) {
                (Some(o), Some(t)) => (o.clone() - t.clone()) == self.value,
                _ => false,
            }
        } else if self.is_target {
            target.attribute(self.attribute_id) == Some(&self.value)
        } else {
            other.attribute(self.attribute_id) == Some(&self.value)
        }
    }

    /// A human-readable rendering, e.g. `x.pos = (1)` or `y.pos - x.pos =
    /// (1)`, using `'x'` for the target and `'y'` for the other object.
    pub fn describe(&self, registry: &qora_state::Registry) -> String {
        let name = &registry.attribute_type(self.attribute_id).name;
        if self.is_relative {
            format!("y.{name} - x.{name} = {}", self.value)
        } else if self.is_target {
            format!("x.{name} = {}", self.value)
        } else {
            format!("y.{name} = {}", self.value)
        }
    }
}

impl PartialOrd for Predicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Predicate {
    /// Attribute id first; then non-relative before relative; then
    /// target-reading before other-reading; then by value. Matches the
    /// reference implementation's `Predicate::operator<` bit for bit,
    /// including its target/other tie-break running opposite to `bool`'s
    /// natural order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.attribute_id
            .cmp(&other.attribute_id)
            .then_with(|| self.is_relative.cmp(&other.is_relative))
            .then_with(|| other.is_target.cmp(&self.is_target))
            .then_with(|| self.value.cmp(&other.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_state::Id;

    fn attr(n: u32) -> AttributeId {
        Id::new(n)
    }

    #[test]
    fn unary_predicate_ignores_other() {
        let mut registry = qora_state::Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);
        let target = registry.create_object(class, Id::new(0));

        let p = Predicate::unary(pos, true, AttributeValue::zero(1));
        assert!(p.evaluate_unary(&target));

        let relative = Predicate::relative(pos, AttributeValue::zero(1));
        assert!(!relative.evaluate_unary(&target));
    }

    #[test]
    fn relative_predicate_compares_the_pair() {
        let mut registry = qora_state::Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);
        let target = registry.create_object(class, Id::new(0));
        let mut other = registry.create_object(class, Id::new(1));
        other.set_attribute(pos, AttributeValue::from_values(vec![3]));

        let p = Predicate::relative(pos, AttributeValue::from_values(vec![3]));
        assert!(p.evaluate_pair(&target, &other));
    }

    #[test]
    fn ordering_prefers_non_relative_then_target_reading() {
        let non_relative = Predicate::unary(attr(0), true, AttributeValue::zero(1));
        let relative = Predicate::relative(attr(0), AttributeValue::zero(1));
        assert!(non_relative < relative);

        let target_reading = Predicate::unary(attr(0), true, AttributeValue::zero(1));
        let other_reading = Predicate::unary(attr(0), false, AttributeValue::zero(1));
        assert!(target_reading < other_reading);
    }
}
