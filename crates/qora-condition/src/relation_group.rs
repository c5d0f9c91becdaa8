use crate::{ObjectsByClass, Predicate};
use qora_state::{ClassId, Object};
use std::collections::BTreeSet;

/// A conjunction of predicates evaluated over a single `(target, other)`
/// pair, where `other`'s class is fixed (or absent, for target-only
/// groups) (spec.md §4.C7). `predicates` is a `BTreeSet` so two groups
/// built from the same predicates always compare equal and iterate in the
/// same order, which is what makes the bit-packing below deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct RelationGroup {
    pub other_class: Option<ClassId>,
    pub predicates: BTreeSet<Predicate>,
}

impl RelationGroup {
    pub fn new(other_class: Option<ClassId>, predicates: BTreeSet<Predicate>) -> Self {
        Self {
            other_class,
            predicates,
        }
    }

    /// `m`, the number of predicates.
    pub fn size(&self) -> usize {
        self.predicates.len()
    }

    /// `2^m`: the number of distinct outcomes of one `(target, other)`
    /// evaluation.
    pub fn state_size(&self) -> usize {
        1usize << self.predicates.len()
    }

    /// `2^(2^m)`: the number of distinct bitsets of single-pair outcomes,
    /// i.e. the size of this group's contribution to a condition's input
    /// space.
    pub fn complete_state_size(&self) -> usize {
        1usize << self.state_size()
    }

    /// Pack this group's predicates' truth values against `target` alone
    /// into a dense integer: predicate `i` (in sorted order) contributes
    /// bit `i`.
    pub fn evaluate_single_unary(&self, target: &Object) -> usize {
        let mut value = 0usize;
        for (place, predicate) in self.predicates.iter().enumerate() {
            value += (predicate.evaluate_unary(target) as usize) << place;
        }
        value
    }

    /// As above, against a `(target, other)` pair.
    pub fn evaluate_single_pair(&self, target: &Object, other: &Object) -> usize {
        let mut value = 0usize;
        for (place, predicate) in self.predicates.iter().enumerate() {
            value += (predicate.evaluate_pair(target, other) as usize) << place;
        }
        value
    }

    /// Evaluate over every candidate `other` object of this group's class
    /// (or, if the group has no other class, over `target` alone) and
    /// union the results into a single bitset of size `complete_state_size`:
    /// bit `v` is set iff some pairing produced single-pair outcome `v`.
    pub fn evaluate_all(&self, target: &Object, objects_by_class: &ObjectsByClass<'_>) -> usize {
        match self.other_class {
            None => 1usize << self.evaluate_single_unary(target),
            Some(class_id) => {
                let mut result = 0usize;
                if let Some(others) = objects_by_class.get(&class_id) {
                    for other in others {
                        result |= 1usize << self.evaluate_single_pair(target, other);
                    }
                }
                result
            }
        }
    }

    /// A human-readable rendering, e.g. `[other y: x.pos = (1); ...]`.
    pub fn describe(&self, registry: &qora_state::Registry) -> String {
        let header = match self.other_class {
            Some(id) => format!("[{} y: ", registry.object_class(id).name),
            None => "[".to_string(),
        };
        let body = self
            .predicates
            .iter()
            .map(|p| p.describe(registry))
            .collect::<Vec<_>>()
            .join("; ");
        format!("{header}{body}]")
    }

    /// Render which single-pair outcomes (`T`/`F` per predicate, in
    /// order) are active in a packed `evaluate_all` result.
    pub fn describe_case(&self, value: usize) -> String {
        let n = self.predicates.len();
        let m = 1usize << n;
        let mut cases = Vec::new();
        for i in 0..m {
            if value & (1usize << i) != 0 {
                let bits: String = (0..n).map(|j| if i & (1usize << j) != 0 { 'T' } else { 'F' }).collect();
                cases.push(bits);
            }
        }
        format!("%{{{}}}", cases.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_state::{AttributeValue, Id, Registry};

    fn fixture() -> (Registry, ClassId, qora_state::AttributeId) {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);
        (registry, class, pos)
    }

    #[test]
    fn state_sizes_follow_predicate_count() {
        let (_registry, _class, pos) = fixture();
        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let group = RelationGroup::new(None, predicates);
        assert_eq!(group.size(), 1);
        assert_eq!(group.state_size(), 2);
        assert_eq!(group.complete_state_size(), 4);
    }

    #[test]
    fn evaluate_all_without_other_class_is_singleton_bit() {
        let (registry, class, pos) = fixture();
        let target = registry.create_object(class, Id::new(0));
        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let group = RelationGroup::new(None, predicates);

        let objects_by_class = ObjectsByClass::new();
        let value = group.evaluate_all(&target, &objects_by_class);
        // single predicate is true (pos == 0), so bit 1 (2^1) is set.
        assert_eq!(value, 0b10);
    }

    #[test]
    fn evaluate_all_with_other_class_unions_across_candidates() {
        let (registry, class, pos) = fixture();
        let target = registry.create_object(class, Id::new(0));
        let mut other_a = registry.create_object(class, Id::new(1));
        other_a.set_attribute(pos, AttributeValue::from_values(vec![0]));
        let mut other_b = registry.create_object(class, Id::new(2));
        other_b.set_attribute(pos, AttributeValue::from_values(vec![1]));

        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::relative(pos, AttributeValue::zero(1)));
        let group = RelationGroup::new(Some(class), predicates);

        let mut objects_by_class = ObjectsByClass::new();
        objects_by_class.insert(class, vec![&other_a, &other_b]);

        let value = group.evaluate_all(&target, &objects_by_class);
        // other_a matches (delta 0 -> true -> outcome 1), other_b doesn't (delta 1 -> false -> outcome 0).
        assert_eq!(value, (1usize << 0) | (1usize << 1));
    }
}
