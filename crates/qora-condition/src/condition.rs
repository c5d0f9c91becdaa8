use crate::{ObjectsByClass, RelationGroup};
use qora_state::{ClassId, Object};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Add;

/// A set of relation groups, at most one of which has no other class
/// (spec.md §4.C7). A condition packs every group's bitset into a single
/// integer "input bucket" by positional-number-system encoding, which is
/// what a `FrequencyTable` keys its counts on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    pub groups: BTreeSet<RelationGroup>,
}

impl Condition {
    pub fn new(groups: BTreeSet<RelationGroup>) -> Self {
        Self { groups }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The product of every group's `complete_state_size` — the number of
    /// distinct input buckets this condition can produce.
    pub fn state_size(&self) -> usize {
        self.groups.iter().map(RelationGroup::complete_state_size).product::<usize>().max(1)
    }

    /// Pack every group's `evaluate_all` outcome into one integer bucket
    /// via mixed-radix encoding: `sum(group_i.evaluate_all() * multiplier_i)`
    /// where `multiplier_i` is the product of the complete-state-sizes of
    /// every group before `i` (in sorted order).
    pub fn evaluate(&self, target: &Object, objects_by_class: &ObjectsByClass<'_>) -> usize {
        let mut value = 0usize;
        let mut multiplier = 1usize;
        for group in &self.groups {
            value += group.evaluate_all(target, objects_by_class) * multiplier;
            multiplier *= group.complete_state_size();
        }
        value
    }

    /// A human-readable rendering, e.g. `player x: [pos y: ...], [...]`.
    pub fn describe(&self, registry: &qora_state::Registry, target_class: ClassId) -> String {
        let header = format!("{} x: ", registry.object_class(target_class).name);
        let body = self
            .groups
            .iter()
            .map(|g| g.describe(registry))
            .collect::<Vec<_>>()
            .join(", ");
        header + &body
    }

    /// Break a packed `input_case` back into each group's own bucket and
    /// render it via [`RelationGroup::describe_case`].
    pub fn describe_case(&self, mut input_case: usize) -> String {
        let mut per_group = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let multiplier = group.complete_state_size();
            per_group.push(input_case % multiplier);
            input_case /= multiplier;
        }
        self.groups
            .iter()
            .zip(per_group)
            .map(|(g, v)| g.describe_case(v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Add for Condition {
    type Output = Condition;

    /// Union two conditions: groups sharing the same `other_class` have
    /// their predicate sets merged; groups unique to one side pass
    /// through unchanged.
    fn add(self, other: Condition) -> Condition {
        let mut merged: BTreeMap<Option<ClassId>, RelationGroup> = BTreeMap::new();
        for group in self.groups {
            merged.insert(group.other_class, group);
        }
        for group in other.groups {
            merged
                .entry(group.other_class)
                .and_modify(|existing| {
                    existing.predicates.extend(group.predicates.iter().cloned());
                })
                .or_insert(group);
        }
        Condition::new(merged.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Predicate;
    use qora_state::{AttributeValue, Id, Registry};

    fn fixture() -> (Registry, ClassId, qora_state::AttributeId) {
        let mut registry = Registry::new();
        let pos = registry.add_attribute_type("pos", 1);
        let class = registry.add_object_class("thing");
        registry.add_attribute_to_class(class, pos);
        (registry, class, pos)
    }

    #[test]
    fn state_size_is_product_of_group_sizes() {
        let (_registry, _class, pos) = fixture();
        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let group = RelationGroup::new(None, predicates);
        let condition = Condition::new(BTreeSet::from([group]));
        assert_eq!(condition.state_size(), 4);
    }

    #[test]
    fn empty_condition_has_state_size_one() {
        assert_eq!(Condition::empty().state_size(), 1);
        let objects_by_class = ObjectsByClass::new();
        let mut registry = Registry::new();
        let class = registry.add_object_class("thing");
        let target = registry.create_object(class, Id::new(0));
        assert_eq!(Condition::empty().evaluate(&target, &objects_by_class), 0);
    }

    #[test]
    fn union_merges_groups_sharing_an_other_class() {
        let (_registry, class, pos) = fixture();
        let mut predicates_a = BTreeSet::new();
        predicates_a.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let a = Condition::new(BTreeSet::from([RelationGroup::new(Some(class), predicates_a)]));

        let mut predicates_b = BTreeSet::new();
        predicates_b.insert(Predicate::unary(pos, false, AttributeValue::zero(1)));
        let b = Condition::new(BTreeSet::from([RelationGroup::new(Some(class), predicates_b)]));

        let union = a + b;
        assert_eq!(union.groups.len(), 1);
        assert_eq!(union.groups.iter().next().unwrap().predicates.len(), 2);
    }

    #[test]
    fn union_keeps_groups_unique_to_either_side() {
        let (_registry, class, pos) = fixture();
        let mut predicates = BTreeSet::new();
        predicates.insert(Predicate::unary(pos, true, AttributeValue::zero(1)));
        let a = Condition::new(BTreeSet::from([RelationGroup::new(None, predicates.clone())]));
        let b = Condition::new(BTreeSet::from([RelationGroup::new(Some(class), predicates)]));

        let union = a + b;
        assert_eq!(union.groups.len(), 2);
    }
}
