use crate::ProbabilityDistribution;
use qora_core::Probability;
use qora_state::{AttributeId, ClassId, Object, ObjectId, State};
use rand::Rng;
use std::collections::BTreeMap;

/// A per-object-id distribution over candidate `Object`s (spec.md §4.C5,
/// grounded in `original_source/QORA/Environment.h`'s `StateDistribution`).
/// Used by the hypothesis-search engine to represent a prediction's
/// uncertainty before it is collapsed into a concrete `State`.
#[derive(Debug, Clone, Default)]
pub struct StateDistribution {
    objects: BTreeMap<ObjectId, ProbabilityDistribution<Object>>,
}

impl StateDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// The degenerate distribution: every object id maps to a
    /// weight-`1.0` singleton over its concrete value in `state`.
    pub fn from_state(state: &State) -> Self {
        let mut dist = Self::new();
        for object in state.objects() {
            dist.objects.insert(
                object.object_id,
                ProbabilityDistribution::singleton(object.clone()),
            );
        }
        dist
    }

    /// Introduce `object_id` with a single, attribute-less candidate object
    /// of `class_id` at weight `1.0`. Subsequent
    /// [`add_object_attribute`](Self::add_object_attribute) calls build up
    /// its attributes one at a time via cartesian product.
    pub fn add_empty_object(&mut self, class_id: ClassId, object_id: ObjectId) {
        self.objects.insert(
            object_id,
            ProbabilityDistribution::singleton(Object::new(class_id, object_id)),
        );
    }

    /// Replace `object_id`'s candidate-value distribution wholesale.
    /// Every candidate object must already carry `object_id`.
    pub fn add_object(&mut self, object_id: ObjectId, candidates: ProbabilityDistribution<Object>) {
        debug_assert!(
            candidates
                .support()
                .all(|(object, _)| object.object_id == object_id),
            "candidate objects must all carry the distribution's own object id"
        );
        self.objects.insert(object_id, candidates);
    }

    /// Fold a distribution over candidate values for one attribute into
    /// `object_id`'s existing object distribution, producing the cartesian
    /// product of current draws with candidate values and multiplying
    /// weights (spec.md §4.C5). `object_id` must already have an entry —
    /// typically seeded by [`add_empty_object`](Self::add_empty_object) or
    /// [`add_object`](Self::add_object).
    pub fn add_object_attribute(
        &mut self,
        object_id: ObjectId,
        attribute_id: AttributeId,
        values: &ProbabilityDistribution<qora_state::AttributeValue>,
    ) {
        let current = self
            .objects
            .get(&object_id)
            .expect("add_object_attribute requires an existing object entry");
        let mut next = ProbabilityDistribution::new();
        for (object, object_weight) in current.support() {
            for (value, value_weight) in values.support() {
                let mut candidate = object.clone();
                candidate.insert_or_set_attribute(attribute_id, value.clone());

                next.add(candidate, object_weight * value_weight);
            }
        }
        self.objects.insert(object_id, next);
    }

    /// Convenience overload for a single certain attribute value.
    pub fn set_object_attribute_value(
        &mut self,
        object_id: ObjectId,
        attribute_id: AttributeId,
        value: qora_state::AttributeValue,
    ) {
        self.add_object_attribute(
            object_id,
            attribute_id,
            &ProbabilityDistribution::singleton(value),
        );
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn object_distribution(&self, object_id: ObjectId) -> Option<&ProbabilityDistribution<Object>> {
        self.objects.get(&object_id)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Draw one concrete object per id, independently, and assemble a
    /// `State`. Panics if any per-object distribution is empty.
    pub fn sample(&self, rng: &mut impl Rng) -> State {
        let mut state = State::new();
        for dist in self.objects.values() {
            state.insert(dist.sample(rng).clone());
        }
        state
    }

    /// Earth-mover-style error between two state distributions: the sum,
    /// over object ids present in both, of the minimum-cost transport
    /// between their candidate distributions. Object ids present in only
    /// one side contribute nothing — they cannot be compared without a
    /// shared reference.
    pub fn error(&self, other: &StateDistribution) -> Probability {
        self.objects
            .iter()
            .filter_map(|(id, dist)| other.objects.get(id).map(|od| (dist, od)))
            .map(|(a, b)| earth_movers_distance(a, b))
            .sum()
    }

    /// Error between this distribution and a single concrete state — the
    /// degenerate case of [`error`](Self::error) against
    /// [`StateDistribution::from_state`], which reduces to the expected
    /// `L1` distance to each object's actual value.
    pub fn error_against_state(&self, state: &State) -> Probability {
        self.error(&StateDistribution::from_state(state))
    }
}

/// Repeatedly match the closest still-unmatched pair of candidate objects
/// across the two distributions, transferring `min(w1, w2)` weight and
/// accumulating `min(w1, w2) * distance`, until one side is exhausted.
fn earth_movers_distance(
    a: &ProbabilityDistribution<Object>,
    b: &ProbabilityDistribution<Object>,
) -> Probability {
    let mut left: Vec<(Object, Probability)> = a.support().map(|(o, w)| (o.clone(), w)).collect();
    let mut right: Vec<(Object, Probability)> = b.support().map(|(o, w)| (o.clone(), w)).collect();
    let mut total = 0.0;

    loop {
        let mut best: Option<(usize, usize, i64)> = None;
        for (i, (object_a, weight_a)) in left.iter().enumerate() {
            if *weight_a <= 0.0 {
                continue;
            }
            for (j, (object_b, weight_b)) in right.iter().enumerate() {
                if *weight_b <= 0.0 {
                    continue;
                }
                let distance = object_a.distance(object_b);
                if best.map_or(true, |(_, _, best_distance)| distance < best_distance) {
                    best = Some((i, j, distance));
                }
            }
        }
        let Some((i, j, distance)) = best else {
            break;
        };
        let transfer = left[i].1.min(right[j].1);
        left[i].1 -= transfer;
        right[j].1 -= transfer;
        total += transfer * (distance as Probability);
    }

    total
}
