use qora_core::Probability;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A sparse weighted mapping from values of `T` to weight (spec.md §4.C4,
/// grounded in `original_source/QORA/ProbabilityDistribution.h`). Weights
/// need not sum to one; [`normalize`](Self::normalize) rescales them when
/// that is wanted. An entry whose weight reaches exactly zero is dropped —
/// there is no such thing as a stored zero-weight outcome.
///
/// `T` must be `Ord` so that the distribution itself has a deterministic
/// iteration order (sampling and `max` tie-breaking both rely on it) and so
/// that a `ProbabilityDistribution<T>` can in turn be used as `T` for an
/// outer distribution (spec.md §9's "distribution over distributions"
/// aggregation).
#[derive(Debug, Clone)]
pub struct ProbabilityDistribution<T: Ord + Clone> {
    weights: BTreeMap<T, Probability>,
}

impl<T: Ord + Clone> Default for ProbabilityDistribution<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> ProbabilityDistribution<T> {
    pub fn new() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// A distribution with a single outcome at weight `1.0`.
    pub fn singleton(value: T) -> Self {
        let mut dist = Self::new();
        dist.set(value, 1.0);
        dist
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn get(&self, value: &T) -> Probability {
        self.weights.get(value).copied().unwrap_or(0.0)
    }

    /// Overwrite `value`'s weight, removing the entry if the new weight is
    /// exactly zero.
    pub fn set(&mut self, value: T, weight: Probability) {
        if weight == 0.0 {
            self.weights.remove(&value);
        } else {
            self.weights.insert(value, weight);
        }
    }

    /// Add `weight` to `value`'s existing weight (inserting it at `weight`
    /// if absent), removing the entry if the result is exactly zero.
    pub fn add(&mut self, value: T, weight: Probability) {
        let total = self.get(&value) + weight;
        self.set(value, total);
    }

    pub fn total_weight(&self) -> Probability {
        self.weights.values().sum()
    }

    /// Rescale every weight so they sum to `1.0`. A no-op on the empty
    /// distribution or one whose total weight is already zero.
    pub fn normalize(&mut self) {
        let total = self.total_weight();
        if total == 0.0 {
            return;
        }
        for weight in self.weights.values_mut() {
            *weight /= total;
        }
    }

    pub fn support(&self) -> impl Iterator<Item = (&T, Probability)> {
        self.weights.iter().map(|(v, &w)| (v, w))
    }

    /// The outcome with the greatest weight. Ties are broken by `T`'s own
    /// order, preferring the greatest `T` — deterministic given a
    /// deterministic `T`. Panics on an empty distribution.
    pub fn max(&self) -> &T {
        self.weights
            .iter()
            .max_by(|(t1, w1), (t2, w2)| {
                w1.partial_cmp(w2)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| t1.cmp(t2))
            })
            .map(|(t, _)| t)
            .expect("sampling an empty distribution")
    }

    /// Draw uniformly from `[0, total_weight)` and return the first entry
    /// (in `T`'s order) whose cumulative weight exceeds the draw. Panics on
    /// an empty, or all-zero-weight, distribution.
    pub fn sample(&self, rng: &mut impl Rng) -> &T {
        let total = self.total_weight();
        assert!(total > 0.0, "sampling an empty distribution");
        let draw: Probability = rng.random_range(0.0..total);
        let mut cumulative = 0.0;
        for (value, weight) in &self.weights {
            cumulative += weight;
            if draw < cumulative {
                return value;
            }
        }
        // Floating point rounding can leave `draw` fractionally short of
        // `total`; fall back to the last entry in order.
        self.weights.keys().next_back().expect("checked non-empty above")
    }

    /// Sum several distributions entrywise into a fresh, un-normalized
    /// distribution (the reference implementation's static
    /// `ProbabilityDistribution::add` aggregator).
    pub fn aggregate<'a, I>(distributions: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
        T: 'a,
    {
        let mut out = Self::new();
        for dist in distributions {
            for (value, weight) in dist.support() {
                out.add(value.clone(), weight);
            }
        }
        out
    }

    /// [`aggregate`](Self::aggregate) followed by [`normalize`](Self::normalize)
    /// (spec.md §4.C4's first aggregation helper, "fuse a set").
    pub fn fuse<'a, I>(distributions: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
        T: 'a,
    {
        let mut out = Self::aggregate(distributions);
        out.normalize();
        out
    }

    /// Collapse a distribution *of* distributions into one: each outer
    /// entry's weight scales its inner distribution's weights before
    /// accumulating, then the combined result is normalized (spec.md
    /// §4.C4's second aggregation helper, "fuse a distribution of
    /// distributions"). `Self` is `Ord + Clone` whenever `T` is, so it can
    /// itself serve as the outer distribution's value type.
    pub fn fuse_nested(outer: &ProbabilityDistribution<Self>) -> Self {
        let mut out = Self::new();
        for (inner, outer_weight) in outer.support() {
            for (value, inner_weight) in inner.support() {
                out.add(value.clone(), outer_weight * inner_weight);
            }
        }
        out.normalize();
        out
    }
}

impl<T: Ord + Clone> PartialEq for ProbabilityDistribution<T> {
    fn eq(&self, other: &Self) -> bool {
        self.weights.len() == other.weights.len()
            && self
                .weights
                .iter()
                .zip(other.weights.iter())
                .all(|((k1, w1), (k2, w2))| k1 == k2 && w1 == w2)
    }
}
impl<T: Ord + Clone> Eq for ProbabilityDistribution<T> {}

impl<T: Ord + Clone> PartialOrd for ProbabilityDistribution<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: Ord + Clone> Ord for ProbabilityDistribution<T> {
    /// Lexicographic comparison over `(value, weight)` pairs in `T`'s
    /// order, then by entry count. Weight is assumed finite and
    /// non-`NaN` throughout the workspace, so `partial_cmp` never falls
    /// through to `Equal` in practice.
    fn cmp(&self, other: &Self) -> Ordering {
        for ((t1, w1), (t2, w2)) in self.weights.iter().zip(other.weights.iter()) {
            match t1.cmp(t2) {
                Ordering::Equal => {}
                order => return order,
            }
            match w1.partial_cmp(w2).unwrap_or(Ordering::Equal) {
                Ordering::Equal => {}
                order => return order,
            }
        }
        self.weights.len().cmp(&other.weights.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn add_and_set_remove_zero_weight_entries() {
        let mut dist = ProbabilityDistribution::new();
        dist.add("a", 1.0);
        dist.add("a", -1.0);
        assert!(dist.is_empty());
    }

    #[test]
    fn normalize_rescales_to_unit_total() {
        let mut dist = ProbabilityDistribution::new();
        dist.add("a", 1.0);
        dist.add("b", 3.0);
        dist.normalize();
        assert!((dist.total_weight() - 1.0).abs() < 1e-12);
        assert!((dist.get(&"a") - 0.25).abs() < 1e-12);
    }

    #[test]
    fn max_breaks_ties_by_greatest_value() {
        let mut dist = ProbabilityDistribution::new();
        dist.set(1, 2.0);
        dist.set(2, 2.0);
        assert_eq!(*dist.max(), 2);
    }

    #[test]
    fn sample_is_deterministic_given_a_seed() {
        let mut dist = ProbabilityDistribution::new();
        dist.set(1, 1.0);
        dist.set(2, 1.0);
        dist.set(3, 1.0);
        let mut rng_a = SmallRng::seed_from_u64(42);
        let mut rng_b = SmallRng::seed_from_u64(42);
        assert_eq!(dist.sample(&mut rng_a), dist.sample(&mut rng_b));
    }

    #[test]
    fn aggregate_sums_entrywise() {
        let mut a = ProbabilityDistribution::new();
        a.set("x", 1.0);
        let mut b = ProbabilityDistribution::new();
        b.set("x", 2.0);
        b.set("y", 5.0);
        let total = ProbabilityDistribution::aggregate([&a, &b]);
        assert_eq!(total.get(&"x"), 3.0);
        assert_eq!(total.get(&"y"), 5.0);
    }

    #[test]
    fn fuse_aggregates_and_normalizes() {
        let mut a = ProbabilityDistribution::new();
        a.set("x", 1.0);
        let mut b = ProbabilityDistribution::new();
        b.set("x", 1.0);
        b.set("y", 2.0);
        let fused = ProbabilityDistribution::fuse([&a, &b]);
        assert!((fused.total_weight() - 1.0).abs() < 1e-12);
        assert!((fused.get(&"x") - 0.5).abs() < 1e-12);
        assert!((fused.get(&"y") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fuse_nested_scales_by_outer_weight_then_normalizes() {
        let mut inner_a = ProbabilityDistribution::new();
        inner_a.set("x", 1.0);
        let mut inner_b = ProbabilityDistribution::new();
        inner_b.set("x", 1.0);
        inner_b.set("y", 1.0);

        let mut outer = ProbabilityDistribution::new();
        outer.set(inner_a, 3.0);
        outer.set(inner_b, 1.0);

        let fused = ProbabilityDistribution::fuse_nested(&outer);
        // x: 3*1 + 1*1 = 4, y: 1*1 = 1, total 5 -> normalized 0.8 / 0.2
        assert!((fused.get(&"x") - 0.8).abs() < 1e-12);
        assert!((fused.get(&"y") - 0.2).abs() < 1e-12);
    }

    #[test]
    fn distributions_are_totally_ordered() {
        let mut a = ProbabilityDistribution::new();
        a.set(1, 1.0);
        let mut b = ProbabilityDistribution::new();
        b.set(1, 2.0);
        assert!(a < b);
    }
}
