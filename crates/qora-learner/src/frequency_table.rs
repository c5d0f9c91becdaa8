use qora_core::{Alpha, ConfidenceInterval};
use qora_core::{wilson_interval, Probability};
use qora_distribution::ProbabilityDistribution;
use std::collections::{BTreeMap, BTreeSet};

/// A conditional frequency table over `m` nominal input buckets and a
/// dynamically growing `k` outcome buckets, with a Wilson-interval success
/// score (spec.md §4.C6, grounded in
/// `original_source/QORA/FrequencyTable.h`/`.cpp`).
///
/// `m` is nominal cardinality only — only observed `(input, outcome)` cells
/// are ever stored, so a table never materializes its full cross product.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FrequencyTable {
    m: usize,
    k: usize,
    count_total: u64,
    count_by_input: BTreeMap<usize, u64>,
    count_by_output: BTreeMap<usize, u64>,
    #[serde(with = "joint_counts")]
    count_joint: BTreeMap<(usize, usize), u64>,
    prediction_score: Probability,
    #[serde(skip)]
    success_interval: ConfidenceInterval,
}

impl FrequencyTable {
    /// `m` = nominal number of input buckets. `k` starts at `2`, the
    /// smallest interesting outcome count, and grows as new outcomes are
    /// observed.
    pub fn new(m: usize) -> Self {
        Self {
            m,
            k: 2,
            ..Default::default()
        }
    }

    /// Clear all counts and derived statistics, but keep `m` and `k` — the
    /// outcome space never shrinks.
    pub fn reset(&mut self) {
        self.count_total = 0;
        self.count_by_input.clear();
        self.count_by_output.clear();
        self.count_joint.clear();
        self.prediction_score = 0.0;
        self.success_interval = ConfidenceInterval::default();
    }

    pub fn input_states(&self) -> usize {
        self.m
    }

    pub fn observed_input_states(&self) -> BTreeSet<usize> {
        self.count_by_input.keys().copied().collect()
    }

    pub fn output_states(&self) -> usize {
        self.k
    }

    pub fn count_total(&self) -> u64 {
        self.count_total
    }

    pub fn count_input(&self, state_in: usize) -> u64 {
        self.count_by_input.get(&state_in).copied().unwrap_or(0)
    }

    pub fn count_output(&self, state_out: usize) -> u64 {
        self.count_by_output.get(&state_out).copied().unwrap_or(0)
    }

    pub fn count(&self, state_in: usize, state_out: usize) -> u64 {
        self.count_joint.get(&(state_in, state_out)).copied().unwrap_or(0)
    }

    pub fn frequency_input(&self, state_in: usize) -> Probability {
        self.count_input(state_in) as Probability / self.count_total as Probability
    }

    pub fn frequency_output(&self, state_out: usize) -> Probability {
        self.count_output(state_out) as Probability / self.count_total as Probability
    }

    pub fn frequency(&self, state_in: usize, state_out: usize) -> Probability {
        self.count(state_in, state_out) as Probability / self.count_total as Probability
    }

    /// `P(out | in) = P(in, out) / P(in)`. `NaN` (via `0.0 / 0.0`) when
    /// `in` has never been observed — mirrors the reference
    /// implementation's untouched floating-point division, and every
    /// caller already treats a non-positive result as "no information".
    pub fn frequency_conditional(&self, state_in: usize, state_out: usize) -> Probability {
        self.frequency(state_in, state_out) / self.frequency_input(state_in)
    }

    /// `P(out | in)` for every outcome with positive conditional
    /// probability. Empty if `in` was never observed.
    pub fn conditional_distribution(&self, state_in: usize) -> ProbabilityDistribution<usize> {
        let mut dist = ProbabilityDistribution::new();
        for state_out in 0..self.k {
            let p = self.frequency_conditional(state_in, state_out);
            if p > 0.0 {
                dist.set(state_out, p);
            }
        }
        dist
    }

    /// A fresh, nominal-cardinality-`1` table holding only the row of
    /// `self` at `in`, reindexed to input bucket `0`.
    pub fn slice(&self, state_in: usize) -> FrequencyTable {
        let mut sliced = FrequencyTable::new(1);
        sliced.k = self.k;
        if let Some(&total) = self.count_by_input.get(&state_in) {
            sliced.count_total = total;
            sliced.count_by_input.insert(0, total);
            for state_out in 0..self.k {
                if let Some(&count) = self.count_joint.get(&(state_in, state_out)) {
                    sliced.count_joint.insert((0, state_out), count);
                    sliced.count_by_output.insert(state_out, count);
                }
            }
        }
        sliced
    }

    pub fn prediction_score(&self) -> Probability {
        self.prediction_score
    }

    pub fn success_interval(&self) -> ConfidenceInterval {
        self.success_interval.clone()
    }

    /// Record one `(state_in, state_out)` observation, growing `k` if
    /// `state_out` names a not-yet-seen outcome.
    pub fn observe(&mut self, state_in: usize, state_out: usize) {
        if state_out >= self.k {
            self.k = state_out + 1;
        }
        self.count_total += 1;
        *self.count_by_input.entry(state_in).or_insert(0) += 1;
        *self.count_by_output.entry(state_out).or_insert(0) += 1;
        *self.count_joint.entry((state_in, state_out)).or_insert(0) += 1;
    }

    /// Recompute `prediction_score` (the paper's `S` score) and
    /// `success_interval` from the current counts. A no-op while
    /// `count_total == 0`.
    pub fn recalculate(&mut self, alpha: Alpha) {
        if self.count_total == 0 {
            return;
        }
        let total = self.count_total as Probability;
        let mut score = 0.0;
        for (&state_in, &count_in) in &self.count_by_input {
            let freq_in = count_in as Probability / total;
            if freq_in > 0.0 {
                let mut term = 0.0;
                for state_out in 0..self.k {
                    if let Some(&count_joint) = self.count_joint.get(&(state_in, state_out)) {
                        let freq_joint = count_joint as Probability / total;
                        term += freq_joint * freq_joint;
                    }
                }
                score += term / freq_in;
            }
        }
        self.prediction_score = score;
        self.success_interval = wilson_interval(self.count_total, score * total, alpha);
    }

    /// Argmax over `out` of `P(out | in)`, ties broken toward the smaller
    /// `out`. Returns `0` if `in` was never observed (its conditional
    /// probabilities are all `NaN`, which never satisfies the strict `>`
    /// comparison, so the initial guess of `0` survives).
    pub fn predict(&self, state_in: usize) -> usize {
        let mut best = 0;
        let mut best_prob = -1.0;
        for state_out in 0..self.k {
            let p = self.frequency_conditional(state_in, state_out);
            if p > best_prob {
                best = state_out;
                best_prob = p;
            }
        }
        best
    }

    /// The probability mass on [`predict`](Self::predict)'s winning
    /// outcome. `-1.0`'s initial value never survives a real call since
    /// `k >= 2`, so a never-observed `in` naturally reports `0.0`... unless
    /// every conditional is `NaN`, in which case this returns `-1.0`
    /// (mirroring the reference implementation's identical behavior).
    pub fn confidence(&self, state_in: usize) -> Probability {
        let mut best_prob = -1.0;
        for state_out in 0..self.k {
            let p = self.frequency_conditional(state_in, state_out);
            if p > best_prob {
                best_prob = p;
            }
        }
        best_prob
    }

    pub fn describe(&self) -> String {
        format!(
            "Counter({} x {}), success: [{:.4}, {:.4}]",
            self.m, self.k, self.success_interval.lower, self.success_interval.upper
        )
    }
}

impl PartialEq for FrequencyTable {
    fn eq(&self, other: &Self) -> bool {
        self.success_interval == other.success_interval
    }
}

impl PartialOrd for FrequencyTable {
    /// Tables are only partially ordered — by strict separation of their
    /// success intervals, exactly like `ConfidenceInterval` itself. Two
    /// tables with overlapping intervals are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.success_interval.partial_cmp(&other.success_interval)
    }
}

mod joint_counts {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<(usize, usize), u64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let stringly: BTreeMap<String, u64> = map
            .iter()
            .map(|(&(i, o), &count)| (format!("{i},{o}"), count))
            .collect();
        stringly.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<(usize, usize), u64>, D::Error> {
        let stringly = BTreeMap::<String, u64>::deserialize(deserializer)?;
        stringly
            .into_iter()
            .map(|(key, count)| {
                let (i, o) = key
                    .split_once(',')
                    .ok_or_else(|| serde::de::Error::custom(format!("malformed joint key `{key}`")))?;
                let i: usize = i.parse().map_err(serde::de::Error::custom)?;
                let o: usize = o.parse().map_err(serde::de::Error::custom)?;
                Ok(((i, o), count))
            })
            .collect()
    }
}
