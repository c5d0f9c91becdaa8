use crate::Candidate;
use qora_condition::{Condition, ObjectsByClass, Predicate, RelationGroup};
use qora_core::Alpha;
use qora_distribution::ProbabilityDistribution;
use qora_state::{AttributeValue, Object, Registry};
use std::collections::BTreeSet;

/// Per-`(class, attribute, action)` incremental hypothesis-search loop
/// (spec.md §4.C8, grounded in `original_source/QORA/LearnerQORA.h`'s
/// `StochasticEffectPredictor`). Grows a library of `Condition`s, each
/// backed by a `FrequencyTable`, and promotes the ones that beat an
/// unconditional baseline under a Wilson-interval confidence test.
#[derive(Debug, Clone)]
pub struct StochasticEffectPredictor {
    alpha: Alpha,
    observed: BTreeSet<Condition>,
    working: Vec<Candidate>,
    hypotheses: Vec<Candidate>,
    baseline: crate::FrequencyTable,
    effects: Vec<AttributeValue>,
}

impl StochasticEffectPredictor {
    /// `alpha` is the confidence level fed to every Wilson-interval
    /// computation; `0.01` (99% confidence) is the reference
    /// implementation's default.
    pub fn new(alpha: Alpha) -> Self {
        Self {
            alpha,
            observed: BTreeSet::new(),
            working: Vec::new(),
            hypotheses: Vec::new(),
            baseline: crate::FrequencyTable::new(1),
            effects: Vec::new(),
        }
    }

    pub fn alpha(&self) -> Alpha {
        self.alpha
    }

    pub fn observed(&self) -> &BTreeSet<Condition> {
        &self.observed
    }

    pub fn count_predicates_observed(&self) -> usize {
        self.observed.len()
    }

    pub fn count_predicates_tracked(&self) -> usize {
        self.working.len()
    }

    pub fn count_hypotheses_tracked(&self) -> usize {
        self.hypotheses.len()
    }

    pub fn effects(&self) -> &[AttributeValue] {
        &self.effects
    }

    pub fn hypotheses(&self) -> &[Candidate] {
        &self.hypotheses
    }

    pub fn working(&self) -> &[Candidate] {
        &self.working
    }

    pub fn baseline(&self) -> &crate::FrequencyTable {
        &self.baseline
    }

    /// Reassemble a predictor from its persisted parts
    /// ([`qora-persistence`](https://docs.rs/qora-persistence)'s decode
    /// path); no invariant beyond what the document itself already encoded
    /// is re-derived here.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        alpha: Alpha,
        observed: BTreeSet<Condition>,
        working: Vec<Candidate>,
        hypotheses: Vec<Candidate>,
        baseline: crate::FrequencyTable,
        effects: Vec<AttributeValue>,
    ) -> Self {
        Self { alpha, observed, working, hypotheses, baseline, effects }
    }

    /// Assign (or look up) this effect's dense index, extending the
    /// bijection in first-seen order.
    fn effect_index(&mut self, effect: &AttributeValue) -> usize {
        if let Some(index) = self.effects.iter().position(|e| e == effect) {
            return index;
        }
        self.effects.push(effect.clone());
        self.effects.len() - 1
    }

    /// If `condition` is new, register it in `observed` and seed a fresh
    /// `Candidate` into `working` (spec.md §4.C8 "Seed generation").
    fn test_add(&mut self, condition: Condition) {
        if self.observed.insert(condition.clone()) {
            self.working.push(Candidate::new(condition));
        }
    }

    fn test_add_pairs(&mut self, a: &Condition, b: &Condition) {
        self.test_add(a.clone() + b.clone());
    }

    /// The full observation protocol of spec.md §4.C8: assign an effect
    /// index, update the baseline and every hypothesis, bubble-sort and
    /// possibly promote the new best hypothesis, short-circuit when the
    /// top hypothesis already explains this observation with certainty,
    /// otherwise seed new singleton conditions and test every working
    /// candidate against the baseline.
    pub fn observe(
        &mut self,
        target: &Object,
        registry: &Registry,
        objects_by_class: &ObjectsByClass<'_>,
        effect: &AttributeValue,
    ) {
        let target_class = target.class_id;
        let effect_index = self.effect_index(effect);

        self.baseline.observe(0, effect_index);
        self.baseline.recalculate(self.alpha);

        for candidate in &mut self.hypotheses {
            candidate.observe(target, objects_by_class, effect_index);
            candidate.table.recalculate(self.alpha);
        }

        // Bubble-up pass, tail to head, exclusive of position 0: one pass,
        // not a full sort (spec.md §4.C8 step 4).
        let len = self.hypotheses.len();
        for i in (1..len.saturating_sub(1)).rev() {
            if self.hypotheses[i + 1] > self.hypotheses[i] {
                self.hypotheses.swap(i, i + 1);
            }
        }

        // Head swap: promote a strictly-better runner-up to the top slot.
        if self.hypotheses.len() > 1 && self.hypotheses[1] > self.hypotheses[0] {
            self.hypotheses.swap(0, 1);
            self.baseline.reset();
            for candidate in &mut self.working {
                candidate.table.reset();
            }
            let best = self.hypotheses[0].condition.clone();
            let others: Vec<Condition> = self.hypotheses[2..]
                .iter()
                .map(|c| c.condition.clone())
                .collect();
            #[cfg(feature = "diagnostics")]
            log::debug!("{target_class} promoted a new best hypothesis, reset baseline + working");
            for other in &others {
                self.test_add_pairs(&best, other);
            }
        }

        // Short-circuit: the top hypothesis already explains this
        // observation with certainty (spec.md §4.C8 step 6).
        if let Some(top) = self.hypotheses.first() {
            let state_in = top.condition.evaluate(target, objects_by_class);
            if top.table.confidence(state_in) == 1.0 && top.table.predict(state_in) == effect_index {
                return;
            }
        }

        // Seed generation (spec.md §4.C8 step 7).
        let class = registry.object_class(target_class);
        for &attribute_id in &class.attribute_ids {
            let value = target.attribute(attribute_id).expect("class attribute missing on object").clone();
            let predicate = Predicate::unary(attribute_id, true, value);
            let group = RelationGroup::new(None, BTreeSet::from([predicate]));
            self.test_add(Condition::new(BTreeSet::from([group])));
        }
        for (&other_class_id, others) in objects_by_class {
            let other_class = registry.object_class(other_class_id);
            for &other in others {
                if other.object_id == target.object_id {
                    continue;
                }
                for &attribute_id in &class.attribute_ids {
                    if other_class.attribute_ids.contains(&attribute_id) {
                        let delta = other.attribute(attribute_id).unwrap().clone()
                            - target.attribute(attribute_id).unwrap().clone();
                        let predicate = Predicate::relative(attribute_id, delta);
                        let group = RelationGroup::new(Some(other_class_id), BTreeSet::from([predicate]));
                        self.test_add(Condition::new(BTreeSet::from([group])));
                    }
                }
                for &attribute_id in &other_class.attribute_ids {
                    let value = other.attribute(attribute_id).unwrap().clone();
                    let predicate = Predicate::unary(attribute_id, false, value);
                    let group = RelationGroup::new(Some(other_class_id), BTreeSet::from([predicate]));
                    self.test_add(Condition::new(BTreeSet::from([group])));
                }
            }
        }

        // Evaluate every working candidate; promote the ones that beat
        // the baseline (spec.md §4.C8 step 8). Re-read after the
        // first-hypothesis reset below so a baseline that just collapsed
        // to `[0, 1]` suppresses further promotions within this same call,
        // matching `LearnerQORA.cpp`'s `baseline_score =
        // baseline.getSuccessInterval()` re-read in the same spot.
        let mut baseline_score = self.baseline.success_interval();
        let mut i = 0;
        while i < self.working.len() {
            self.working[i].observe(target, objects_by_class, effect_index);
            self.working[i].table.recalculate(self.alpha);

            if self.working[i].table.success_interval().strictly_above(&baseline_score) {
                let mut promoted = self.working.remove(i);
                promoted.table.reset();
                let promoted_condition = promoted.condition.clone();
                self.hypotheses.push(promoted);

                if self.hypotheses.len() == 1 {
                    self.baseline.reset();
                    baseline_score = self.baseline.success_interval();
                    for candidate in &mut self.working {
                        candidate.table.reset();
                    }
                } else {
                    let best = self.hypotheses[0].condition.clone();
                    self.test_add_pairs(&best, &promoted_condition);
                }
            } else {
                i += 1;
            }
        }
    }

    /// If `hypotheses` is empty, the unconditional baseline distribution;
    /// otherwise the top hypothesis's conditional distribution at the
    /// current evaluation. Falls back to a degenerate distribution on
    /// index `0` when that row was just reset (spec.md §4.C8 "Prediction").
    pub fn predict(
        &self,
        target: &Object,
        objects_by_class: &ObjectsByClass<'_>,
    ) -> ProbabilityDistribution<AttributeValue> {
        let mut prediction = match self.hypotheses.first() {
            None => self.baseline.conditional_distribution(0),
            Some(hypothesis) => {
                let state_in = hypothesis.condition.evaluate(target, objects_by_class);
                hypothesis.table.conditional_distribution(state_in)
            }
        };
        if prediction.is_empty() {
            prediction.set(0, 1.0);
        }

        let mut predicted_effects = ProbabilityDistribution::new();
        for (index, weight) in prediction.support() {
            predicted_effects.set(self.effects[*index].clone(), weight);
        }
        predicted_effects
    }

    /// Human-readable dump matching the reference implementation's
    /// `StochasticEffectPredictor::print`: the effect enumeration, the top
    /// three hypotheses, and the baseline distribution.
    pub fn dump(&self, registry: &Registry, target_class: qora_state::ClassId) -> String {
        let mut out = String::from("   Effects:\n");
        for (index, effect) in self.effects.iter().enumerate() {
            out.push_str(&format!("    [{index}] {effect}\n"));
        }

        if self.hypotheses.is_empty() {
            out.push_str("   Hypotheses: none\n");
        } else {
            out.push_str(&format!("   Hypotheses: {}\n", self.hypotheses.len()));
            for (index, candidate) in self.hypotheses.iter().take(3).enumerate() {
                out.push_str(&format!("    [{index}]\n"));
                out.push_str(&candidate.describe(registry, target_class, &self.effects));
            }
        }

        out.push_str(&format!("   Observed: {}\n", self.observed.len()));
        out.push_str(&format!("   Working set: {}\n", self.working.len()));
        out.push_str(&format!("   Baseline:\n    {}\n     ", self.baseline.describe()));
        let mut first = true;
        for (index, effect) in self.effects.iter().enumerate() {
            let p = self.baseline.frequency_conditional(0, index);
            if !first {
                out.push_str("; ");
            }
            out.push_str(&format!("{effect} {:.2}%", p * 100.0));
            first = false;
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_state::{ClassId, Id};
    use std::collections::BTreeMap;

    fn toggle_registry() -> (Registry, ClassId, qora_state::AttributeId) {
        let mut registry = Registry::new();
        let on = registry.add_attribute_type("on", 1);
        let class = registry.add_object_class("light");
        registry.add_attribute_to_class(class, on);
        (registry, class, on)
    }

    #[test]
    fn unseen_predictor_falls_back_to_baseline() {
        let (registry, class, on) = toggle_registry();
        let mut predictor = StochasticEffectPredictor::new(0.05);
        let target = registry.create_object(class, Id::new(0));
        let objects_by_class: ObjectsByClass<'_> = BTreeMap::new();

        predictor.observe(&target, &registry, &objects_by_class, &AttributeValue::from_values(vec![1]));
        let prediction = predictor.predict(&target, &objects_by_class);
        assert_eq!(prediction.get(&AttributeValue::from_values(vec![1])), 1.0);
        let _ = on;
    }

    #[test]
    fn learns_unary_hypothesis_for_toggle_effect() {
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

        assert!(!predictor.hypotheses().is_empty());
        let mut off_target = registry.create_object(class, Id::new(0));
        off_target.set_attribute(on, AttributeValue::from_values(vec![0]));
        let prediction = predictor.predict(&off_target, &objects_by_class);
        assert!(prediction.get(&plus_one) > 0.9);
    }
}
