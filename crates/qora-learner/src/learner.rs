use crate::{EffectType, Parameters, StochasticEffectPredictor};
use qora_core::Result;
use qora_distribution::{ProbabilityDistribution, StateDistribution};
use qora_state::{ActionId, Registry, State};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Top-level coordinator (spec.md §4.C9, grounded in
/// `original_source/QORA/LearnerQORA.h`'s `LearnerQORA`): routes each
/// observed transition to the `(EffectType, action)` predictor
/// responsible for it, and assembles a full-state prediction out of every
/// object/attribute's individual prediction.
#[derive(Debug, Clone)]
pub struct Qora {
    parameters: Parameters,
    effects_observed: BTreeMap<(EffectType, ActionId), BTreeSet<qora_state::AttributeValue>>,
    predictors: BTreeMap<(EffectType, ActionId), StochasticEffectPredictor>,
    last_predicates_observed: usize,
    observations: u64,
}

impl Qora {
    pub fn new(parameters: Parameters) -> Self {
        Self {
            parameters,
            effects_observed: BTreeMap::new(),
            predictors: BTreeMap::new(),
            last_predicates_observed: 0,
            observations: 0,
        }
    }

    /// Total number of [`observe_transition`](Self::observe_transition)
    /// calls since construction or the last [`reset`](Self::reset) —
    /// persisted as the document's top-level `observations` field
    /// (spec.md §6).
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Restore the observation counter during decode.
    pub fn set_observations(&mut self, observations: u64) {
        self.observations = observations;
    }

    pub fn alpha(&self) -> qora_core::Alpha {
        self.parameters.alpha
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Erase all learned parameters, keeping the configured `alpha`.
    pub fn reset(&mut self) {
        self.effects_observed.clear();
        self.predictors.clear();
        self.last_predicates_observed = 0;
        self.observations = 0;
    }

    /// Invoked between episodes; a no-op for this learner, which keeps no
    /// episode-scoped history (spec.md §6).
    pub fn restart(&self) {}

    /// Sum, across every predictor invoked during the most recent
    /// [`observe_transition`](Self::observe_transition), of that
    /// predictor's own observed-predicate count (double-counts predicates
    /// shared across predictors) — ported from the reference
    /// implementation's `countLastPredicatesObserved`.
    pub fn count_last_predicates_observed(&self) -> usize {
        self.last_predicates_observed
    }

    /// Sum of every predictor's observed-predicate count (double-counts).
    pub fn count_total_predicates_observed(&self) -> usize {
        self.predictors.values().map(|p| p.count_predicates_observed()).sum()
    }

    /// Union of every predictor's observed-predicate set (no double-count).
    pub fn count_unique_predicates_observed(&self) -> usize {
        let mut observed = BTreeSet::new();
        for predictor in self.predictors.values() {
            observed.extend(predictor.observed().iter().cloned());
        }
        observed.len()
    }

    /// `(EffectType, action) -> observed effects` entries, for
    /// [`qora-persistence`](https://docs.rs/qora-persistence)'s encode pass.
    pub fn effects_observed(
        &self,
    ) -> impl Iterator<Item = (EffectType, ActionId, &BTreeSet<qora_state::AttributeValue>)> {
        self.effects_observed.iter().map(|(&(t, a), effects)| (t, a, effects))
    }

    /// `(EffectType, action) -> predictor` entries, for
    /// [`qora-persistence`](https://docs.rs/qora-persistence)'s encode pass.
    pub fn predictors(&self) -> impl Iterator<Item = (EffectType, ActionId, &StochasticEffectPredictor)> {
        self.predictors.iter().map(|(&(t, a), p)| (t, a, p))
    }

    /// Rebuild one `effects_observed` entry during decode. The caller is
    /// responsible for feeding entries in an order consistent with the
    /// persisted document; `|effects| == 1` entries never get a matching
    /// predictor, `|effects| >= 2` ones must be paired with
    /// [`insert_predictor`](Self::insert_predictor).
    pub fn insert_effects_observed(
        &mut self,
        effect_type: EffectType,
        action: ActionId,
        effects: BTreeSet<qora_state::AttributeValue>,
    ) {
        self.effects_observed.insert((effect_type, action), effects);
    }

    /// Rebuild one `predictors` entry during decode.
    pub fn insert_predictor(
        &mut self,
        effect_type: EffectType,
        action: ActionId,
        predictor: StochasticEffectPredictor,
    ) {
        self.predictors.insert((effect_type, action), predictor);
    }

    /// Compute `next.diff(prev)`, dispatch every non-structural-mismatch
    /// per-attribute delta to its `(EffectType, action)` predictor, lazily
    /// constructing one the first time an effect type shows more than one
    /// possible delta (spec.md §4.C9).
    pub fn observe_transition(
        &mut self,
        registry: &Registry,
        prev: &State,
        action: ActionId,
        next: &State,
    ) -> Result<()> {
        self.last_predicates_observed = 0;
        self.observations += 1;
        let objects_by_class = prev.class_index();
        let delta = next.diff(prev)?;

        for delta_object in delta.objects() {
            let target = prev.object(delta_object.object_id).expect("delta carries prev's object ids");
            for (attribute_id, effect) in delta_object.attributes() {
                let key = (EffectType::new(delta_object.class_id, attribute_id), action);
                let effects = self.effects_observed.entry(key).or_default();
                let newly_ambiguous = effects.insert(effect.clone()) && effects.len() == 2;
                if newly_ambiguous {
                    self.predictors.insert(key, StochasticEffectPredictor::new(self.parameters.alpha));
                }
                if let Some(predictor) = self.predictors.get_mut(&key) {
                    predictor.observe(target, registry, &objects_by_class, effect);
                    self.last_predicates_observed += predictor.count_predicates_observed();
                }
            }
        }
        Ok(())
    }

    /// Predict every object attribute's post-action distribution and fuse
    /// them into a [`StateDistribution`] (spec.md §4.C9).
    ///
    /// - Never-observed `(type, action)`: degenerate distribution on the
    ///   current value.
    /// - Exactly one observed effect: degenerate distribution on
    ///   `current + that_effect` (spec.md §8 property 7, "QORA closure").
    /// - Two or more observed effects: delegate to the predictor and map
    ///   each predicted effect onto `current + effect`.
    pub fn predict_transition(&self, registry: &Registry, state: &State, action: ActionId) -> StateDistribution {
        let objects_by_class = state.class_index();
        let mut prediction = StateDistribution::new();

        for object in state.objects() {
            prediction.add_empty_object(object.class_id, object.object_id);
            let class = registry.object_class(object.class_id);
            for &attribute_id in &class.attribute_ids {
                let current = object.attribute(attribute_id).expect("class attribute missing on object");
                let key = (EffectType::new(object.class_id, attribute_id), action);

                match self.effects_observed.get(&key) {
                    None => {
                        prediction.set_object_attribute_value(object.object_id, attribute_id, current.clone());
                    }
                    Some(effects) if effects.len() == 1 => {
                        let effect = effects.iter().next().expect("len == 1").clone();
                        prediction.set_object_attribute_value(
                            object.object_id,
                            attribute_id,
                            current.clone() + effect,
                        );
                    }
                    Some(_) => {
                        let predicted = self.predictors[&key].predict(object, &objects_by_class);
                        let mut values = ProbabilityDistribution::new();
                        for (effect, weight) in predicted.support() {
                            values.add(current.clone() + effect.clone(), weight);
                        }
                        prediction.add_object_attribute(object.object_id, attribute_id, &values);
                    }
                }
            }
        }
        prediction
    }

    /// Sample a concrete next state from [`predict_transition`](Self::predict_transition).
    pub fn sample_transition(
        &self,
        registry: &Registry,
        state: &State,
        action: ActionId,
        rng: &mut impl Rng,
    ) -> State {
        self.predict_transition(registry, state, action).sample(rng)
    }

    /// Human-readable dump (spec.md §6): one block per `(EffectType,
    /// action)` with more than one observed effect (full predictor dump),
    /// then a one-line "always adds δ" summary for every singleton case.
    pub fn dump(&self, registry: &Registry) -> String {
        let mut out = String::from("Observations:\n");
        if self.effects_observed.is_empty() {
            out.push_str(" none\n");
        }
        for (&(effect_type, action), effects) in &self.effects_observed {
            if effects.len() > 1 {
                out.push_str(&format!(
                    " {} {}.{}:\n",
                    registry.action(action).name,
                    registry.object_class(effect_type.class_id).name,
                    registry.attribute_type(effect_type.attribute_id).name,
                ));
                out.push_str(&self.predictors[&(effect_type, action)].dump(registry, effect_type.class_id));
            }
        }
        for (&(effect_type, action), effects) in &self.effects_observed {
            if effects.len() == 1 {
                out.push_str(&format!(
                    " {} {}.{} += {}\n",
                    registry.action(action).name,
                    registry.object_class(effect_type.class_id).name,
                    registry.attribute_type(effect_type.attribute_id).name,
                    effects.iter().next().expect("len == 1"),
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qora_state::AttributeValue;
    use rand::{rngs::SmallRng, SeedableRng};

    fn counter_registry() -> (Registry, qora_state::ClassId, ActionId, ActionId) {
        let mut registry = Registry::new();
        let count = registry.add_attribute_type("count", 1);
        let class = registry.add_object_class("player");
        registry.add_attribute_to_class(class, count);
        let up = registry.new_action("UP");
        let down = registry.new_action("DOWN");
        (registry, class, up, down)
    }

    #[test]
    fn constant_effect_never_constructs_a_predictor() {
        let (registry, class, up, down) = counter_registry();
        let mut learner = Qora::new(Parameters::default());

        let mut k = 0i32;
        for step in 0..20 {
            let mut prev = State::new();
            let id = prev.insert_fresh(&registry, class);
            let mut prev_object = prev.object(id).unwrap().clone();
            prev_object.set_attribute(registry.attribute_type_by_name("count").unwrap().id, AttributeValue::from_values(vec![k]));
            prev.insert(prev_object);

            let action = if step % 2 == 0 { up } else { down };
            k += if step % 2 == 0 { 1 } else { -1 };

            let mut next = prev.clone();
            let mut next_object = next.object(id).unwrap().clone();
            next_object.set_attribute(registry.attribute_type_by_name("count").unwrap().id, AttributeValue::from_values(vec![k]));
            next.insert(next_object);

            learner.observe_transition(&registry, &prev, action, &next).unwrap();
        }

        assert!(learner.predictors.is_empty());
    }

    #[test]
    fn noop_with_zero_delta_never_constructs_a_predictor() {
        let (registry, class, _up, _down) = counter_registry();
        let mut registry = registry;
        registry.add_standard_actions();
        let noop = registry.action_by_name("NOOP").unwrap().id;
        let mut learner = Qora::new(Parameters::default());

        let mut state = State::new();
        state.insert_fresh(&registry, class);

        for _ in 0..100 {
            learner.observe_transition(&registry, &state, noop, &state).unwrap();
        }
        assert!(learner.predictors.is_empty());
        let _ = class;
    }

    #[test]
    fn predict_closure_for_single_observed_effect() {
        let (registry, class, up, _down) = counter_registry();
        let mut learner = Qora::new(Parameters::default());
        let count_id = registry.attribute_type_by_name("count").unwrap().id;

        let mut prev = State::new();
        let id = prev.insert_fresh(&registry, class);
        let mut next = prev.clone();
        let mut next_object = next.object(id).unwrap().clone();
        next_object.set_attribute(count_id, AttributeValue::from_values(vec![1]));
        next.insert(next_object);

        learner.observe_transition(&registry, &prev, up, &next).unwrap();

        let prediction = learner.predict_transition(&registry, &prev, up);
        let mut rng = SmallRng::seed_from_u64(7);
        let sampled = prediction.sample(&mut rng);
        assert_eq!(
            sampled.object(id).unwrap().attribute(count_id).unwrap(),
            &AttributeValue::from_values(vec![1])
        );
    }
}
