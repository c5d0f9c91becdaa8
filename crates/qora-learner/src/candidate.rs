use crate::FrequencyTable;
use qora_condition::{Condition, ObjectsByClass};
use qora_state::{Object, Registry};

/// A `Condition` paired with the frequency table observing its outcomes
/// (spec.md §3 "Candidate", grounded in
/// `original_source/QORA/LearnerQORA.h`'s `Candidate`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
    pub condition: Condition,
    pub table: FrequencyTable,
}

impl Candidate {
    pub fn new(condition: Condition) -> Self {
        let m = condition.state_size();
        Self {
            condition,
            table: FrequencyTable::new(m),
        }
    }

    pub fn observe(&mut self, target: &Object, objects_by_class: &ObjectsByClass<'_>, effect_index: usize) {
        let state_in = self.condition.evaluate(target, objects_by_class);
        self.table.observe(state_in, effect_index);
    }

    pub fn describe(
        &self,
        registry: &Registry,
        target_class: qora_state::ClassId,
        effects: &[qora_state::AttributeValue],
    ) -> String {
        let mut out = format!("     {}\n     {}\n", self.condition.describe(registry, target_class), self.table.describe());
        for input in self.table.observed_input_states() {
            out.push_str(&format!("      {}\n       ", self.condition.describe_case(input)));
            let mut first = true;
            for (index, effect) in effects.iter().enumerate() {
                let p = self.table.frequency_conditional(input, index);
                if p > 0.0 {
                    if !first {
                        out.push_str("; ");
                    }
                    out.push_str(&format!("{effect} {:.2}%", p * 100.0));
                    first = false;
                }
            }
            out.push('\n');
        }
        out
    }
}

impl PartialOrd for Candidate {
    /// Ordered purely by the table's success interval, matching
    /// `Candidate::operator<`/`operator>` in the reference implementation.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.table.partial_cmp(&other.table)
    }
}
