//! The QORA hypothesis-search learner.
//!
//! - [`FrequencyTable`] — a conditional frequency table with a
//!   Wilson-interval success score (spec.md §4.C6).
//! - [`Condition`]-keyed [`Candidate`]s and [`StochasticEffectPredictor`] —
//!   the per-`(class, attribute, action)` incremental hypothesis search
//!   (spec.md §4.C8).
//! - [`Qora`] — the top-level per-transition coordinator (spec.md §4.C9).
mod candidate;
mod effect_type;
mod frequency_table;
mod learner;
mod parameters;
mod predictor;

pub use candidate::Candidate;
pub use effect_type::EffectType;
pub use frequency_table::FrequencyTable;
pub use learner::Qora;
pub use parameters::Parameters;
pub use predictor::StochasticEffectPredictor;

pub use qora_condition::Condition;
