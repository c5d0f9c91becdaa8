//! Registry-aware, by-name JSON persistence for QORA (spec.md §4.C10).
//!
//! Every other crate in the workspace stores class/attribute/action
//! references as dense numeric ids, which are only valid relative to the
//! [`Registry`](qora_state::Registry) that assigned them. This crate is the
//! one place that turns those ids into names on the way out and resolves
//! names back into *this process's* ids on the way in, so a document
//! produced against one registry instance decodes correctly against any
//! other registry built with the same names (spec.md §4.C10's round-trip
//! contract).
mod candidate;
mod condition;
mod effect_type;
mod learner;
mod predictor;
mod state;

pub use candidate::{decode_candidate, encode_candidate};
pub use condition::{decode_condition, decode_predicate, decode_relation_group, encode_condition, encode_predicate, encode_relation_group};
pub use effect_type::{decode_effect_type, encode_effect_type};
pub use learner::{decode_qora, encode_qora, DecodedLearnerDocument};
pub use predictor::{decode_predictor, encode_predictor};
pub use state::{decode_state, encode_state};
