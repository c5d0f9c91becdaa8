//! Core type aliases, identifiers, error types, and statistics primitives
//! shared across the QORA workspace.
#![allow(dead_code)]

mod id;
mod stats;

pub use id::Id;
pub use stats::{normal_quantile, wilson_interval, ConfidenceInterval};

use std::fmt;

/// Weights in a [`ProbabilityDistribution`](https://docs.rs/qora-distribution),
/// counts-as-frequencies, and confidence-interval bounds. `f64` throughout:
/// Wilson-interval bisection targets `1e-6` accuracy and distribution
/// normalization is checked to `1e-12`, both of which need more headroom
/// than `f32` gives.
pub type Probability = f64;
/// Integer element type of an [`AttributeValue`](https://docs.rs/qora-state).
/// 32-bit signed is sufficient for every domain in scope (spec.md §7).
pub type Scalar = i32;
/// Observation counters inside a [`FrequencyTable`](https://docs.rs/qora-learner).
pub type Count = u64;
/// Confidence level passed to Wilson-interval estimation (e.g. `0.01`, `0.05`).
pub type Alpha = f64;

/// Error kinds surfaced by the QORA core, per spec.md §7.
///
/// All of these terminate the current operation; there is no silent
/// coercion or partial update. Operations documented as "programming
/// error" in the spec (empty-distribution sampling, out-of-range
/// attribute access) panic instead of returning `Err`, matching the
/// teacher's own split between `anyhow`-style fallible boundaries and
/// `panic!`/`unreachable!` for internal invariants.
#[derive(Debug, thiserror::Error)]
pub enum QoraError {
    /// An observation referenced an attribute, class, or action absent
    /// from the type registry.
    #[error("registry mismatch: {0}")]
    RegistryMismatch(String),
    /// Two states expected to share an object-id set did not.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),
    /// A persisted document referenced an unknown name or had a malformed
    /// field; the offending field path is included.
    #[error("decode error at `{path}`: {reason}")]
    DecodeError { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, QoraError>;

impl QoraError {
    pub fn registry_mismatch(msg: impl fmt::Display) -> Self {
        Self::RegistryMismatch(msg.to_string())
    }
    pub fn structural_mismatch(msg: impl fmt::Display) -> Self {
        Self::StructuralMismatch(msg.to_string())
    }
    pub fn decode(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::DecodeError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Standard action ids reserved by [`add_standard_actions`](https://docs.rs/qora-state),
/// per spec.md §3.
pub mod standard_actions {
    pub const NOOP: u32 = 0;
    pub const MOVE_LEFT: u32 = 1;
    pub const MOVE_RIGHT: u32 = 2;
    pub const MOVE_UP: u32 = 3;
    pub const MOVE_DOWN: u32 = 4;
}

/// Initialize dual logging (terminal + file) for training/inspection runs.
///
/// Mirrors the teacher's `rbp_core::log()`; gated behind the `diagnostics`
/// feature so the core stays dependency-light by default (the spec's
/// Non-goals exclude a CLI/driver, but ambient logging is still carried
/// whenever a caller opts in).
#[cfg(feature = "diagnostics")]
pub fn init_logging() {
    let config = simplelog::ConfigBuilder::new()
        .set_time_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let _ = simplelog::TermLogger::init(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
}
