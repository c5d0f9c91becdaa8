use qora_core::Alpha;

/// Tunables for a `Qora` learner, round-tripped as part of the persisted
/// document's `parameters` field (spec.md §6).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameters {
    /// Confidence level fed to every Wilson-interval computation — both
    /// the per-predictor baseline and every candidate's table. `0.01`
    /// (99% confidence) is the reference implementation's default.
    pub alpha: Alpha,
}

impl Default for Parameters {
    fn default() -> Self {
        Self { alpha: 0.01 }
    }
}

impl Parameters {
    pub fn new(alpha: Alpha) -> Self {
        Self { alpha }
    }
}
