//! Sampling parameter value object

use serde::{Deserialize, Serialize};

/// Model sampling parameters for one completion call (Value Object)
///
/// Ranking calls send only a temperature; top-p and top-k stay unset so the
/// gateway omits them from the wire options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

impl SamplingParams {
    /// Defaults for candidate generation: creative but bounded
    pub fn generation() -> Self {
        Self {
            temperature: 0.7,
            top_p: Some(0.9),
            top_k: Some(40),
        }
    }

    /// Defaults for ranking prediction: near-deterministic
    pub fn ranking() -> Self {
        Self {
            temperature: 0.2,
            top_p: None,
            top_k: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}
