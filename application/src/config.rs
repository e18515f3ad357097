//! Engine configuration
//!
//! Everything a session needs is carried here explicitly — there are no
//! process-wide singletons. Built by the caller (CLI, tests) and validated
//! before any model call is issued.

use plenum_domain::{PromptTemplates, SamplingParams, VotingStrategy};

/// Default gateway endpoint (a local Ollama-compatible server)
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default model identifier for both tasks
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Settings for candidate generation calls
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub endpoint: String,
    pub model: String,
    pub sampling: SamplingParams,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            sampling: SamplingParams::generation(),
        }
    }
}

/// Settings for ranking prediction calls
///
/// Generation and ranking may target distinct endpoints and models (e.g. a
/// creative statement model and a finetuned reward model).
#[derive(Debug, Clone)]
pub struct RankingSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Oracle attempt budget before the random fallback ballot
    pub max_retries: u32,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_retries: 3,
        }
    }
}

impl RankingSettings {
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams::ranking().with_temperature(self.temperature)
    }
}

/// Full configuration for one deliberation session
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub generation: GenerationSettings,
    pub ranking: RankingSettings,
    /// Candidates per group election, clamped to `[2, min(9, members)]`
    pub num_candidates: usize,
    /// Partitioner cap on group size
    pub max_group_size: usize,
    pub voting_strategy: VotingStrategy,
    /// Global ceiling on concurrent model calls
    pub max_in_flight: usize,
    /// Seed for the session RNG; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Named response cleanup rules, applied in order
    pub normalize_rules: Vec<String>,
    /// Optional envelope marker; text after its last occurrence is taken
    /// as the generated statement
    pub statement_marker: Option<String>,
    pub templates: PromptTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            ranking: RankingSettings::default(),
            num_candidates: 4,
            max_group_size: 12,
            voting_strategy: VotingStrategy::default(),
            max_in_flight: default_max_in_flight(),
            seed: None,
            normalize_rules: vec![plenum_domain::session::normalize::REASONING_TAGS.to_string()],
            statement_marker: None,
            templates: PromptTemplates::default(),
        }
    }
}

impl EngineConfig {
    /// Number of candidates for a group with `members` items.
    pub fn candidates_for(&self, members: usize) -> usize {
        self.num_candidates.clamp(2, 9).min(members)
    }
}

/// Logical CPU count with a floor of two
pub fn default_max_in_flight() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .max(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.num_candidates, 4);
        assert_eq!(config.max_group_size, 12);
        assert_eq!(config.ranking.max_retries, 3);
        assert_eq!(config.ranking.temperature, 0.2);
        assert_eq!(config.voting_strategy, VotingStrategy::OwnGroupOnly);
        assert!(config.max_in_flight >= 2);
        config.templates.validate().unwrap();
    }

    #[test]
    fn candidate_count_clamps_to_group_and_nine() {
        let mut config = EngineConfig::default();
        assert_eq!(config.candidates_for(12), 4);
        assert_eq!(config.candidates_for(3), 3);
        assert_eq!(config.candidates_for(1), 1);

        config.num_candidates = 50;
        assert_eq!(config.candidates_for(12), 9);

        config.num_candidates = 0;
        assert_eq!(config.candidates_for(12), 2);
    }
}
