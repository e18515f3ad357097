//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file and
//! convert into the application's `EngineConfig`.

use plenum_application::config::{
    default_max_in_flight, EngineConfig, GenerationSettings, RankingSettings, DEFAULT_ENDPOINT,
    DEFAULT_MODEL,
};
use plenum_domain::session::normalize::REASONING_TAGS;
use plenum_domain::{PromptTemplates, SamplingParams, VotingStrategy};
use serde::{Deserialize, Serialize};

/// `[generation]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

/// `[ranking]` section; endpoint and model fall back to `[generation]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRankingConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_retries: u32,
}

impl Default for FileRankingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            temperature: 0.2,
            max_retries: 3,
        }
    }
}

/// `[deliberation]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    pub num_candidates: usize,
    pub max_group_size: usize,
    pub voting_strategy: VotingStrategy,
    pub max_in_flight: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        Self {
            num_candidates: 4,
            max_group_size: 12,
            voting_strategy: VotingStrategy::default(),
            max_in_flight: None,
            seed: None,
        }
    }
}

/// `[response]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResponseConfig {
    pub normalize_rules: Vec<String>,
    pub statement_marker: Option<String>,
}

impl Default for FileResponseConfig {
    fn default() -> Self {
        Self {
            normalize_rules: vec![REASONING_TAGS.to_string()],
            statement_marker: None,
        }
    }
}

/// `[templates]` section; unset templates use the built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTemplatesConfig {
    pub candidate: Option<String>,
    pub ranking: Option<String>,
}

/// The whole TOML configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub generation: FileGenerationConfig,
    pub ranking: FileRankingConfig,
    pub deliberation: FileDeliberationConfig,
    pub response: FileResponseConfig,
    pub templates: FileTemplatesConfig,
}

impl FileConfig {
    /// Convert into the engine's configuration, resolving the ranking
    /// fallbacks and the concurrency default.
    pub fn into_engine_config(self) -> EngineConfig {
        let defaults = PromptTemplates::default();
        EngineConfig {
            ranking: RankingSettings {
                endpoint: self
                    .ranking
                    .endpoint
                    .unwrap_or_else(|| self.generation.endpoint.clone()),
                model: self
                    .ranking
                    .model
                    .unwrap_or_else(|| self.generation.model.clone()),
                temperature: self.ranking.temperature,
                max_retries: self.ranking.max_retries,
            },
            generation: GenerationSettings {
                endpoint: self.generation.endpoint,
                model: self.generation.model,
                sampling: SamplingParams {
                    temperature: self.generation.temperature,
                    top_p: Some(self.generation.top_p),
                    top_k: Some(self.generation.top_k),
                },
            },
            num_candidates: self.deliberation.num_candidates,
            max_group_size: self.deliberation.max_group_size,
            voting_strategy: self.deliberation.voting_strategy,
            max_in_flight: self
                .deliberation
                .max_in_flight
                .unwrap_or_else(default_max_in_flight),
            seed: self.deliberation.seed,
            normalize_rules: self.response.normalize_rules,
            statement_marker: self.response.statement_marker,
            templates: PromptTemplates {
                candidate: self.templates.candidate.unwrap_or(defaults.candidate),
                ranking: self.templates.ranking.unwrap_or(defaults.ranking),
            },
        }
    }
}
