//! Prompt templates for the deliberation flow
//!
//! Templates are plain strings with `{placeholder}` slots, overridable via
//! configuration. Placeholders are validated up front so a broken template
//! is rejected before any model call is issued.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default template for drafting a candidate consensus statement
pub const DEFAULT_CANDIDATE_TEMPLATE: &str = "Given these participant statements, please combine these statements into a single group statement that synthesizes their viewpoints and includes all their individual points and concerns. This should represent a fair consensus or position that most participants could accept, and be representative of all details, concerns, suggestions, or questions from all participants, even if that make the combined statement longer. Your response will be used verbatim as the statement, so do not include any preamble or postscript.

---

# {question}

---

{participant_statements}

---
";

/// Default template for predicting one participant's ranking
pub const DEFAULT_RANKING_TEMPLATE: &str = "Given this participant's statement, predict how this participant would rank these group statements from most preferred (1) to least preferred ({num_candidates}).

# {question}

## Participant {participant_num}'s original statement: {participant_statement}

## Group Statements to Rank:

{candidate_statements}

Based on the participant's original statement, predict their ranking of these group statements from most preferred to least preferred as a JSON object:

{
  \"ranking\": [1, 2, etc.]
}

Important: Your response MUST contain ONLY a valid JSON object with a list of positive integer rankings under the key \"ranking\", NOT a list of statements, and must align with how this participant would rank them; e.g. how aligned they are with this participant's stance and priorities. Index starts at 1, not 0.";

const CANDIDATE_PLACEHOLDERS: &[&str] = &["{question}", "{participant_statements}"];
const RANKING_PLACEHOLDERS: &[&str] = &[
    "{question}",
    "{participant_num}",
    "{participant_statement}",
    "{num_candidates}",
    "{candidate_statements}",
];

/// A template without one of its required placeholders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{template} template missing placeholder {placeholder}")]
pub struct TemplateError {
    pub template: &'static str,
    pub placeholder: &'static str,
}

/// The two prompt templates of a session, with placeholder validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub candidate: String,
    pub ranking: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            candidate: DEFAULT_CANDIDATE_TEMPLATE.to_string(),
            ranking: DEFAULT_RANKING_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Check both templates for their required placeholders.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for placeholder in CANDIDATE_PLACEHOLDERS {
            if !self.candidate.contains(placeholder) {
                return Err(TemplateError {
                    template: "candidate",
                    placeholder,
                });
            }
        }
        for placeholder in RANKING_PLACEHOLDERS {
            if !self.ranking.contains(placeholder) {
                return Err(TemplateError {
                    template: "ranking",
                    placeholder,
                });
            }
        }
        Ok(())
    }

    /// Build the generation prompt. Opinions are listed in the order given;
    /// the caller shuffles them per request, and the participant numbering
    /// here is presentational only.
    pub fn candidate_prompt(&self, question: &str, opinions: &[String]) -> String {
        self.candidate
            .replace("{question}", question)
            .replace("{participant_statements}", &format_opinions(opinions))
    }

    /// Build the ranking prompt for one voter over a candidate set.
    pub fn ranking_prompt(
        &self,
        question: &str,
        participant_num: usize,
        participant_statement: &str,
        candidates: &[String],
    ) -> String {
        self.ranking
            .replace("{question}", question)
            .replace("{participant_num}", &participant_num.to_string())
            .replace("{participant_statement}", participant_statement)
            .replace("{num_candidates}", &candidates.len().to_string())
            .replace("{candidate_statements}", &format_candidates(candidates))
    }
}

fn format_opinions(opinions: &[String]) -> String {
    opinions
        .iter()
        .enumerate()
        .map(|(i, opinion)| format!("Participant {}: {}\n\n", i + 1, opinion))
        .collect()
}

fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, statement)| format!("Statement {}:\n{}\n\n", i + 1, statement))
        .collect()
}

/// System prompt instructing strict-JSON ballot output.
///
/// The embedded example uses a different size than the real election
/// (`max(3, K-1)`) and a shuffled order, so the model cannot anchor on it
/// as an answer.
pub fn ranking_system_prompt(num_candidates: usize, rng: &mut impl Rng) -> String {
    let example_size = 3.max(num_candidates.saturating_sub(1));
    let mut example: Vec<usize> = (1..=example_size).collect();
    example.shuffle(rng);

    format!(
        "You are a ranking prediction assistant that outputs results in JSON format. \
Your task is to predict how a participant would rank statements based on their perspective.\n\n\
Your response MUST be a valid JSON object with a 'ranking' field containing an array of integers representing \
statement numbers (1 to {num_candidates}), ordered from most preferred to least preferred.\n\n\
Example JSON format (do not copy these example values):\n\
{{\n  \"ranking\": {example:?}\n}}\n\n\
Your entire response should ONLY contain the JSON object, with no additional text before or after."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn defaults_validate() {
        PromptTemplates::default().validate().unwrap();
    }

    #[test]
    fn missing_placeholder_is_reported() {
        let templates = PromptTemplates {
            candidate: "# {question}".to_string(),
            ..Default::default()
        };
        let err = templates.validate().unwrap_err();
        assert_eq!(err.template, "candidate");
        assert_eq!(err.placeholder, "{participant_statements}");
    }

    #[test]
    fn missing_ranking_placeholder_is_reported() {
        let templates = PromptTemplates {
            ranking: "{question} {participant_num} {participant_statement} {num_candidates}"
                .to_string(),
            ..Default::default()
        };
        let err = templates.validate().unwrap_err();
        assert_eq!(err.template, "ranking");
        assert_eq!(err.placeholder, "{candidate_statements}");
    }

    #[test]
    fn candidate_prompt_numbers_opinions_in_given_order() {
        let prompt = PromptTemplates::default().candidate_prompt(
            "Should voting be compulsory?",
            &["First view.".to_string(), "Second view.".to_string()],
        );
        assert!(prompt.contains("# Should voting be compulsory?"));
        assert!(prompt.contains("Participant 1: First view."));
        assert!(prompt.contains("Participant 2: Second view."));
    }

    #[test]
    fn ranking_prompt_fills_all_placeholders() {
        let prompt = PromptTemplates::default().ranking_prompt(
            "Should voting be compulsory?",
            3,
            "I am undecided.",
            &["Option A".to_string(), "Option B".to_string()],
        );
        assert!(prompt.contains("Participant 3's original statement: I am undecided."));
        assert!(prompt.contains("least preferred (2)"));
        assert!(prompt.contains("Statement 1:\nOption A"));
        assert!(prompt.contains("Statement 2:\nOption B"));
        assert!(!prompt.contains("{num_candidates}"));
    }

    #[test]
    fn system_prompt_example_differs_in_size() {
        let mut rng = StdRng::seed_from_u64(5);
        let prompt = ranking_system_prompt(4, &mut rng);
        assert!(prompt.contains("(1 to 4)"));
        // The example ranks 3 items, never 4
        let example_start = prompt.find("\"ranking\": [").unwrap();
        let example = &prompt[example_start..prompt[example_start..].find(']').unwrap() + example_start];
        assert_eq!(example.matches(',').count(), 2);
    }

    #[test]
    fn system_prompt_example_size_floor_is_three() {
        let mut rng = StdRng::seed_from_u64(5);
        let prompt = ranking_system_prompt(2, &mut rng);
        assert!(prompt.contains("(1 to 2)"));
        let example_start = prompt.find("\"ranking\": [").unwrap();
        let example = &prompt[example_start..prompt[example_start..].find(']').unwrap() + example_start];
        assert_eq!(example.matches(',').count(), 2);
    }
}
