//! Response normalization
//!
//! Every completion passes through a pipeline of named cleanup rules
//! before it is parsed or accepted as a statement. Model-specific quirks
//! plug in here by name instead of leaking string hacks into callers; the
//! built-in `reasoning-tags` rule strips the `<think>…</think>` blocks
//! some reasoning models emit around their answer.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Name of the built-in rule removing `<think>…</think>` blocks
pub const REASONING_TAGS: &str = "reasoning-tags";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unknown normalization rule: {0}")]
    UnknownRule(String),
}

#[derive(Clone, Copy)]
struct Rule {
    name: &'static str,
    apply: fn(&str) -> String,
}

const RULES: &[Rule] = &[Rule {
    name: REASONING_TAGS,
    apply: strip_reasoning_tags,
}];

/// An ordered pipeline of cleanup rules applied to every completion.
#[derive(Clone)]
pub struct Normalizer {
    rules: Vec<Rule>,
}

impl Normalizer {
    /// Build a pipeline from rule names; unknown names are a configuration
    /// error surfaced before any model call.
    pub fn from_names<I, S>(names: I) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = names
            .into_iter()
            .map(|name| {
                RULES
                    .iter()
                    .find(|rule| rule.name == name.as_ref())
                    .copied()
                    .ok_or_else(|| NormalizeError::UnknownRule(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Run all rules in order and trim the result.
    pub fn apply(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            current = (rule.apply)(&current);
        }
        current.trim().to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: RULES.to_vec(),
        }
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|r| r.name).collect();
        f.debug_struct("Normalizer").field("rules", &names).finish()
    }
}

fn strip_reasoning_tags(text: &str) -> String {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid pattern"));
    re.replace_all(text, "").into_owned()
}

/// Extract the final statement from a cleaned response.
///
/// When prompts use the structured envelope, the statement is whatever
/// follows the last occurrence of `marker`; a response without the marker
/// degrades to the whole text rather than failing.
pub fn extract_statement(text: &str, marker: Option<&str>) -> String {
    match marker {
        Some(marker) if !marker.is_empty() => match text.rfind(marker) {
            Some(at) => text[at + marker.len()..].trim().to_string(),
            None => text.trim().to_string(),
        },
        _ => text.trim().to_string(),
    }
}
