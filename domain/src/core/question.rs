//! Question value object

use serde::{Deserialize, Serialize};

/// The question a group deliberates on (Value Object)
///
/// Immutable for the lifetime of a session. Construction rejects empty or
/// whitespace-only text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    content: String,
}

impl Question {
    /// Try to create a question, returning `None` if the text is empty
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    /// Get the question text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner text
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_new_valid() {
        let q = Question::try_new("Should voting be compulsory?").unwrap();
        assert_eq!(q.content(), "Should voting be compulsory?");
    }

    #[test]
    fn try_new_rejects_empty() {
        assert!(Question::try_new("").is_none());
        assert!(Question::try_new("   \n ").is_none());
    }

    #[test]
    fn display_round_trips() {
        let q = Question::try_new("What matters most?").unwrap();
        assert_eq!(q.to_string(), "What matters most?");
    }
}
