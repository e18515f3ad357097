//! Participant value object

use serde::{Deserialize, Serialize};

/// One participant in a deliberation session (Value Object)
///
/// The position is the participant's stable identity: it is assigned once
/// from input order and survives partitioning and promotion, so a ranking
/// at any recursion level can always be attributed to the original person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    position: usize,
    opinion: String,
}

impl Participant {
    pub fn new(position: usize, opinion: impl Into<String>) -> Self {
        Self {
            position,
            opinion: opinion.into(),
        }
    }

    /// Stable zero-based position within the session
    pub fn position(&self) -> usize {
        self.position
    }

    /// The participant's opinion text, used both as generation input and as
    /// the voter's self-description in ranking prediction
    pub fn opinion(&self) -> &str {
        &self.opinion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let p = Participant::new(3, "I support the proposal.");
        assert_eq!(p.position(), 3);
        assert_eq!(p.opinion(), "I support the proposal.");
    }
}
