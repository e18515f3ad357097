//! Typed progress events for a deliberation session.
//!
//! The event stream is the engine's sole programmatic surface: UIs and
//! transcript writers subscribe to it instead of reaching into the engine.
//! Events from one group are strictly ordered; events from sibling groups
//! interleave, each carrying its `(level, group)` coordinates.

use serde::Serialize;

/// An event in a deliberation session, emitted in causal order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliberationEvent {
    /// A recursion level begins
    LevelStart {
        level: usize,
        items: usize,
        groups: usize,
    },
    /// One group's election begins
    GroupStart {
        level: usize,
        group: usize,
        members: usize,
        voters: usize,
    },
    /// A candidate generation request was issued
    CandidateStart {
        level: usize,
        group: usize,
        candidate: usize,
    },
    /// Streamed text arrived for a candidate under generation
    CandidateChunk {
        level: usize,
        group: usize,
        candidate: usize,
        chunk: String,
    },
    /// A candidate statement was accepted
    CandidateDone {
        level: usize,
        group: usize,
        candidate: usize,
        statement: String,
    },
    /// Ranking prediction for one voter begins
    OracleStart {
        level: usize,
        group: usize,
        voter: usize,
    },
    /// One oracle attempt failed to yield a valid ballot
    OracleAttempt {
        level: usize,
        group: usize,
        voter: usize,
        attempt: u32,
        error: String,
    },
    /// Every attempt failed; a random ballot was substituted
    OracleFallback {
        level: usize,
        group: usize,
        voter: usize,
    },
    /// The voter's ballot is final
    OracleDone {
        level: usize,
        group: usize,
        voter: usize,
        fallback: bool,
    },
    /// The group's election was tabulated
    ElectionDone {
        level: usize,
        group: usize,
        winner: usize,
        pairwise: Vec<Vec<u32>>,
        strongest: Vec<Vec<u32>>,
    },
    /// All groups of a level finished
    LevelDone { level: usize, winners: usize },
    /// The session finished with a consensus statement
    Done { winner: String },
    /// The cancel signal was observed; no further model calls follow
    Cancelled,
    /// The session aborted with a fatal error
    Failed { error: String },
}

impl DeliberationEvent {
    /// The `(level, group)` coordinates for group-scoped events
    pub fn group_scope(&self) -> Option<(usize, usize)> {
        use DeliberationEvent::*;
        match self {
            GroupStart { level, group, .. }
            | CandidateStart { level, group, .. }
            | CandidateChunk { level, group, .. }
            | CandidateDone { level, group, .. }
            | OracleStart { level, group, .. }
            | OracleAttempt { level, group, .. }
            | OracleFallback { level, group, .. }
            | OracleDone { level, group, .. }
            | ElectionDone { level, group, .. } => Some((*level, *group)),
            _ => None,
        }
    }

    /// True for events that end the session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliberationEvent::Done { .. }
                | DeliberationEvent::Cancelled
                | DeliberationEvent::Failed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_scope_for_scoped_events() {
        let event = DeliberationEvent::CandidateDone {
            level: 1,
            group: 2,
            candidate: 0,
            statement: "s".into(),
        };
        assert_eq!(event.group_scope(), Some((1, 2)));
    }

    #[test]
    fn level_and_session_events_have_no_group_scope() {
        assert_eq!(
            DeliberationEvent::LevelStart {
                level: 0,
                items: 5,
                groups: 1
            }
            .group_scope(),
            None
        );
        assert_eq!(DeliberationEvent::Cancelled.group_scope(), None);
    }

    #[test]
    fn terminal_classification() {
        assert!(DeliberationEvent::Done { winner: "w".into() }.is_terminal());
        assert!(DeliberationEvent::Cancelled.is_terminal());
        assert!(!DeliberationEvent::LevelDone {
            level: 0,
            winners: 3
        }
        .is_terminal());
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = DeliberationEvent::OracleFallback {
            level: 0,
            group: 1,
            voter: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "oracle_fallback");
        assert_eq!(json["voter"], 3);
    }
}
