//! Recursion tree entities
//!
//! A deliberation session produces a tree of [`GroupNode`]s: leaves elect
//! over original opinions, inner nodes elect over the winning statements
//! promoted from their children. Nodes are written by the task running
//! their election and become visible to readers only once finished.

use std::collections::BTreeSet;

use serde::Serialize;

use super::ranking::Ranking;

/// One voter's ballot in a finished election, with its audit trail
#[derive(Debug, Clone, Serialize)]
pub struct RankingRecord {
    /// Original participant position of the voter
    pub voter_position: usize,
    pub ranking: Ranking,
    /// True when every oracle attempt failed and a uniform-random
    /// permutation was substituted
    pub fallback: bool,
    /// One line per parse attempt, for transcripts and debugging
    pub attempts: Vec<String>,
}

/// A finished (or in-flight) election over one group of items
#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    /// Recursion depth; 0 is the leaf level over original opinions
    pub level: usize,
    /// Index of this group within its level
    pub group_index: usize,
    /// Original participant positions whose opinions transitively feed
    /// this node's items
    pub member_positions: BTreeSet<usize>,
    /// The statements this group deliberated over (opinions at level 0,
    /// promoted winners above)
    pub statements: Vec<String>,
    /// Generated candidate consensus statements
    pub candidates: Vec<String>,
    /// One record per voter in this election
    pub rankings: Vec<RankingRecord>,
    /// Winning candidate index, set when the election finishes
    pub winner: Option<usize>,
    pub pairwise: Vec<Vec<u32>>,
    pub strongest: Vec<Vec<u32>>,
    /// Child nodes whose winners became this node's statements
    pub children: Vec<GroupNode>,
}

impl GroupNode {
    pub fn winning_statement(&self) -> Option<&str> {
        self.winner.map(|w| self.candidates[w].as_str())
    }

    /// Whether any voter in this subtree fell back to a random ballot
    pub fn any_fallback(&self) -> bool {
        self.rankings.iter().any(|r| r.fallback)
            || self.children.iter().any(GroupNode::any_fallback)
    }
}

/// An item under deliberation at some level: a statement plus the original
/// participants it speaks for. At level 0 each item is one opinion with a
/// single origin; promotion unions the origins of the winning subtree.
#[derive(Debug, Clone)]
pub struct LevelItem {
    pub statement: String,
    pub origins: BTreeSet<usize>,
    /// The child election that produced this item (`None` at level 0)
    pub source: Option<GroupNode>,
}

impl LevelItem {
    /// A leaf item for one original participant
    pub fn leaf(position: usize, opinion: impl Into<String>) -> Self {
        Self {
            statement: opinion.into(),
            origins: BTreeSet::from([position]),
            source: None,
        }
    }

    /// Promote a finished election's winner to the next level
    pub fn promoted(node: GroupNode) -> Option<Self> {
        let statement = node.winning_statement()?.to_string();
        Some(Self {
            statement,
            origins: node.member_positions.clone(),
            source: Some(node),
        })
    }
}
