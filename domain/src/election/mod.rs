//! Election domain
//!
//! Everything a single group election needs, as pure logic:
//!
//! - [`ranking::Ranking`] — a validated total order over candidates
//! - [`schulze`] — the Schulze tabulator (pairwise, strongest paths, winner)
//! - [`partition`] — shuffled, balanced splitting of items into groups
//! - [`parsing`] — the ballot extraction cascade for model responses
//! - [`strategy::VotingStrategy`] — who votes at a parent level
//! - [`tree`] — the recursion tree of finished elections

pub mod parsing;
pub mod partition;
pub mod ranking;
pub mod schulze;
pub mod strategy;
pub mod tree;
