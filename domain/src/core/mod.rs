//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`] — a validated deliberation question
//! - [`participant::Participant`] — an opinion with a stable position
//! - [`sampling::SamplingParams`] — model sampling knobs

pub mod participant;
pub mod question;
pub mod sampling;
