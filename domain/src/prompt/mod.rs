//! Prompt domain
//!
//! Templates and formatting for the two model tasks: candidate generation
//! and ranking prediction.

pub mod template;

pub use template::{ranking_system_prompt, PromptTemplates, TemplateError};
