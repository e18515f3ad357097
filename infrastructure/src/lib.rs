//! Infrastructure layer for plenum
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the HTTP streaming model gateway and configuration
//! file loading.

pub mod config;
pub mod gateway;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use gateway::HttpModelGateway;
