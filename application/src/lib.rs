//! Application layer for plenum
//!
//! This crate contains use cases, port definitions, and engine
//! configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, GenerationSettings, RankingSettings};
pub use ports::{
    event_sink::{CollectingSink, EventSink, NullSink},
    model_gateway::{ChunkObserver, CompletionRequest, GatewayError, ModelGateway},
};
pub use use_cases::deliberate::{
    DeliberateInput, DeliberateUseCase, DeliberationError, DeliberationResult, ResultKind,
};
