//! Model gateway port
//!
//! Defines the interface for streaming completions from a language model
//! endpoint. Implementations (adapters) live in the infrastructure layer.

use std::sync::Arc;

use async_trait::async_trait;
use plenum_domain::SamplingParams;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure after the adapter's bounded retries
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The session cancel signal was observed mid-call
    #[error("cancelled")]
    Cancelled,
}

/// Callback invoked for each streamed text chunk as it arrives
pub type ChunkObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// One completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub system: Option<String>,
    pub sampling: SamplingParams,
}

/// Gateway for streaming model completions
///
/// The contract is minimal on purpose: one logical operation plus
/// cancellation. Concatenating the observed chunks yields exactly the
/// returned completion; on cancellation the stream aborts at the next
/// chunk boundary and the call returns [`GatewayError::Cancelled`].
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        observer: ChunkObserver,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError>;
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}
