//! Streaming HTTP gateway adapter

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use plenum_application::ports::model_gateway::{
    ChunkObserver, CompletionRequest, GatewayError, ModelGateway,
};

use super::protocol::{parse_line, GenerateRequest};

/// Connection failures are retried this many times with growing pauses
/// before surfacing as `Unavailable`.
const CONNECT_ATTEMPTS: u32 = 3;
const BACKOFF: [Duration; 2] = [Duration::from_millis(250), Duration::from_millis(500)];

/// `ModelGateway` adapter for an Ollama-compatible streaming endpoint.
///
/// One instance per endpoint; sessions that use distinct generation and
/// ranking endpoints construct two.
pub struct HttpModelGateway {
    client: Client,
    url: String,
}

impl HttpModelGateway {
    pub fn new(endpoint: impl AsRef<str>) -> Self {
        Self::with_client(endpoint, Client::new())
    }

    pub fn with_client(endpoint: impl AsRef<str>, client: Client) -> Self {
        let url = format!("{}/api/generate", endpoint.as_ref().trim_end_matches('/'));
        Self { client, url }
    }

    async fn stream_once(
        &self,
        request: &CompletionRequest,
        observer: &ChunkObserver,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        let body = GenerateRequest {
            model: &request.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: true,
            options: request.sampling.into(),
        };
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::RequestFailed(format!("status {status}")));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut full_text = String::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("stream aborted by cancel signal");
                    return Err(GatewayError::Cancelled);
                }
                next = stream.next() => {
                    match next {
                        None => break,
                        Some(Err(error)) => {
                            return Err(GatewayError::StreamInterrupted(error.to_string()));
                        }
                        Some(Ok(bytes)) => {
                            buffer.push_str(&String::from_utf8_lossy(&bytes));
                            while let Some(newline) = buffer.find('\n') {
                                let line: String = buffer.drain(..=newline).collect();
                                if let Some(chunk) = parse_line(&line) {
                                    if !chunk.response.is_empty() {
                                        observer(&chunk.response);
                                        full_text.push_str(&chunk.response);
                                    }
                                    if chunk.done {
                                        return Ok(full_text);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        // Stream ended without a terminal chunk; take any buffered tail
        if let Some(chunk) = parse_line(&buffer) {
            if !chunk.response.is_empty() {
                observer(&chunk.response);
                full_text.push_str(&chunk.response);
            }
        }
        Ok(full_text)
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn complete(
        &self,
        request: CompletionRequest,
        observer: ChunkObserver,
        cancel: &CancellationToken,
    ) -> Result<String, GatewayError> {
        for attempt in 1..=CONNECT_ATTEMPTS {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }
            match self.stream_once(&request, &observer, cancel).await {
                Ok(text) => return Ok(text),
                // Connection-level failures happen before any chunk was
                // observed, so a retry cannot duplicate output
                Err(GatewayError::Unavailable(reason)) if attempt < CONNECT_ATTEMPTS => {
                    let pause = BACKOFF[(attempt - 1) as usize % BACKOFF.len()];
                    warn!(attempt, %reason, "gateway unreachable, retrying in {pause:?}");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(pause) => {}
                    }
                }
                Err(error) => return Err(error),
            }
        }
        Err(GatewayError::Unavailable(
            "retry budget exhausted".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_normalization_strips_trailing_slash() {
        let gateway = HttpModelGateway::new("http://localhost:11434/");
        assert_eq!(gateway.url, "http://localhost:11434/api/generate");
    }
}
