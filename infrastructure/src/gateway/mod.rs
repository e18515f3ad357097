//! HTTP model gateway
//!
//! Implements the application's `ModelGateway` port against a streaming
//! generate endpoint: one POST per completion, newline-delimited JSON
//! chunks back, cancellation at chunk boundaries.

mod client;
mod protocol;

pub use client::HttpModelGateway;
