//! Wire types for the streaming generate protocol
//!
//! Request: JSON body `{model, prompt, system?, stream: true, options}`.
//! Response: a stream of newline-delimited JSON objects, each carrying a
//! `response` text fragment, terminated by one with `"done": true`.
//! Concatenating the fragments yields the full completion.

use plenum_domain::SamplingParams;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize)]
pub(super) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    pub stream: bool,
    pub options: SamplingOptions,
}

/// Sampling knobs; unset fields are omitted from the body so the server
/// keeps its own defaults (ranking calls send only a temperature).
#[derive(Debug, Serialize, PartialEq)]
pub(super) struct SamplingOptions {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

impl From<SamplingParams> for SamplingOptions {
    fn from(params: SamplingParams) -> Self {
        Self {
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
        }
    }
}

/// One line of the response stream
#[derive(Debug, Default, Deserialize, PartialEq)]
pub(super) struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

/// Parse one stream line. Blank lines are skipped silently; malformed
/// lines are logged and skipped, matching the tolerant reader the
/// protocol expects.
pub(super) fn parse_line(line: &str) -> Option<GenerateChunk> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(chunk) => Some(chunk),
        Err(error) => {
            warn!(%error, "skipping malformed stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let request = GenerateRequest {
            model: "llama3.1",
            prompt: "hello",
            system: None,
            stream: true,
            options: SamplingParams::generation().into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.1");
        assert_eq!(json["stream"], true);
        assert_eq!(json["options"]["temperature"], 0.7);
        assert!(json.get("system").is_none());
    }

    #[test]
    fn ranking_options_omit_unset_fields() {
        let options: SamplingOptions = SamplingParams::ranking().into();
        let json = serde_json::to_value(&options).unwrap();
        assert!(json.get("top_p").is_none());
        assert!(json.get("top_k").is_none());
    }

    #[test]
    fn parses_text_chunk() {
        let chunk = parse_line(r#"{"response": "Hello", "done": false}"#).unwrap();
        assert_eq!(chunk.response, "Hello");
        assert!(!chunk.done);
    }

    #[test]
    fn parses_terminal_chunk_without_text() {
        let chunk = parse_line(r#"{"done": true}"#).unwrap();
        assert_eq!(chunk.response, "");
        assert!(chunk.done);
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("not json"), None);
    }

    #[test]
    fn tolerates_extra_fields() {
        let chunk =
            parse_line(r#"{"model": "m", "response": "x", "done": false, "eval_count": 3}"#)
                .unwrap();
        assert_eq!(chunk.response, "x");
    }
}
