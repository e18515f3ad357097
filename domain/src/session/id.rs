//! Session identifier

use serde::Serialize;

/// Wall-clock session identifier, unique for serially run sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionId(String);

impl SessionId {
    /// A millisecond-precision timestamp id like `20260802T143000123`
    pub fn now() -> Self {
        Self(chrono::Utc::now().format("%Y%m%dT%H%M%S%3f").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_timestamp_shape() {
        let id = SessionId::now();
        assert_eq!(id.as_str().len(), "20260802T143000123".len());
        assert!(id.as_str().contains('T'));
    }
}
