//! Error types for the chainpools pipeline.

use thiserror::Error;

/// Errors that can occur while fetching, transcoding or persisting pools.
#[derive(Debug, Error)]
pub enum PoolsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No subgraph endpoint for chain {chain_id}, version {version}")]
    UnsupportedTarget { chain_id: u64, version: u8 },

    #[error("Schema version {0} is not supported")]
    UnsupportedVersion(u8),

    #[error("Unknown network for chain id {0}")]
    UnknownNetwork(u64),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status other than 429.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limit exceeded (endpoint: {endpoint})")]
    RateLimited { endpoint: String },

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Corrupt checkpoint row {row}: {reason}")]
    CorruptRow { row: usize, reason: String },

    #[error("Cursor stalled at block {block}: a full page of {page_size} already-seen pools")]
    CursorStalled { block: u64, page_size: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PoolsError {
    /// Returns `true` for errors raised before any request is made.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedTarget { .. }
                | Self::UnsupportedVersion(_)
                | Self::UnknownNetwork(_)
        )
    }

    /// Returns `true` if the transport may retry the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } | Self::Timeout { .. } => true,
            // Client errors (bad key, bad query) will not heal on retry.
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(PoolsError::UnsupportedTarget { chain_id: 1, version: 4 }.is_config());
        assert!(!PoolsError::UnsupportedTarget { chain_id: 1, version: 4 }.is_retryable());
        assert!(PoolsError::Timeout { ms: 30_000 }.is_retryable());
        assert!(!PoolsError::Graphql("bad filter".into()).is_retryable());
        assert!(!PoolsError::CursorStalled { block: 1, page_size: 2 }.is_config());
    }

    #[test]
    fn only_server_side_statuses_are_retryable() {
        let status = |status| PoolsError::HttpStatus { status, body: String::new() };
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(403).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }
}
