use std::fmt;

use async_trait::async_trait;

use super::types::QueryResponse;

/// Errors that can occur while talking to the research backend.
#[derive(Debug)]
pub enum BackendError {
    /// Backend misconfigured (unparseable base URL).
    Config(String),
    /// Network-level failure (DNS, connection refused, reset).
    Network(String),
    /// Backend answered with a non-success HTTP status.
    Api { status: u16, message: String },
    /// Backend answered 2xx but the body was not the expected JSON.
    Parse(String),
}

impl BackendError {
    /// True when the backend was reachable but rejected the request.
    pub fn is_upstream(&self) -> bool {
        matches!(self, BackendError::Api { .. })
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "config error: {msg}"),
            BackendError::Network(msg) => write!(f, "network error: {msg}"),
            BackendError::Api { status, message } => {
                write!(f, "backend error (HTTP {status}): {message}")
            }
            BackendError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Short label for the status bar and logs.
    fn name(&self) -> &str;

    /// Issues exactly one query. Implementations must not retry.
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError>;
}
