use serde::{Deserialize, Serialize};

/// A cited reference the backend attaches to an answer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub title: String,
    pub url: String,
}

/// Body of `POST /api/query`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

/// Successful backend reply.
///
/// Every field is optional on the wire: a missing or empty `result` is an
/// upstream error the controller papers over with a fallback answer, and
/// `sources` only appears when the backend found citations.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
}

impl QueryResponse {
    /// The answer text, if the backend produced a non-empty one.
    /// Whitespace is still an answer and is shown as sent.
    pub fn answer(&self) -> Option<&str> {
        self.result.as_deref().filter(|r| !r.is_empty())
    }

    /// Citations in backend order (empty when none were reported).
    pub fn citations(&self) -> &[Source] {
        self.sources.as_deref().unwrap_or_default()
    }
}
