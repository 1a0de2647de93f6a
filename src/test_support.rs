//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::backend::{BackendError, QueryBackend, QueryResponse};

/// A backend that answers every query with a canned outcome and counts calls.
pub struct StubBackend {
    outcome: fn() -> Result<QueryResponse, BackendError>,
    pub calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(outcome: fn() -> Result<QueryResponse, BackendError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn query(&self, _query: &str) -> Result<QueryResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.outcome)()
    }
}

fn empty_answer() -> Result<QueryResponse, BackendError> {
    Ok(QueryResponse::default())
}

/// Creates a test App with an empty conversation and a stub backend.
pub fn test_app() -> crate::core::state::App {
    crate::core::state::App::new(Arc::new(StubBackend::new(empty_answer)), None)
}
