//! # Backend Contract
//!
//! The research backend is an external service. Recuri only knows its
//! HTTP contract: `POST <base>/api/query` with `{query}` returns
//! `{result, sources?}`. Everything that consumes the backend (the chat
//! controller and the API proxy) goes through the [`QueryBackend`] trait.

pub mod client;
pub mod http;
pub mod types;

pub use client::{BackendError, QueryBackend};
pub use http::HttpBackend;
pub use types::{QueryRequest, QueryResponse, Source};
