//! # API Proxy
//!
//! Stateless pass-through in front of the research backend, so browsers
//! and other clients can talk to one origin. Every reply is the same JSON
//! envelope, `{"result": ...}`.
//!
//! ## Endpoints
//!
//! - `POST /api/query`: forward `{query}` to the backend
//! - `GET /api/health`: liveness for uptime checks and keepalive pings
//!
//! ## Status mapping
//!
//! | Situation                               | Status | `result`                            |
//! |-----------------------------------------|--------|-------------------------------------|
//! | `query` missing, not a string, or empty | 400    | `Invalid query.`                    |
//! | backend answered non-2xx                | 500    | `Backend error. Please try again.`  |
//! | anything else went wrong                | 500    | `Internal error. Please try again.` |
//! | backend answered 2xx                    | 200    | backend's `result`                  |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::backend::QueryBackend;

pub const INVALID_QUERY: &str = "Invalid query.";
pub const BACKEND_ERROR: &str = "Backend error. Please try again.";
pub const INTERNAL_ERROR: &str = "Internal error. Please try again.";

/// The uniform response envelope.
///
/// `result` is omitted when the backend succeeded without one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProxyReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ProxyReply {
    fn message(text: &str) -> Self {
        Self {
            result: Some(text.to_string()),
        }
    }
}

#[derive(Clone)]
struct ProxyState {
    backend: Arc<dyn QueryBackend>,
}

/// Builds the proxy routes around `backend`.
pub fn router(backend: Arc<dyn QueryBackend>) -> Router {
    Router::new()
        .route("/api/query", post(handle_query))
        .route("/api/health", get(handle_health))
        .with_state(ProxyState { backend })
}

async fn handle_query(
    State(state): State<ProxyState>,
    body: Bytes,
) -> (StatusCode, Json<ProxyReply>) {
    let (status, reply) = forward(state.backend.as_ref(), &body).await;
    (status, Json(reply))
}

async fn handle_health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Validates a raw request body and forwards it to `backend`.
pub async fn forward(backend: &dyn QueryBackend, body: &[u8]) -> (StatusCode, ProxyReply) {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Proxy: unreadable request body: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                ProxyReply::message(INTERNAL_ERROR),
            );
        }
    };

    let Some(query) = payload
        .get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.is_empty())
    else {
        debug!("Proxy: rejected payload without a string query");
        return (StatusCode::BAD_REQUEST, ProxyReply::message(INVALID_QUERY));
    };

    match backend.query(query).await {
        Ok(response) => {
            info!("Proxy: forwarded query ({} chars)", query.chars().count());
            (
                StatusCode::OK,
                ProxyReply {
                    result: response.result,
                },
            )
        }
        Err(err) if err.is_upstream() => {
            warn!("Proxy: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ProxyReply::message(BACKEND_ERROR),
            )
        }
        Err(err) => {
            error!("Proxy: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ProxyReply::message(INTERNAL_ERROR),
            )
        }
    }
}

/// The proxy served on a background tokio task.
pub struct ProxyServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ProxyServer {
    /// Binds `bind` (port `0` picks a free port) and starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(backend: Arc<dyn QueryBackend>, bind: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        info!("Proxy listening on http://{addr}/api/query");

        let app = router(backend);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Proxy server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ProxyServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
