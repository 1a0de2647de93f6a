//! # Actions
//!
//! Everything that can happen in Recuri becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ResponseReceived(response)`.
//!
//! `update()` takes the current state and an action, mutates the state,
//! and returns an `Effect` describing the I/O the adapter must perform.
//! No side effects here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::backend::{BackendError, QueryResponse};
use crate::core::state::{App, Phase};

/// Shown when the backend answered but had nothing to say.
pub const NO_ANSWER: &str = "Sorry, I couldn't find an answer.";
/// Shown when the request failed (transport error or non-2xx status).
pub const CONNECTIVITY_ERROR: &str = "❌ Error: Could not reach backend API.";

#[derive(Debug)]
pub enum Action {
    /// The user pressed Enter with this input.
    Submit(String),
    /// The single in-flight request came back with a body.
    ResponseReceived(QueryResponse),
    /// The single in-flight request failed.
    RequestFailed(BackendError),
    Quit,
}

impl Action {
    /// Maps the outcome of one backend call to exactly one action.
    pub fn from_outcome(outcome: Result<QueryResponse, BackendError>) -> Self {
        match outcome {
            Ok(response) => Action::ResponseReceived(response),
            Err(err) => Action::RequestFailed(err),
        }
    }
}

/// I/O the adapter must perform after an update.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Issue one backend request for this query.
    SpawnRequest(String),
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            if text.trim().is_empty() {
                return Effect::None;
            }
            if app.phase == Phase::AwaitingResponse {
                debug!("Submit ignored: a request is already in flight");
                return Effect::None;
            }
            app.conversation.push_user(text.clone());
            app.phase = Phase::AwaitingResponse;
            app.status_message = String::from("Searching...");
            info!("Query submitted ({} chars)", text.chars().count());
            Effect::SpawnRequest(text)
        }
        Action::ResponseReceived(response) => {
            if app.phase != Phase::AwaitingResponse {
                warn!("Dropping stale backend response");
                return Effect::None;
            }
            let text = response.answer().unwrap_or(NO_ANSWER).to_string();
            let sources = response.sources.unwrap_or_default();
            info!(
                "Answer received ({} chars, {} sources)",
                text.chars().count(),
                sources.len()
            );
            app.conversation.push_agent(text, sources);
            app.phase = Phase::Idle;
            app.status_message = String::from("Ready");
            Effect::None
        }
        Action::RequestFailed(err) => {
            if app.phase != Phase::AwaitingResponse {
                warn!("Dropping stale backend failure: {}", err);
                return Effect::None;
            }
            warn!("Query failed: {}", err);
            app.conversation.push_agent(CONNECTIVITY_ERROR, Vec::new());
            app.phase = Phase::Idle;
            app.status_message = err.to_string();
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}
