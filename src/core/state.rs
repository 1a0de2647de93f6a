//! # Application State
//!
//! Core business state for Recuri. Domain logic only, no TUI types.
//! Presentation state (scroll offsets, reveal progress, clipboard
//! acknowledgments) lives in the `tui` module.
//!
//! ```text
//! App
//! ├── backend: Arc<dyn QueryBackend>   // where queries go
//! ├── conversation: Conversation       // append-only message list
//! ├── phase: Phase                     // Idle | AwaitingResponse
//! └── status_message: String           // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{QueryBackend, Source};

pub const DEFAULT_GREETING: &str =
    "👋 Hi! Ask me anything and I'll search the web, summarize, and answer you.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Agent,
}

/// One conversation turn. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Stable identity; a bubble's reveal state is keyed by it.
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Citations in backend order. Empty for user messages.
    pub sources: Vec<Source>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into(), Vec::new())
    }

    pub fn agent(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self::new(Role::Agent, text.into(), sources)
    }

    fn new(role: Role, text: String, sources: Vec<Source>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text,
            sources,
            created_at: Utc::now(),
        }
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }
}

/// Ordered, append-only message list (oldest first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation that opens with an agent greeting.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut conversation = Self::new();
        conversation.push(Message::agent(greeting, Vec::new()));
        conversation
    }

    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &Message {
        self.push(Message::user(text))
    }

    pub fn push_agent(&mut self, text: impl Into<String>, sources: Vec<Source>) -> &Message {
        self.push(Message::agent(text, sources))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Index of the newest agent message.
    pub fn last_agent_index(&self) -> Option<usize> {
        self.messages.iter().rposition(|m| m.role == Role::Agent)
    }
}

/// Conversation controller phase. `AwaitingResponse` is the only
/// mutual exclusion there is: at most one backend request per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
}

pub struct App {
    pub backend: Arc<dyn QueryBackend>,
    pub conversation: Conversation,
    pub phase: Phase,
    pub status_message: String,
}

impl App {
    pub fn new(backend: Arc<dyn QueryBackend>, greeting: Option<&str>) -> Self {
        let conversation = match greeting {
            Some(text) if !text.trim().is_empty() => Conversation::with_greeting(text),
            _ => Conversation::new(),
        };
        Self {
            backend,
            conversation,
            phase: Phase::Idle,
            status_message: String::from("Ready"),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }
}
