//! # Core Application Logic
//!
//! This module contains Recuri's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (conversation) │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • reveal (text timing) │
//!                    │                         │
//!                    │  No I/O. No UI.         │
//!                    └───────────┬─────────────┘
//!                                │
//!                ┌───────────────┴───────────────┐
//!                ▼                               ▼
//!         ┌────────────┐                  ┌────────────┐
//!         │    TUI     │                  │   Proxy    │
//!         │  Adapter   │                  │  (axum)    │
//!         │ (ratatui)  │                  │            │
//!         └────────────┘                  └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: `App`, `Conversation`, `Message`: all controller state in one place
//! - [`action`]: The `Action` enum and the `update()` reducer
//! - [`reveal`]: `StreamingText`, the character-by-character reveal clock
//! - [`config`]: Layered configuration

pub mod action;
pub mod config;
pub mod reveal;
pub mod state;
