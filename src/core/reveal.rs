//! # Incremental Text Reveal
//!
//! `StreamingText` reveals a complete string one character at a time to
//! simulate live generation. It is a cooperative state machine: it owns no
//! timer. The event loop asks [`StreamingText::next_due`] when to wake up
//! and calls [`StreamingText::poll`] with the current instant.
//!
//! ```text
//!   new(text) ──► revealed = 0
//!        │
//!        ▼  poll(now ≥ due)            one char per tick,
//!   Advanced { revealed: 1..=N }  ◄──  next tick at now + interval
//!        │
//!        ▼  poll() after the Nth tick
//!   Completed                          exactly once
//!        │
//!        ▼
//!   None forever (until set_text with different text)
//! ```
//!
//! Replacing the text restarts from zero against the new text. Dropping the
//! value is cancellation: nothing is scheduled anywhere else.

use std::time::{Duration, Instant};

/// Default delay between two revealed characters.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30);
/// Intervals below this are clamped up to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Observable progress from one call to [`StreamingText::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// One more character is visible; `revealed` is the new prefix length.
    Advanced { revealed: usize },
    /// The whole text is visible. Fires once per text.
    Completed,
}

#[derive(Debug, Clone)]
pub struct StreamingText {
    text: String,
    char_count: usize,
    /// Revealed prefix length in chars.
    revealed: usize,
    /// Byte offset of the end of the revealed prefix.
    revealed_bytes: usize,
    interval: Duration,
    due: Instant,
    completion_fired: bool,
}

impl StreamingText {
    /// Starts revealing `text`; the first character appears one interval
    /// after `now`.
    pub fn new(text: impl Into<String>, interval: Duration, now: Instant) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let text = text.into();
        Self {
            char_count: text.chars().count(),
            text,
            revealed: 0,
            revealed_bytes: 0,
            interval,
            due: now + interval,
            completion_fired: false,
        }
    }

    /// Advances at most one step. Returns `None` when nothing is due.
    pub fn poll(&mut self, now: Instant) -> Option<RevealEvent> {
        if self.completion_fired {
            return None;
        }
        if self.revealed == self.char_count {
            self.completion_fired = true;
            return Some(RevealEvent::Completed);
        }
        if now < self.due {
            return None;
        }

        let step = self.text[self.revealed_bytes..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        self.revealed_bytes += step;
        self.revealed += 1;
        self.due = now + self.interval;
        Some(RevealEvent::Advanced {
            revealed: self.revealed,
        })
    }

    /// When the event loop should next call [`poll`](Self::poll).
    ///
    /// Once every character is out, the pending completion is due
    /// immediately. `None` after completion has fired.
    pub fn next_due(&self) -> Option<Instant> {
        if self.completion_fired {
            None
        } else if self.revealed == self.char_count {
            Some(self.due.min(Instant::now()))
        } else {
            Some(self.due)
        }
    }

    /// Replaces the source text. Different text resets the reveal to zero;
    /// identical text changes nothing.
    pub fn set_text(&mut self, text: &str, now: Instant) {
        if text == self.text {
            return;
        }
        self.text = text.to_string();
        self.char_count = self.text.chars().count();
        self.revealed = 0;
        self.revealed_bytes = 0;
        self.due = now + self.interval;
        self.completion_fired = false;
    }

    /// Reveals the rest of the text at once. Completion fires on the next poll.
    pub fn finish(&mut self) {
        self.revealed = self.char_count;
        self.revealed_bytes = self.text.len();
    }

    /// The revealed prefix. Always ends on a char boundary.
    pub fn visible(&self) -> &str {
        &self.text[..self.revealed_bytes]
    }

    /// True while characters remain hidden.
    pub fn is_revealing(&self) -> bool {
        self.revealed < self.char_count
    }

    /// True once completion has been reported.
    pub fn is_complete(&self) -> bool {
        self.completion_fired
    }
}
