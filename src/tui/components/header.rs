//! # Header Component
//!
//! Top bar: product name, tagline, which backend we're talking to, the
//! controller's status text, and a "↓ New" marker when an answer arrived
//! below the current scroll position.
//!
//! ```text
//! Recuri · localhost:8000 | Searching...                         ↓ New
//! Intelligent web research that remembers, learns, and delivers ...
//! ─────────────────────────────────────────────────────────────────────
//! ```
//!
//! Purely presentational: every field is a prop.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::tui::component::Component;

pub const PRODUCT_NAME: &str = "Recuri";
pub const TAGLINE: &str =
    "Intelligent web research that remembers, learns, and delivers precise answers instantly.";

/// Rows the header occupies (two text lines plus the rule).
pub const HEADER_HEIGHT: u16 = 3;

pub struct Header<'a> {
    pub backend_label: &'a str,
    pub status_message: &'a str,
    pub has_unseen_content: bool,
}

impl<'a> Header<'a> {
    pub fn new(backend_label: &'a str, status_message: &'a str, has_unseen_content: bool) -> Self {
        Self {
            backend_label,
            status_message,
            has_unseen_content,
        }
    }
}

impl Component for Header<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let dim = Style::default().fg(Color::DarkGray);

        let mut spans = vec![
            Span::styled(
                PRODUCT_NAME,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" · {}", self.backend_label), dim),
        ];
        if !self.status_message.is_empty() {
            spans.push(Span::styled(" | ", dim));
            spans.push(Span::raw(self.status_message.to_string()));
        }

        let block = Block::new().borders(Borders::BOTTOM).border_style(dim);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = vec![
            Line::from(spans),
            Line::from(Span::styled(TAGLINE, dim.add_modifier(Modifier::ITALIC))),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        if self.has_unseen_content {
            let marker = Paragraph::new(Span::styled(
                "↓ New",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right);
            frame.render_widget(marker, Rect { height: 1, ..inner });
        }
    }
}
