//! # InputBox Component
//!
//! Single-line message field at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input (typing, bracketed paste)
//! - Editing: backspace, delete, left/right, home/end
//! - Emit `Submit` on Enter when there is something to send
//! - Show the placeholder when empty and a waiting spinner while disabled
//!
//! ## State Management
//!
//! The buffer and cursor are internal state that persists in `TuiState`.
//! `disabled`, `focused` and `spinner_frame` are props refreshed by the event
//! loop each frame. While disabled the text is kept and Enter does nothing.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const PLACEHOLDER: &str = "Message Recuri...";
/// Border rows plus the single text row.
pub const INPUT_HEIGHT: u16 = 3;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed with non-blank text; the buffer has been cleared.
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    buffer: String,
    /// Byte offset of the cursor, always on a char boundary
    cursor: usize,
    /// Display column of the first visible character
    scroll: usize,
    /// A query is in flight (Prop)
    pub disabled: bool,
    /// Keystrokes go here rather than to message navigation (Prop)
    pub focused: bool,
    /// Animation frame for the waiting spinner (Prop)
    pub spinner_frame: usize,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            scroll: 0,
            disabled: false,
            focused: true,
            spinner_frame: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn insert_str(&mut self, text: &str) {
        // Single-line field: pasted line breaks become spaces
        let flat: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.buffer.insert_str(self.cursor, &flat);
        self.cursor += flat.len();
    }

    fn prev_boundary(&self) -> usize {
        self.buffer[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.buffer[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.buffer.len())
    }

    /// Keep the cursor inside a viewport `width` columns wide.
    fn update_scroll(&mut self, width: usize) {
        if width == 0 {
            self.scroll = 0;
            return;
        }
        let cursor_col = self.buffer[..self.cursor].width();
        if cursor_col < self.scroll {
            self.scroll = cursor_col;
        } else if cursor_col >= self.scroll + width {
            self.scroll = cursor_col + 1 - width;
        }
    }

    /// The slice of the buffer starting at display column `self.scroll`.
    fn visible_text(&self) -> &str {
        let mut col = 0;
        for (i, c) in self.buffer.char_indices() {
            if col >= self.scroll {
                return &self.buffer[i..];
            }
            col += c.width().unwrap_or(0);
        }
        ""
    }

    fn title(&self) -> Line<'static> {
        if self.disabled {
            let spinner = SPINNER[self.spinner_frame % SPINNER.len()];
            Line::from(Span::styled(
                format!(" {} Waiting for answer ", spinner),
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(" Message ")
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let inner_width = area.width.saturating_sub(2) as usize;
        self.update_scroll(inner_width);

        let border_style = if self.focused && !self.disabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Green).add_modifier(Modifier::DIM)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(self.title());

        let content = if self.buffer.is_empty() {
            Line::from(Span::styled(
                PLACEHOLDER,
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ))
        } else {
            let style = if self.disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            };
            Line::from(Span::styled(self.visible_text().to_string(), style))
        };
        frame.render_widget(Paragraph::new(content).block(block), area);

        if self.focused && !self.disabled && area.width > 2 && area.height > 2 {
            let cursor_col = self.buffer[..self.cursor].width().saturating_sub(self.scroll);
            let x = area.x + 1 + (cursor_col as u16).min(area.width - 3);
            frame.set_cursor_position((x, area.y + 1));
        }
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.cursor, *c);
                self.cursor += c.len_utf8();
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.insert_str(text);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.cursor > 0).then(|| {
                let prev = self.prev_boundary();
                self.buffer.drain(prev..self.cursor);
                self.cursor = prev;
                InputEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.cursor < self.buffer.len()).then(|| {
                let next = self.next_boundary();
                self.buffer.drain(self.cursor..next);
                InputEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => {
                self.cursor = self.prev_boundary();
                None
            }
            TuiEvent::CursorRight => {
                self.cursor = self.next_boundary();
                None
            }
            TuiEvent::Home => {
                self.cursor = 0;
                None
            }
            TuiEvent::ScrollToBottom => {
                self.cursor = self.buffer.len();
                None
            }
            TuiEvent::Submit => {
                if self.disabled || self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.cursor = 0;
                self.scroll = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> InputBox {
        let mut input = InputBox::new();
        for c in text.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
        input
    }

    fn draw(input: &mut InputBox, width: u16) -> (String, Terminal<TestBackend>) {
        let mut terminal = Terminal::new(TestBackend::new(width, INPUT_HEIGHT)).unwrap();
        terminal.draw(|f| input.render(f, f.area())).unwrap();
        let text = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        (text, terminal)
    }

    #[test]
    fn typing_and_backspace() {
        let mut input = typed("ab");
        assert_eq!(input.text(), "ab");
        assert_eq!(
            input.handle_event(&TuiEvent::Backspace),
            Some(InputEvent::ContentChanged)
        );
        assert_eq!(input.text(), "a");
    }

    #[test]
    fn editing_respects_multibyte_boundaries() {
        let mut input = typed("héllo");
        input.handle_event(&TuiEvent::Home);
        input.handle_event(&TuiEvent::CursorRight);
        input.handle_event(&TuiEvent::CursorRight);
        assert_eq!(input.cursor(), "hé".len());
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.text(), "hllo");
        input.handle_event(&TuiEvent::Delete);
        assert_eq!(input.text(), "hlo");
        input.handle_event(&TuiEvent::ScrollToBottom);
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn edits_at_the_edges_are_noops() {
        let mut input = InputBox::new();
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
        assert_eq!(input.handle_event(&TuiEvent::Delete), None);
        input.handle_event(&TuiEvent::CursorLeft);
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut input = typed("a");
        input.handle_event(&TuiEvent::Paste("b\nc\r\nd".into()));
        assert_eq!(input.text(), "ab c  d");
    }

    #[test]
    fn submit_clears_buffer() {
        let mut input = typed("hello");
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit("hello".into()))
        );
        assert!(input.text().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn blank_submit_is_ignored_and_keeps_text() {
        let mut input = typed("   ");
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.text(), "   ");
    }

    #[test]
    fn disabled_submit_keeps_text() {
        let mut input = typed("next question");
        input.disabled = true;
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
        assert_eq!(input.text(), "next question");
    }

    #[test]
    fn placeholder_when_empty() {
        let mut input = InputBox::new();
        let (text, _) = draw(&mut input, 40);
        assert!(text.contains(PLACEHOLDER));
    }

    #[test]
    fn disabled_shows_waiting_title() {
        let mut input = typed("draft");
        input.disabled = true;
        let (text, _) = draw(&mut input, 40);
        assert!(text.contains("Waiting for answer"));
        assert!(text.contains("draft"));
    }

    #[test]
    fn long_input_scrolls_to_keep_cursor_visible() {
        let mut input = typed("abcdefghijklmnopqrstuvwxyz");
        let (text, mut terminal) = draw(&mut input, 12);
        // 10 inner columns: the tail of the text stays visible
        assert!(text.contains("rstuvwxyz"));
        assert!(!text.contains("abc"));
        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.y, 1);
        assert!(cursor.x <= 10);
    }
}
