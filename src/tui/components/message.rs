use chrono::Local;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::core::state::{Message, Role};
use crate::tui::component::Component;
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// Shown after the revealed prefix while an answer is still typing out.
pub const REVEAL_CURSOR: &str = "▌";
pub const COPY_HINT: &str = "Ctrl+Y copy";
pub const COPIED_ACK: &str = "✓ Copied";

/// A single chat bubble.
///
/// Transient: built each frame by `MessageList` from the persistent
/// conversation plus the presentation state that lives in `TuiState`
/// (how much of the answer is revealed, whether the source list is open,
/// whether a copy was just acknowledged).
///
/// User text is shown exactly as typed. Agent text is the revealed prefix
/// rendered as markdown, followed by the source disclosure when the answer
/// cited anything.
#[derive(Clone, Copy)]
pub struct MessageBubble<'a> {
    pub message: &'a Message,
    /// The part of `message.text` to draw. Equal to the full text for user
    /// messages and for answers that finished revealing.
    pub visible: &'a str,
    pub revealing: bool,
    pub sources_expanded: bool,
    pub is_selected: bool,
    pub is_hovered: bool,
    pub copied: bool,
}

impl<'a> MessageBubble<'a> {
    /// A bubble showing all of `message` with no presentation flags set.
    pub fn new(message: &'a Message) -> Self {
        Self {
            message,
            visible: &message.text,
            revealing: false,
            sources_expanded: false,
            is_selected: false,
            is_hovered: false,
            copied: false,
        }
    }

    fn base_style(&self) -> Style {
        match self.message.role {
            Role::User => Style::default().fg(Color::Green),
            Role::Agent => Style::default().fg(Color::Blue),
        }
    }

    fn body(&self) -> Text<'static> {
        let base = self.base_style();
        let mut text = match self.message.role {
            Role::User => Text::styled(self.visible.to_string(), base),
            Role::Agent => markdown::render(self.visible, base.fg.unwrap_or(Color::Reset)),
        };

        if self.revealing {
            let cursor = Span::styled(REVEAL_CURSOR, base.add_modifier(Modifier::SLOW_BLINK));
            match text.lines.last_mut() {
                Some(line) => line.push_span(cursor),
                None => text.lines.push(Line::from(cursor)),
            }
        }

        // Sources appear once the answer itself is fully on screen.
        if self.message.has_sources() && !self.revealing {
            text.lines.extend(self.source_lines());
        }
        text
    }

    fn source_lines(&self) -> Vec<Line<'static>> {
        let sources = &self.message.sources;
        let toggle = Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD);

        let mut lines = vec![Line::default()];
        if !self.sources_expanded {
            lines.push(Line::from(Span::styled(
                format!("▸ Sources ({})", sources.len()),
                toggle,
            )));
            return lines;
        }

        lines.push(Line::from(Span::styled(
            format!("▾ Sources ({})", sources.len()),
            toggle,
        )));
        for (i, source) in sources.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    source.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                format!("   {}", source.url),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            )));
        }
        lines
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.body()).wrap(Wrap { trim: false })
    }

    /// Rows this bubble needs at `width`, borders included.
    ///
    /// Measured with the same `Paragraph` that `render` draws, so the layout
    /// cache and the real output never disagree.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            // Terminal too narrow for borders + padding.
            return 1;
        }
        let lines = self.paragraph().line_count(content_width);
        let lines = u16::try_from(lines).unwrap_or(u16::MAX - VERTICAL_OVERHEAD);
        lines.max(1) + VERTICAL_OVERHEAD
    }

    fn title(&self) -> Line<'static> {
        let who = match self.message.role {
            Role::User => "you",
            Role::Agent => "recuri",
        };
        let at = self.message.created_at.with_timezone(&Local).format("%H:%M");
        Line::from(format!(" {} · {} ", who, at))
    }

    fn copy_title(&self) -> Option<Line<'static>> {
        if self.message.role != Role::Agent {
            return None;
        }
        let line = if self.copied {
            Line::from(Span::styled(
                format!(" {} ", COPIED_ACK),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ))
        } else {
            Line::from(Span::styled(
                format!(" {} ", COPY_HINT),
                Style::default().fg(Color::DarkGray),
            ))
        };
        Some(line.right_aligned())
    }
}

impl Widget for MessageBubble<'_> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = self.base_style();

        // Selection overrides hover: cyan border for selected, bright for hover, dim otherwise
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else if self.is_hovered {
            style
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let mut block = Block::bordered()
            .title(self.title())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        if let Some(copy) = self.copy_title() {
            block = block.title(copy);
        }

        let inner_area = block.inner(area);
        block.render(area, buf);
        self.paragraph().style(style).render(inner_area, buf);
    }
}

impl Component for MessageBubble<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Source;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(bubble: MessageBubble<'_>, width: u16) -> String {
        let height = bubble.calculate_height(width);
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| f.render_widget(bubble, f.area())).unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn cited_answer() -> Message {
        Message::agent(
            "Paris.",
            vec![Source {
                title: "A".into(),
                url: "http://a".into(),
            }],
        )
    }

    #[test]
    fn zero_width_returns_minimum() {
        let message = Message::user("Hello world");
        assert_eq!(MessageBubble::new(&message).calculate_height(0), 1);
        assert_eq!(
            MessageBubble::new(&message).calculate_height(HORIZONTAL_OVERHEAD),
            1
        );
    }

    #[test]
    fn single_line_fits() {
        let message = Message::user("Hello");
        assert_eq!(
            MessageBubble::new(&message).calculate_height(80),
            1 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn wraps_at_width_boundary() {
        let message = Message::user("Hello world");
        // content width 5: "Hello" | "world"
        assert_eq!(
            MessageBubble::new(&message).calculate_height(9),
            2 + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn user_text_is_not_markdown() {
        let message = Message::user("**not bold**");
        let screen = draw(MessageBubble::new(&message), 40);
        assert!(screen.contains("**not bold**"));
        assert!(screen.contains("you"));
        assert!(!screen.contains(COPY_HINT));
    }

    #[test]
    fn agent_text_is_markdown() {
        let message = Message::agent("**bold**", Vec::new());
        let screen = draw(MessageBubble::new(&message), 40);
        assert!(screen.contains("bold"));
        assert!(!screen.contains("**"));
        assert!(screen.contains(COPY_HINT));
    }

    #[test]
    fn revealing_shows_prefix_and_cursor_without_sources() {
        let message = cited_answer();
        let bubble = MessageBubble {
            visible: "Par",
            revealing: true,
            ..MessageBubble::new(&message)
        };
        let screen = draw(bubble, 40);
        assert!(screen.contains(&format!("Par{}", REVEAL_CURSOR)));
        assert!(!screen.contains("Paris."));
        assert!(!screen.contains("Sources"));
    }

    #[test]
    fn sources_collapsed_then_expanded() {
        let message = cited_answer();

        let collapsed = draw(MessageBubble::new(&message), 40);
        assert!(collapsed.contains("▸ Sources (1)"));
        assert!(!collapsed.contains("http://a"));

        let expanded_bubble = MessageBubble {
            sources_expanded: true,
            ..MessageBubble::new(&message)
        };
        let expanded = draw(expanded_bubble, 40);
        assert!(expanded.contains("▾ Sources (1)"));
        assert!(expanded.contains("1. A"));
        assert!(expanded.contains("http://a"));
        assert!(
            expanded_bubble.calculate_height(40) > MessageBubble::new(&message).calculate_height(40)
        );
    }

    #[test]
    fn no_sources_no_disclosure() {
        let message = Message::agent("Paris.", Vec::new());
        let screen = draw(MessageBubble::new(&message), 40);
        assert!(!screen.contains("Sources"));
    }

    #[test]
    fn copied_ack_replaces_hint() {
        let message = Message::agent("Paris.", Vec::new());
        let bubble = MessageBubble {
            copied: true,
            ..MessageBubble::new(&message)
        };
        let screen = draw(bubble, 40);
        assert!(screen.contains(COPIED_ACK));
        assert!(!screen.contains(COPY_HINT));
    }

    #[test]
    fn empty_reveal_still_has_a_row() {
        let message = Message::agent("Paris.", Vec::new());
        let bubble = MessageBubble {
            visible: "",
            revealing: true,
            ..MessageBubble::new(&message)
        };
        assert_eq!(bubble.calculate_height(40), 1 + VERTICAL_OVERHEAD);
    }
}
