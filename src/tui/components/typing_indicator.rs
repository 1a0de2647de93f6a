use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

pub const INDICATOR_LABEL: &str = "AI is thinking";
/// One blank spacer row above the label.
pub const INDICATOR_HEIGHT: u16 = 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// "AI is thinking" with a spinner and dots that fill up over time.
/// Drawn under the last bubble while a query is in flight.
pub struct TypingIndicator {
    frame: usize,
}

impl TypingIndicator {
    pub fn new(frame: usize) -> Self {
        Self { frame }
    }

    fn dots(&self) -> String {
        // Dots advance at a third of the spinner rate: "", ".", "..", "..."
        let n = (self.frame / 3) % 4;
        format!("{:<3}", ".".repeat(n))
    }
}

impl Widget for TypingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }
        let spinner = SPINNER[self.frame % SPINNER.len()];
        let style = Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC);
        let line = Line::from(vec![
            Span::styled(format!(" {} ", spinner), Style::default().fg(Color::Blue)),
            Span::styled(format!("{}{}", INDICATOR_LABEL, self.dots()), style),
        ]);
        let row = Rect {
            y: area.y + area.height - 1,
            height: 1,
            ..area
        };
        Paragraph::new(line).render(row, buf);
    }
}
