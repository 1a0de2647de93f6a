//! # How It Works Drawer
//!
//! Left-hand overlay (F1) explaining what happens to a question after Enter.
//! The body is markdown so it goes through the same renderer as answers.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::markdown;

pub const DRAWER_TITLE: &str = " How it works ";

pub const HOW_IT_WORKS: &str = "\
## From question to answer

1. **You ask.** Your message is sent as `{\"query\": ...}` to the research \
backend's `/api/query` endpoint.
2. **Memory first.** The backend checks whether it has answered something \
close to this before and reuses that research when it has.
3. **Web research.** Otherwise it searches the web, reads the most relevant \
pages and extracts the useful passages.
4. **Summary.** The passages are condensed into one answer, written in \
markdown.
5. **Answer.** The reply comes back with the pages it relied on. Open the \
**Sources** list under an answer to see them.

## Keys

| Key | Action |
|-----|--------|
| Enter | send / toggle sources |
| Esc | browse messages |
| ↑ ↓ | move between messages |
| 1-9 | open a source |
| Ctrl+Y | copy an answer |
| End | show the full answer |
| F1 | close this panel |
| Ctrl+C | quit |

> Nothing is stored on this machine. Closing Recuri ends the conversation.
";

/// Drawer width as a share of the screen, with a floor for narrow terminals.
const WIDTH_PERCENT: u16 = 45;
const MIN_WIDTH: u16 = 32;

/// High-level events emitted by the drawer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerEvent {
    Close,
}

#[derive(Debug, Default)]
pub struct HowItWorksState {
    pub scroll: u16,
    /// Maximum scroll measured at the last render
    max_scroll: u16,
    page: u16,
}

impl HowItWorksState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rectangle the drawer covers inside `screen`.
    pub fn area(screen: Rect) -> Rect {
        let share = u32::from(screen.width) * u32::from(WIDTH_PERCENT) / 100;
        let width = u16::try_from(share)
            .unwrap_or(u16::MAX)
            .max(MIN_WIDTH)
            .min(screen.width);
        Rect { width, ..screen }
    }
}

impl EventHandler for HowItWorksState {
    type Event = DrawerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::Escape | TuiEvent::ToggleHelp => return Some(DrawerEvent::Close),
            TuiEvent::ScrollUp | TuiEvent::CursorUp => {
                self.scroll = self.scroll.saturating_sub(1);
            }
            TuiEvent::ScrollDown | TuiEvent::CursorDown => {
                self.scroll = (self.scroll + 1).min(self.max_scroll);
            }
            TuiEvent::ScrollPageUp => {
                self.scroll = self.scroll.saturating_sub(self.page.max(1));
            }
            TuiEvent::ScrollPageDown => {
                self.scroll = (self.scroll + self.page.max(1)).min(self.max_scroll);
            }
            _ => {}
        }
        None
    }
}

/// Transient drawer component; `area` passed to `render` is the whole screen.
pub struct HowItWorks<'a> {
    pub state: &'a mut HowItWorksState,
}

impl<'a> HowItWorks<'a> {
    pub fn new(state: &'a mut HowItWorksState) -> Self {
        Self { state }
    }
}

impl Component for HowItWorks<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let drawer = HowItWorksState::area(area);
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .title(DRAWER_TITLE)
            .title_bottom(" Esc to close ")
            .padding(Padding::horizontal(1));
        let inner = block.inner(drawer);

        let paragraph = Paragraph::new(markdown::render(HOW_IT_WORKS, Color::Reset))
            .wrap(Wrap { trim: false });
        let lines = u16::try_from(paragraph.line_count(inner.width)).unwrap_or(u16::MAX);
        self.state.max_scroll = lines.saturating_sub(inner.height);
        self.state.page = inner.height;
        self.state.scroll = self.state.scroll.min(self.state.max_scroll);

        frame.render_widget(Clear, drawer);
        frame.render_widget(block, drawer);
        frame.render_widget(paragraph.scroll((self.state.scroll, 0)), inner);
    }
}
