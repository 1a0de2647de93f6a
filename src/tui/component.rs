use ratatui::Frame;
use ratatui::layout::Rect;

/// A piece of the chat screen that draws itself into a rectangle.
///
/// Components are built each frame from props (plain struct fields borrowed
/// from `App` or `TuiState`). Those that need to remember something between
/// frames, like scroll offsets or layout caches, borrow their persistent state
/// mutably, which is why `render` takes `&mut self`.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that interprets terminal events.
///
/// Implemented on the persistent state types (`InputBox`,
/// `MessageListState`, `HowItWorksState`) because those outlive a frame.
pub trait EventHandler {
    /// The higher-level event this component emits, if any.
    type Event;

    fn handle_event(&mut self, event: &super::event::TuiEvent) -> Option<Self::Event>;
}
