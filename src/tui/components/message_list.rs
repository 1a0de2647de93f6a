//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Lay out one `MessageBubble` per message, newest at the bottom
//! - Stick to the bottom while new content arrives, until the user scrolls up
//! - Cache bubble heights so a reveal tick only re-measures the bubble that grew
//! - Hit testing and selection for mouse and cursor-mode navigation
//! - Show the typing indicator under the last bubble while a query is in flight
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the conversation plus
//! reveal progress (props).

use std::collections::{HashMap, HashSet};

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};
use uuid::Uuid;

use crate::core::reveal::StreamingText;
use crate::core::state::Message;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageBubble;
use crate::tui::components::typing_indicator::{INDICATOR_HEIGHT, TypingIndicator};
use crate::tui::event::TuiEvent;

/// Scroll, selection and layout state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Message under the keyboard cursor or last clicked
    pub selected_index: Option<usize>,
    /// Message under the mouse pointer
    pub hovered_index: Option<usize>,
    /// Messages whose source list is open
    pub expanded: HashSet<Uuid>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Screen rectangle of the last render, for hit testing
    pub area: Rect,
    /// Number of messages that existed the last time the bottom was visible
    seen_count: usize,
    message_count: usize,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            selected_index: None,
            hovered_index: None,
            expanded: HashSet::new(),
            viewport_height: 0,
            area: Rect::default(),
            seen_count: 0,
            message_count: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll so the selected message is fully visible.
    /// If the message is taller than the viewport, align its top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some((item_top, item_bottom)) = self
            .selected_index
            .and_then(|idx| self.layout.span_of(idx))
        else {
            return;
        };
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom.saturating_sub(self.viewport_height);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            self.stick_to_bottom = new_y >= self.max_offset();
        }
    }

    pub fn select_previous(&mut self, message_count: usize) {
        if message_count == 0 {
            return;
        }
        let idx = self
            .selected_index
            .map(|i| i.saturating_sub(1))
            .unwrap_or(message_count - 1);
        self.selected_index = Some(idx);
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self, message_count: usize) {
        if let Some(idx) = self.selected_index
            && idx + 1 < message_count
        {
            self.selected_index = Some(idx + 1);
            self.scroll_to_selected();
        }
    }

    /// Open or close the source list of a message.
    pub fn toggle_sources(&mut self, id: Uuid) {
        if !self.expanded.remove(&id) {
            self.expanded.insert(id);
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.scroll_state.scroll_to_bottom();
    }

    /// Map a screen position to the message drawn there.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        if !self.area.contains(Position { x: column, y: row }) {
            return None;
        }
        let content_y = (row - self.area.y).saturating_add(self.scroll_state.offset().y);
        self.layout.index_at(content_y)
    }

    /// Number of leading messages whose bubble ends above the viewport.
    pub fn hidden_above(&self) -> usize {
        let offset_y = self.scroll_state.offset().y;
        self.layout
            .prefix_heights
            .partition_point(|&end| end <= offset_y)
    }

    /// True when messages arrived while the user was scrolled away from the bottom.
    pub fn has_unseen_content(&self) -> bool {
        !self.stick_to_bottom && self.message_count > self.seen_count
    }
}

/// What a bubble's height depends on. Any change forces a re-measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutKey {
    pub id: Uuid,
    pub visible_len: usize,
    pub revealing: bool,
    pub expanded: bool,
}

/// Cached layout measurements
#[derive(Default)]
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    keys: Vec<LayoutKey>,
    content_width: u16,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leading cached heights still valid for `keys` at `content_width`.
    pub fn reusable_count(&self, keys: &[LayoutKey], content_width: u16) -> usize {
        if self.content_width != content_width {
            return 0;
        }
        self.keys
            .iter()
            .zip(keys)
            .take_while(|(cached, current)| cached == current)
            .count()
            .min(self.heights.len())
    }

    /// Replace the cache from `reusable` onward with freshly measured heights.
    pub fn update(
        &mut self,
        keys: Vec<LayoutKey>,
        content_width: u16,
        reusable: usize,
        measure: impl Fn(usize) -> u16,
    ) {
        self.heights.truncate(reusable);
        for i in reusable..keys.len() {
            self.heights.push(measure(i));
        }
        self.keys = keys;
        self.content_width = content_width;
        self.rebuild_prefix_heights();
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    /// Top (inclusive) and bottom (exclusive) content rows of item `idx`.
    pub fn span_of(&self, idx: usize) -> Option<(u16, u16)> {
        let bottom = *self.prefix_heights.get(idx)?;
        let top = if idx == 0 {
            0
        } else {
            self.prefix_heights[idx - 1]
        };
        Some((top, bottom))
    }

    /// The item covering content row `y`.
    pub fn index_at(&self, y: u16) -> Option<usize> {
        let idx = self.prefix_heights.partition_point(|&end| end <= y);
        (idx < self.prefix_heights.len()).then_some(idx)
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
    pub reveals: &'a HashMap<Uuid, StreamingText>,
    /// Message whose copy was acknowledged in the last two seconds
    pub copied: Option<Uuid>,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [Message],
        reveals: &'a HashMap<Uuid, StreamingText>,
    ) -> Self {
        Self {
            state,
            messages,
            reveals,
            copied: None,
            is_loading: false,
            spinner_frame: 0,
        }
    }

    pub fn copied(mut self, copied: Option<Uuid>) -> Self {
        self.copied = copied;
        self
    }

    pub fn loading(mut self, is_loading: bool, spinner_frame: usize) -> Self {
        self.is_loading = is_loading;
        self.spinner_frame = spinner_frame;
        self
    }

    fn bubble(&self, i: usize) -> MessageBubble<'a> {
        let message = &self.messages[i];
        let mut bubble = MessageBubble::new(message);
        if let Some(reveal) = self.reveals.get(&message.id) {
            bubble.visible = reveal.visible();
            bubble.revealing = reveal.is_revealing();
        }
        bubble.sources_expanded = self.state.expanded.contains(&message.id);
        bubble.is_selected = self.state.selected_index == Some(i);
        bubble.is_hovered = self.state.hovered_index == Some(i);
        bubble.copied = self.copied == Some(message.id);
        bubble
    }

    fn layout_keys(&self) -> Vec<LayoutKey> {
        (0..self.messages.len())
            .map(|i| {
                let bubble = self.bubble(i);
                LayoutKey {
                    id: bubble.message.id,
                    visible_len: bubble.visible.len(),
                    revealing: bubble.revealing,
                    expanded: bubble.sources_expanded,
                }
            })
            .collect()
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area

        // 1. Update layout cache
        let keys = self.layout_keys();
        let reusable = self.state.layout.reusable_count(&keys, content_width);
        let bubbles: Vec<MessageBubble<'a>> =
            (0..self.messages.len()).map(|i| self.bubble(i)).collect();
        self.state
            .layout
            .update(keys, content_width, reusable, |i| {
                bubbles[i].calculate_height(content_width)
            });

        let total_height = self.state.layout.total_height();
        let indicator_height = if self.is_loading { INDICATOR_HEIGHT } else { 0 };
        let canvas_height = total_height.saturating_add(indicator_height);

        // 2. Clamp scroll offset to prevent overscrolling past content
        self.state.area = area;
        self.state.viewport_height = area.height;
        self.state.message_count = self.messages.len();
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible bubbles into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        for i in visible_range {
            let Some((top, bottom)) = self.state.layout.span_of(i) else {
                continue;
            };
            let rect = Rect::new(0, top, content_width, bottom - top);
            scroll_view.render_widget(bubbles[i], rect);
        }

        if self.is_loading {
            let rect = Rect::new(0, total_height, content_width, indicator_height);
            scroll_view.render_widget(TypingIndicator::new(self.spinner_frame), rect);
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
            self.state.seen_count = self.messages.len();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Implemented on `MessageListState` because scrolling mutates state that
/// outlives the per-frame `MessageList`.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => self.scroll_to_bottom(),
            TuiEvent::MouseMove(column, row) => {
                self.hovered_index = self.hit_test(*column, *row);
            }
            _ => {}
        }
        None
    }
}
