//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Loop
//!
//! ```text
//!   ┌────────────── wait for input or the next deadline ◄─────────────┐
//!   │                                                                  │
//!   ▼                                                                  │
//! events ──► handle_event ──► update(App, Action) ──► Effect           │
//!   │                                       │                          │
//!   │                          SpawnRequest: tokio task ──► mpsc ──┐   │
//!   ▼                                                              ▼   │
//! drain actions ──► sync reveals ──► tick reveals/ack ──► draw ────────┘
//! ```
//!
//! ## Redraw Strategy
//!
//! The loop sleeps until the earliest of: a terminal event, the next reveal
//! tick of any answer, the expiry of a "✓ Copied" acknowledgment, or the
//! spinner frame while a query is in flight. It only redraws when one of
//! those changed something.

mod component;
mod components;
pub mod desktop;
mod event;
pub mod markdown;
mod ui;

use std::collections::HashMap;
use std::io::stdout;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::core::action::{Action, Effect, update};
use crate::core::reveal::{RevealEvent, StreamingText};
use crate::core::state::{App, Role};
use crate::tui::component::EventHandler;
use crate::tui::components::{DrawerEvent, HowItWorksState, InputBox, InputEvent, MessageListState};
use crate::tui::desktop::{Desktop, SystemDesktop};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// How long "✓ Copied" replaces the copy hint.
pub const COPIED_ACK_DURATION: Duration = Duration::from_secs(2);
/// Spinner frame length while a query is in flight.
const SPINNER_FRAME: Duration = Duration::from_millis(80);
/// Upper bound on sleeping when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Modal input mode: determines how keyboard events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigate messages with arrow keys. Typing auto-switches to Input.
    Cursor,
    /// Text editing in the input box. Esc switches to Cursor.
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedAck {
    pub message_id: Uuid,
    pub until: Instant,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub input_mode: InputMode,
    /// F1 drawer (None = hidden)
    pub how_it_works: Option<HowItWorksState>,
    /// Reveal progress of every agent message, keyed by message id
    pub reveals: HashMap<Uuid, StreamingText>,
    pub reveal_interval: Duration,
    pub copied: Option<CopiedAck>,
    /// Backend host shown in the header
    pub backend_label: String,
}

impl TuiState {
    pub fn new(reveal_interval: Duration, backend_label: impl Into<String>) -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            input_mode: InputMode::Input, // User expects to type immediately
            how_it_works: None,
            reveals: HashMap::new(),
            reveal_interval,
            copied: None,
            backend_label: backend_label.into(),
        }
    }

    /// Start a reveal for every agent message that doesn't have one yet.
    pub fn sync_reveals(&mut self, app: &App, now: Instant) {
        for message in app.conversation.messages() {
            if message.role != Role::Agent {
                continue;
            }
            match self.reveals.get_mut(&message.id) {
                Some(reveal) => reveal.set_text(&message.text, now),
                None => {
                    debug!("Starting reveal for message {}", message.id);
                    self.reveals.insert(
                        message.id,
                        StreamingText::new(message.text.clone(), self.reveal_interval, now),
                    );
                }
            }
        }
    }

    /// Advance reveals and expire the copy acknowledgment.
    /// Returns true if anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for (id, reveal) in self.reveals.iter_mut() {
            match reveal.poll(now) {
                Some(RevealEvent::Advanced { .. }) => changed = true,
                Some(RevealEvent::Completed) => {
                    debug!("Reveal complete for message {}", id);
                    changed = true;
                }
                None => {}
            }
        }
        if self.copied.is_some_and(|ack| now >= ack.until) {
            self.copied = None;
            changed = true;
        }
        changed
    }

    /// Earliest instant something scheduled needs the loop.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.reveals
            .values()
            .filter_map(StreamingText::next_due)
            .chain(self.copied.map(|ack| ack.until))
            .min()
    }

    /// Reveal everything immediately (End key).
    pub fn finish_reveals(&mut self) {
        for reveal in self.reveals.values_mut() {
            reveal.finish();
        }
    }

    /// Reveal answers the user has scrolled past; nobody is watching them type.
    pub fn finish_hidden_reveals(&mut self, app: &App) {
        let hidden = self.message_list.hidden_above();
        for message in app.conversation.messages().iter().take(hidden) {
            if let Some(reveal) = self.reveals.get_mut(&message.id)
                && reveal.is_revealing()
            {
                debug!("Finishing reveal scrolled out of view: {}", message.id);
                reveal.finish();
            }
        }
    }

    pub fn copied_message(&self) -> Option<Uuid> {
        self.copied.map(|ack| ack.message_id)
    }

    fn enter_cursor_mode(&mut self, app: &App) {
        self.input_mode = InputMode::Cursor;
        let count = app.conversation.len();
        self.message_list.selected_index = count.checked_sub(1);
        self.message_list.scroll_to_selected();
    }

    fn enter_input_mode(&mut self) {
        self.input_mode = InputMode::Input;
        self.message_list.selected_index = None;
    }

    fn toggle_sources_at(&mut self, app: &App, index: usize) -> bool {
        match app.conversation.get(index) {
            Some(message) if message.has_sources() => {
                // Finish the reveal so the disclosure is visible right away
                if let Some(reveal) = self.reveals.get_mut(&message.id) {
                    reveal.finish();
                }
                self.message_list.toggle_sources(message.id);
                true
            }
            _ => false,
        }
    }

    /// The agent message Ctrl+Y acts on: the selection if it is an answer,
    /// otherwise the latest answer.
    fn copy_target(&self, app: &App) -> Option<usize> {
        self.message_list
            .selected_index
            .filter(|&i| {
                app.conversation
                    .get(i)
                    .is_some_and(|m| m.role == Role::Agent)
            })
            .or_else(|| app.conversation.last_agent_index())
    }
}

/// Route one terminal event. Returns the effect the loop must carry out.
pub fn handle_event(
    app: &mut App,
    tui: &mut TuiState,
    event: TuiEvent,
    desktop: &mut dyn Desktop,
    now: Instant,
) -> Effect {
    // Ctrl+C always quits regardless of mode
    if matches!(event, TuiEvent::ForceQuit) {
        return update(app, Action::Quit);
    }

    // When the drawer is open, route everything to it
    if let Some(drawer) = tui.how_it_works.as_mut() {
        if drawer.handle_event(&event) == Some(DrawerEvent::Close) {
            tui.how_it_works = None;
        }
        return Effect::None;
    }

    match event {
        TuiEvent::Resize => return Effect::None,
        TuiEvent::ToggleHelp => {
            tui.how_it_works = Some(HowItWorksState::new());
            return Effect::None;
        }
        TuiEvent::Copy => {
            copy_message(app, tui, desktop, now);
            return Effect::None;
        }
        TuiEvent::ScrollToBottom => {
            tui.finish_reveals();
            tui.message_list.handle_event(&event);
            tui.input_box.handle_event(&event);
            return Effect::None;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown
        | TuiEvent::MouseMove(..) => {
            tui.message_list.handle_event(&event);
            return Effect::None;
        }
        TuiEvent::MouseClick(column, row) => {
            if let Some(idx) = tui.message_list.hit_test(column, row) {
                tui.message_list.selected_index = Some(idx);
                tui.toggle_sources_at(app, idx);
            }
            return Effect::None;
        }
        _ => {}
    }

    match tui.input_mode {
        InputMode::Input => {
            if matches!(event, TuiEvent::Escape) {
                tui.enter_cursor_mode(app);
                return Effect::None;
            }
            match tui.input_box.handle_event(&event) {
                Some(InputEvent::Submit(text)) => {
                    tui.message_list.scroll_to_bottom();
                    update(app, Action::Submit(text))
                }
                _ => Effect::None,
            }
        }
        InputMode::Cursor => {
            match event {
                TuiEvent::Escape => tui.enter_input_mode(),
                TuiEvent::CursorUp => tui.message_list.select_previous(app.conversation.len()),
                TuiEvent::CursorDown => tui.message_list.select_next(app.conversation.len()),
                TuiEvent::InputChar(' ') | TuiEvent::Submit => {
                    let selected = tui.message_list.selected_index;
                    let toggled = selected.is_some_and(|idx| tui.toggle_sources_at(app, idx));
                    // Enter on a bubble without sources goes back to typing
                    if !toggled && event == TuiEvent::Submit {
                        tui.enter_input_mode();
                    }
                }
                TuiEvent::InputChar(c @ '1'..='9') => {
                    let n = c as usize - '0' as usize;
                    open_source(app, tui, desktop, n);
                }
                // Typing auto-switches to Input mode and forwards the event
                TuiEvent::InputChar(_) | TuiEvent::Paste(_) => {
                    tui.enter_input_mode();
                    tui.input_box.handle_event(&event);
                }
                _ => {}
            }
            Effect::None
        }
    }
}

fn copy_message(app: &mut App, tui: &mut TuiState, desktop: &mut dyn Desktop, now: Instant) {
    let Some(message) = tui.copy_target(app).and_then(|i| app.conversation.get(i)) else {
        debug!("Nothing to copy");
        return;
    };
    // Always the full answer, even if it is still being revealed
    match desktop.copy(&message.text) {
        Ok(()) => {
            info!("Copied message {} ({} bytes)", message.id, message.text.len());
            tui.copied = Some(CopiedAck {
                message_id: message.id,
                until: now + COPIED_ACK_DURATION,
            });
        }
        Err(e) => {
            warn!("Copy failed: {}", e);
            app.status_message = format!("Copy failed: {}", e);
        }
    }
}

/// Open source `n` (1-based) of the selected bubble, if its list is expanded.
fn open_source(app: &mut App, tui: &TuiState, desktop: &mut dyn Desktop, n: usize) {
    let Some(message) = tui
        .message_list
        .selected_index
        .and_then(|i| app.conversation.get(i))
    else {
        return;
    };
    if !tui.message_list.expanded.contains(&message.id) {
        return;
    }
    let Some(source) = message.sources.get(n - 1) else {
        return;
    };
    if let Err(e) = desktop.open(&source.url) {
        warn!("Could not open {}: {}", source.url, e);
        app.status_message = format!("Could not open link: {}", e);
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol is harmlessly ignored by terminals that lack it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Run the chat screen until the user quits.
pub fn run(mut app: App, reveal_interval: Duration) -> std::io::Result<()> {
    let backend_label = app.backend.name().to_string();
    let mut tui = TuiState::new(reveal_interval, backend_label);
    let mut desktop = SystemDesktop::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let mut in_flight: Option<tokio::task::AbortHandle> = None;

    let start_time = Instant::now();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        // Handle background task actions (backend replies)
        while let Ok(action) = rx.try_recv() {
            debug!("Event loop received: {:?}", action);
            needs_redraw = true;
            in_flight = None;
            if update(&mut app, action) == Effect::Quit {
                break 'main;
            }
        }

        let now = Instant::now();
        tui.sync_reveals(&app, now);
        if tui.tick(now) {
            needs_redraw = true;
        }

        // Sync InputBox props with App/TUI state
        let loading = app.is_loading();
        let spinner_frame = (start_time.elapsed().as_millis() / SPINNER_FRAME.as_millis()) as usize;
        tui.input_box.disabled = loading;
        tui.input_box.focused = tui.input_mode == InputMode::Input;
        tui.input_box.spinner_frame = spinner_frame;
        if loading {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
            tui.finish_hidden_reveals(&app);
        }

        // Sleep until input or the next scheduled change
        let mut timeout = tui
            .next_deadline()
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL);
        if loading {
            timeout = timeout.min(SPINNER_FRAME);
        }
        let first_event = poll_event_timeout(timeout);

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            needs_redraw = true;
            match handle_event(&mut app, &mut tui, event, &mut desktop, Instant::now()) {
                Effect::None => {}
                Effect::SpawnRequest(query) => {
                    in_flight = Some(spawn_request(&app, query, tx.clone()));
                }
                Effect::Quit => break 'main,
            }
        }
    }

    if let Some(handle) = in_flight.take() {
        info!("Aborting in-flight request on exit");
        handle.abort();
    }

    ratatui::restore();
    Ok(())
}

fn spawn_request(app: &App, query: String, tx: mpsc::Sender<Action>) -> tokio::task::AbortHandle {
    info!("Spawning backend request ({} chars)", query.chars().count());
    let backend = app.backend.clone();
    let handle = tokio::spawn(async move {
        let started = Instant::now();
        let outcome = backend.query(&query).await;
        debug!(
            "Backend request finished in {}ms (ok={})",
            started.elapsed().as_millis(),
            outcome.is_ok()
        );
        if tx.send(Action::from_outcome(outcome)).is_err() {
            warn!("Failed to deliver backend reply: receiver dropped");
        }
    });
    handle.abort_handle()
}
