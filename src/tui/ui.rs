use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::header::HEADER_HEIGHT;
use crate::tui::components::input_box::INPUT_HEIGHT;
use crate::tui::components::{Header, HowItWorks, MessageList};
use crate::tui::{InputMode, TuiState};

/// Screen regions, top to bottom.
pub struct ScreenLayout {
    pub header: Rect,
    pub messages: Rect,
    pub input: Rect,
    pub footer: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenLayout {
    use Constraint::{Length, Min};
    let [header, messages, input, footer] =
        Layout::vertical([Length(HEADER_HEIGHT), Min(0), Length(INPUT_HEIGHT), Length(1)])
            .areas(area);
    ScreenLayout {
        header,
        messages,
        input,
        footer,
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let layout = screen_layout(frame.area());

    let unseen = tui.message_list.has_unseen_content();
    Header::new(&tui.backend_label, &app.status_message, unseen).render(frame, layout.header);

    let copied = tui.copied_message();
    MessageList::new(
        &mut tui.message_list,
        app.conversation.messages(),
        &tui.reveals,
    )
    .copied(copied)
    .loading(app.is_loading(), spinner_frame)
    .render(frame, layout.messages);

    tui.input_box.render(frame, layout.input);

    let hints = if tui.how_it_works.is_some() {
        "↑↓ scroll · Esc close"
    } else {
        match tui.input_mode {
            InputMode::Input => "Enter send · Esc browse · Ctrl+Y copy · End skip · F1 how it works · Ctrl+C quit",
            InputMode::Cursor => "↑↓ select · Enter/Space sources · 1-9 open · Ctrl+Y copy · Esc type",
        }
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hints,
            Style::default().fg(Color::DarkGray),
        ))),
        layout.footer,
    );

    // The drawer leaves the footer visible so its key hints stay readable
    if let Some(drawer) = tui.how_it_works.as_mut() {
        let overlay = Rect {
            height: layout.footer.y.saturating_sub(layout.header.y),
            ..frame.area()
        };
        HowItWorks::new(drawer).render(frame, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Source;
    use crate::core::action::{Action, update};
    use crate::core::state::DEFAULT_GREETING;
    use crate::test_support::StubBackend;
    use crate::tui::components::HowItWorksState;
    use crate::backend::QueryResponse;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn draw(app: &App, tui: &mut TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, app, tui, 0)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn app_with_greeting() -> App {
        let backend = Arc::new(StubBackend::new(|| Ok(QueryResponse::default())));
        App::new(backend, Some(DEFAULT_GREETING))
    }

    #[test]
    fn first_frame_shows_header_greeting_and_placeholder() {
        let app = app_with_greeting();
        let mut tui = TuiState::new(Duration::from_millis(30), "localhost:8000");
        tui.sync_reveals(&app, Instant::now());
        tui.finish_reveals();

        let screen = draw(&app, &mut tui);
        assert!(screen.contains("Recuri"));
        assert!(screen.contains("localhost:8000"));
        assert!(screen.contains("Ask me anything"));
        assert!(screen.contains("Message Recuri..."));
        assert!(screen.contains("F1 how it works"));
    }

    #[test]
    fn awaiting_shows_indicator_and_waiting_input() {
        let mut app = app_with_greeting();
        let mut tui = TuiState::new(Duration::from_millis(30), "stub");
        update(&mut app, Action::Submit("capital of France?".into()));
        tui.input_box.disabled = app.is_loading();

        let screen = draw(&app, &mut tui);
        assert!(screen.contains("capital of France?"));
        assert!(screen.contains("AI is thinking"));
        assert!(screen.contains("Waiting for answer"));
        assert!(screen.contains("Searching"));
    }

    #[test]
    fn answer_with_sources_collapsed_by_default() {
        let mut app = app_with_greeting();
        let mut tui = TuiState::new(Duration::from_millis(30), "stub");
        update(&mut app, Action::Submit("q".into()));
        update(
            &mut app,
            Action::ResponseReceived(QueryResponse {
                result: Some("Paris.".into()),
                sources: Some(vec![Source {
                    title: "A".into(),
                    url: "http://a".into(),
                }]),
            }),
        );
        tui.sync_reveals(&app, Instant::now());
        tui.finish_reveals();

        let screen = draw(&app, &mut tui);
        assert!(screen.contains("Paris."));
        assert!(screen.contains("▸ Sources (1)"));
        assert!(!screen.contains("http://a"));

        let id = app.conversation.messages()[2].id;
        tui.message_list.toggle_sources(id);
        let screen = draw(&app, &mut tui);
        assert!(screen.contains("▾ Sources (1)"));
        assert!(screen.contains("http://a"));
    }

    #[test]
    fn drawer_overlays_the_conversation() {
        let app = app_with_greeting();
        let mut tui = TuiState::new(Duration::from_millis(30), "stub");
        tui.how_it_works = Some(HowItWorksState::new());
        let screen = draw(&app, &mut tui);
        assert!(screen.contains("How it works"));
        assert!(screen.contains("Esc close"));
    }

    #[test]
    fn layout_stacks_regions() {
        let layout = screen_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(layout.header.height, HEADER_HEIGHT);
        assert_eq!(layout.input.height, INPUT_HEIGHT);
        assert_eq!(layout.footer.y, 23);
        assert_eq!(layout.messages.y, HEADER_HEIGHT);
        assert_eq!(layout.messages.height, 24 - HEADER_HEIGHT - INPUT_HEIGHT - 1);
    }
}
