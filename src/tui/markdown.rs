//! Markdown → ratatui `Text` renderer.
//!
//! Walks `pulldown_cmark` events and emits styled `Line`s. Covers what the
//! research backend produces: headings, emphasis, strikethrough, inline code,
//! fenced code (highlighted with syntect), nested lists, task markers,
//! blockquotes, rules, links, images and simple GFM tables.
//!
//! Agent answers are rendered while they are still being revealed, so the
//! input is often an arbitrary prefix of a document (an unterminated `**`,
//! half a table). The renderer never fails on such input; it just shows
//! whatever structure the parser recognized so far.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use unicode_width::UnicodeWidthStr;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const CODE_THEME: &str = "base16-ocean.dark";
const RULE_WIDTH: usize = 40;

fn gutter_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

/// Render markdown into owned, styled text using `base_fg` for body copy.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_TABLES);

    let mut renderer = Renderer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Bullet,
    Numbered(u64),
}

/// Cells of a table collected as plain text, laid out once the table closes.
#[derive(Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    in_header: bool,
}

impl TableBuffer {
    fn current_cell(&mut self) -> Option<&mut String> {
        self.rows.last_mut().and_then(|row| row.last_mut())
    }
}

struct Renderer {
    lines: Vec<Line<'static>>,
    base_fg: Color,
    styles: Vec<Style>,
    quote_depth: usize,
    lists: Vec<ListKind>,
    /// `Some` while inside a code block; the inner value is the highlighter,
    /// absent when the language is unknown.
    code: Option<Option<HighlightLines<'static>>>,
    link_target: Option<String>,
    image_target: Option<String>,
    table: Option<TableBuffer>,
    /// A blank line goes before the next block element.
    gap: bool,
}

impl Renderer {
    fn new(base_fg: Color) -> Self {
        Self {
            lines: Vec::new(),
            base_fg,
            styles: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            code: None,
            link_target: None,
            image_target: None,
            table: None,
            gap: false,
        }
    }

    fn finish(mut self) -> Text<'static> {
        // A table cut off mid-reveal is still worth showing.
        if self.table.is_some() {
            self.flush_table();
        }
        Text::from(self.lines)
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        let next = self.style().patch(overlay);
        self.styles.push(next);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    /// Starts a new line carrying the blockquote and code gutters.
    fn new_line(&mut self) {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(Span::styled("│ ".repeat(self.quote_depth), gutter_style()));
        }
        if self.code.is_some() {
            spans.push(Span::styled("│ ", gutter_style()));
        }
        self.lines.push(Line::from(spans));
    }

    fn append(&mut self, span: Span<'static>) {
        if self.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn open_block(&mut self) {
        if self.gap && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.gap = false;
    }

    fn event(&mut self, event: Event<'_>) {
        if self.table.is_some() {
            self.table_event(&event);
            return;
        }
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(text),
            Event::Code(code) => self.append(Span::styled(
                code.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::SoftBreak => self.append(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.open_block();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(RULE_WIDTH), gutter_style())));
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                self.append(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // Inside a list item the item line already exists.
                if self.lists.is_empty() {
                    self.open_block();
                    self.new_line();
                }
            }
            Tag::Heading { level, .. } => {
                self.open_block();
                self.new_line();
                let style = heading_style(self.base_fg, level);
                self.append(Span::styled(format!("{} ", "#".repeat(level as usize)), style));
                self.push_style(style);
            }
            Tag::BlockQuote(_) => {
                self.open_block();
                self.quote_depth += 1;
                self.push_style(
                    Style::default()
                        .fg(self.base_fg)
                        .add_modifier(Modifier::DIM | Modifier::ITALIC),
                );
            }
            Tag::CodeBlock(kind) => self.start_code(kind),
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.open_block();
                }
                self.lists.push(first.map_or(ListKind::Bullet, ListKind::Numbered));
            }
            Tag::Item => {
                self.new_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Numbered(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.append(Span::styled(marker, gutter_style()));
            }
            Tag::Table(_) => {
                self.open_block();
                self.table = Some(TableBuffer::default());
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_target = Some(dest_url.to_string());
                self.push_style(link_style());
            }
            Tag::Image { dest_url, .. } => {
                self.image_target = Some(dest_url.to_string());
                self.append(Span::styled("🖼 ", gutter_style()));
                self.push_style(link_style());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.gap = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                self.gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.lines
                    .push(Line::from(Span::styled("╰──", gutter_style())));
                self.gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some(url) = self.link_target.take() {
                    self.append(Span::raw(" ("));
                    self.append(Span::styled(url, link_style()));
                    self.append(Span::raw(")"));
                }
            }
            TagEnd::Image => {
                self.pop_style();
                if let Some(url) = self.image_target.take() {
                    self.append(Span::styled(format!(" <{url}>"), gutter_style()));
                }
            }
            _ => {}
        }
    }

    fn start_code(&mut self, kind: CodeBlockKind<'_>) {
        self.open_block();
        let lang = match &kind {
            CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or(""),
            CodeBlockKind::Indented => "",
        };
        let header = if lang.is_empty() {
            Line::from(Span::styled("╭──", gutter_style()))
        } else {
            Line::from(vec![
                Span::styled("╭── ", gutter_style()),
                Span::styled(lang.to_string(), gutter_style().add_modifier(Modifier::BOLD)),
            ])
        };
        self.lines.push(header);

        let highlighter = SYNTAX_SET
            .find_syntax_by_token(lang)
            .filter(|_| !lang.is_empty())
            .and_then(|syntax| {
                THEME_SET
                    .themes
                    .get(CODE_THEME)
                    .map(|theme| HighlightLines::new(syntax, theme))
            });
        self.code = Some(highlighter);
    }

    fn text(&mut self, text: CowStr<'_>) {
        let text = text.replace('\t', "    ");

        if let Some(slot) = self.code.as_mut() {
            // The slot stays `Some` so new lines keep their code gutter.
            let mut highlighter = slot.take();
            for line in LinesWithEndings::from(&text) {
                self.new_line();
                let spans = match highlighter.as_mut() {
                    Some(h) => highlight(h, line),
                    None => vec![Span::styled(
                        line.trim_end_matches('\n').to_string(),
                        Style::default().fg(Color::White),
                    )],
                };
                if let Some(last) = self.lines.last_mut() {
                    last.spans.extend(spans);
                }
            }
            self.code = Some(highlighter);
            return;
        }

        let style = self.style();
        self.append(Span::styled(text, style));
    }

    // ── Tables ──────────────────────────────────────────────────────────

    /// Consumes every event while a table is open; cells keep plain text only.
    fn table_event(&mut self, event: &Event<'_>) {
        let Some(table) = self.table.as_mut() else {
            return;
        };
        match event {
            Event::Start(Tag::TableHead) => table.in_header = true,
            Event::End(TagEnd::TableHead) => {
                table.in_header = false;
                table.header_rows = table.rows.len();
            }
            Event::Start(Tag::TableRow) => table.rows.push(Vec::new()),
            Event::Start(Tag::TableCell) => {
                if table.in_header && table.rows.is_empty() {
                    table.rows.push(Vec::new());
                }
                if let Some(row) = table.rows.last_mut() {
                    row.push(String::new());
                }
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some(cell) = table.current_cell() {
                    cell.push_str(t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(cell) = table.current_cell() {
                    cell.push(' ');
                }
            }
            Event::End(TagEnd::Table) => {
                self.flush_table();
                self.gap = true;
            }
            _ => {}
        }
    }

    fn flush_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };
        let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let body = Style::default().fg(self.base_fg);
        for (r, row) in table.rows.iter().enumerate() {
            let style = if r < table.header_rows {
                body.add_modifier(Modifier::BOLD)
            } else {
                body
            };
            let mut spans = Vec::new();
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::styled(" │ ", gutter_style()));
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = width.saturating_sub(cell.width());
                spans.push(Span::styled(format!("{cell}{}", " ".repeat(pad)), style));
            }
            self.lines.push(Line::from(spans));

            if r + 1 == table.header_rows {
                let rule = widths
                    .iter()
                    .map(|w| "─".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("─┼─");
                self.lines.push(Line::from(Span::styled(rule, gutter_style())));
            }
        }
    }
}

fn highlight(highlighter: &mut HighlightLines<'static>, line: &str) -> Vec<Span<'static>> {
    match highlighter.highlight_line(line, &SYNTAX_SET) {
        Ok(ranges) => ranges
            .into_iter()
            .filter_map(|(style, fragment)| {
                let content = fragment.trim_end_matches('\n');
                if content.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                Some(Span::styled(content.to_string(), Style::default().fg(fg)))
            })
            .collect(),
        Err(_) => vec![Span::styled(
            line.trim_end_matches('\n').to_string(),
            Style::default().fg(Color::White),
        )],
    }
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    let style = Style::default().fg(base_fg).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}
