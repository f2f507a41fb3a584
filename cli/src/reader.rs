use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lawmark_core::{
    Config, Container, ContainerId, LawDocument, NativeSelection, PopupController, PopupState,
    Rect, Renderer, SelectionSurface,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::io;
use unicode_segmentation::UnicodeSegmentation;

/// Terminal columns taken by a piece of text
fn display_width(text: &str) -> usize {
    Span::raw(text).width()
}

/// Character ranges of the wrapped lines of `text`. Line breaks stay at the
/// end of the line they terminate.
fn wrap_body(text: &str, width: usize) -> Vec<(usize, usize)> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut column = 0;
    let mut pos = 0;

    for grapheme in text.graphemes(true) {
        let chars = grapheme.chars().count();
        if grapheme == "\n" || grapheme == "\r\n" {
            lines.push((line_start, pos + chars));
            pos += chars;
            line_start = pos;
            column = 0;
            continue;
        }
        let w = display_width(grapheme);
        if column + w > width && pos > line_start {
            lines.push((line_start, pos));
            line_start = pos;
            column = 0;
        }
        column += w;
        pos += chars;
    }
    if pos > line_start || lines.is_empty() {
        lines.push((line_start, pos));
    }
    lines
}

/// Character offsets at which graphemes start, plus the end of the text
fn grapheme_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = vec![0];
    let mut pos = 0;
    for grapheme in text.graphemes(true) {
        pos += grapheme.chars().count();
        boundaries.push(pos);
    }
    boundaries
}

/// Character range of the word segment around `offset`
fn word_at(text: &str, offset: usize) -> Option<(usize, usize)> {
    let mut pos = 0;
    for segment in text.split_word_bounds() {
        let len = segment.chars().count();
        if offset < pos + len {
            return Some((pos, pos + len));
        }
        pos += len;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Label,
    Body { start: usize, end: usize },
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutLine {
    article: usize,
    kind: LineKind,
}

fn layout_document(document: &LawDocument, width: usize) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    for (article, entry) in document.articles().iter().enumerate() {
        lines.push(LayoutLine {
            article,
            kind: LineKind::Label,
        });
        for (start, end) in wrap_body(entry.container.original_text(), width) {
            lines.push(LayoutLine {
                article,
                kind: LineKind::Body { start, end },
            });
        }
        lines.push(LayoutLine {
            article,
            kind: LineKind::Blank,
        });
    }
    lines
}

/// A caret position: article index and character offset in its body
type Caret = (usize, usize);

/// The reader's selection: where the drag started and where the caret is.
struct ReaderSurface {
    caret: Caret,
    anchor: Option<Caret>,
    layout: Vec<LayoutLine>,
    current: Option<NativeSelection>,
}

impl ReaderSurface {
    fn new(layout: Vec<LayoutLine>) -> Self {
        ReaderSurface {
            caret: (0, 0),
            anchor: None,
            layout,
            current: None,
        }
    }

    /// Row of the layout line holding `caret`
    fn row_of(&self, caret: Caret) -> Option<usize> {
        let (article, offset) = caret;
        let mut last_body = None;
        for (row, line) in self.layout.iter().enumerate() {
            if line.article != article {
                continue;
            }
            if let LineKind::Body { start, end } = line.kind {
                if offset >= start && offset < end {
                    return Some(row);
                }
                last_body = Some(row);
            }
        }
        last_body
    }

    fn column_of(&self, document: &LawDocument, caret: Caret) -> usize {
        let Some(row) = self.row_of(caret) else {
            return 0;
        };
        let LineKind::Body { start, .. } = self.layout[row].kind else {
            return 0;
        };
        let Some(article) = document.articles().get(caret.0) else {
            return 0;
        };
        display_width(&article.container.text_in(start..caret.1))
    }

    /// Ordered selection ends, if anything is selected
    fn ordered(&self) -> Option<(Caret, Caret)> {
        let anchor = self.anchor?;
        if anchor == self.caret {
            return None;
        }
        Some((anchor.min(self.caret), anchor.max(self.caret)))
    }

    fn is_selected(&self, article: usize, offset: usize) -> bool {
        self.ordered()
            .is_some_and(|(lo, hi)| (article, offset) >= lo && (article, offset) < hi)
    }

    /// Rebuild the native selection after the caret or anchor moved
    fn sync(&mut self, document: &LawDocument) {
        self.current = None;
        let Some(anchor) = self.anchor else {
            return;
        };
        let caret = self.caret;
        let point = |container: &Container, offset: usize, forward_end: bool| {
            if forward_end {
                container.point_before(offset)
            } else {
                container.point_at(offset)
            }
        };
        let articles = document.articles();
        let (Some(anchor_article), Some(caret_article)) =
            (articles.get(anchor.0), articles.get(caret.0))
        else {
            return;
        };
        let (anchor_container, caret_container) =
            (&anchor_article.container, &caret_article.container);
        let forward = anchor <= caret;
        let (Some(anchor_point), Some(focus_point)) = (
            point(anchor_container, anchor.1, !forward),
            point(caret_container, caret.1, forward),
        ) else {
            return;
        };

        let (lo, hi) = (anchor.min(caret), anchor.max(caret));
        let row = self.row_of(lo).unwrap_or(0);
        let last_row = self.row_of(hi).unwrap_or(row);
        let x = self.column_of(document, lo);
        let width = if row == last_row {
            self.column_of(document, hi).saturating_sub(x).max(1)
        } else {
            1
        };
        self.current = Some(NativeSelection {
            anchor: anchor_point,
            focus: focus_point,
            rect: Rect::new(
                x as i32,
                row as i32,
                width as i32,
                (last_row - row + 1) as i32,
            ),
        });
    }
}

impl SelectionSurface for ReaderSurface {
    fn selection(&self) -> Option<NativeSelection> {
        self.current
    }

    fn clear_selection(&mut self) {
        self.anchor = None;
        self.current = None;
    }
}

/// Remembers which article changed last, for the status bar.
#[derive(Default)]
struct ChangeLog {
    last: Option<ContainerId>,
    highlighted: usize,
}

impl Renderer for ChangeLog {
    fn render(&mut self, container: &Container) {
        self.last = Some(container.id());
        self.highlighted = container.highlighted_ranges().len();
    }
}

/// Reader state tracking
struct ReaderState {
    document: LawDocument,
    surface: ReaderSurface,
    popup: PopupController,
    changes: ChangeLog,
    status: String,
    /// Current vertical scroll offset
    scroll_offset: usize,
    /// Height of the viewport
    viewport_height: usize,
    /// Width the layout was computed for
    layout_width: usize,
}

impl ReaderState {
    fn new(document: LawDocument, config: &Config, width: usize, viewport_height: usize) -> Self {
        let layout = layout_document(&document, width);
        ReaderState {
            document,
            surface: ReaderSurface::new(layout),
            popup: PopupController::with_config(config),
            changes: ChangeLog::default(),
            status: String::new(),
            scroll_offset: 0,
            viewport_height,
            layout_width: width,
        }
    }

    fn relayout(&mut self, width: usize) {
        if width != self.layout_width {
            self.surface.layout = layout_document(&self.document, width);
            self.layout_width = width;
            self.selection_changed();
        }
    }

    fn total_lines(&self) -> usize {
        self.surface.layout.len()
    }

    /// Maximum valid scroll offset
    fn max_scroll(&self) -> usize {
        self.total_lines().saturating_sub(self.viewport_height)
    }

    fn scroll_to_caret(&mut self) {
        let Some(row) = self.surface.row_of(self.surface.caret) else {
            return;
        };
        if row < self.scroll_offset {
            self.scroll_offset = row.saturating_sub(1);
        } else if row >= self.scroll_offset + self.viewport_height {
            self.scroll_offset = (row + 1).saturating_sub(self.viewport_height);
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    /// Body of an article; a law without articles reads as empty text
    fn article_text(&self, article: usize) -> &str {
        self.document
            .articles()
            .get(article)
            .map_or("", |entry| entry.container.original_text())
    }

    fn selection_changed(&mut self) {
        self.surface.sync(&self.document);
        self.popup.on_selection_changed(&self.document, &self.surface);
    }

    /// Move the caret, extending the selection when `extend` is set
    fn move_caret(&mut self, caret: Caret, extend: bool) {
        if extend {
            if self.surface.anchor.is_none() {
                self.surface.anchor = Some(self.surface.caret);
            }
        } else {
            self.surface.anchor = None;
        }
        self.surface.caret = caret;
        self.selection_changed();
        self.scroll_to_caret();
    }

    fn caret_left(&self) -> Caret {
        let (article, offset) = self.surface.caret;
        if offset == 0 {
            if article == 0 {
                return (0, 0);
            }
            let prev = article - 1;
            return (prev, self.article_text(prev).chars().count());
        }
        let boundaries = grapheme_boundaries(self.article_text(article));
        let target = boundaries
            .iter()
            .rev()
            .find(|b| **b < offset)
            .copied()
            .unwrap_or(0);
        (article, target)
    }

    fn caret_right(&self) -> Caret {
        let (article, offset) = self.surface.caret;
        let text = self.article_text(article);
        let len = text.chars().count();
        if offset >= len {
            if article + 1 < self.document.article_count() {
                return (article + 1, 0);
            }
            return (article, len);
        }
        let boundaries = grapheme_boundaries(text);
        let target = boundaries
            .iter()
            .find(|b| **b > offset)
            .copied()
            .unwrap_or(len);
        (article, target)
    }

    /// Caret on the body line `delta` rows away, keeping the column
    fn caret_vertical(&self, delta: isize) -> Caret {
        let caret = self.surface.caret;
        let Some(row) = self.surface.row_of(caret) else {
            return caret;
        };
        let column = self.surface.column_of(&self.document, caret);
        let mut target = row as isize;
        loop {
            target += delta;
            if target < 0 || target as usize >= self.surface.layout.len() {
                return caret;
            }
            let line = self.surface.layout[target as usize];
            if let LineKind::Body { start, end } = line.kind {
                let text = self.article_text(line.article);
                let mut offset = start;
                let mut width = 0;
                for ch in text.chars().skip(start).take(end - start) {
                    if ch == '\n' || ch == '\r' {
                        break;
                    }
                    let w = display_width(ch.encode_utf8(&mut [0; 4]));
                    if width + w > column {
                        break;
                    }
                    width += w;
                    offset += 1;
                }
                return (line.article, offset);
            }
        }
    }

    fn select_word(&mut self) {
        let (article, offset) = self.surface.caret;
        if let Some((start, end)) = word_at(self.article_text(article), offset) {
            self.surface.anchor = Some((article, start));
            self.surface.caret = (article, end);
            self.selection_changed();
        }
    }

    fn run_action(&mut self, key: char) {
        let result = match key {
            'h' => self.popup.apply(
                &mut self.document,
                &mut self.surface,
                &mut self.changes,
            ),
            'u' => self.popup.remove(
                &mut self.document,
                &mut self.surface,
                &mut self.changes,
            ),
            _ => self.popup.invoke(
                &mut self.document,
                &mut self.surface,
                &mut self.changes,
            ),
        };
        self.status = match result {
            Ok(Some(id)) => format!(
                "{}: {} highlighted passage(s)",
                self.document.articles()[id.0 as usize].label,
                self.changes.highlighted
            ),
            Ok(None) => "Nothing selected".to_string(),
            Err(err) => format!("Error: {err}"),
        };
    }

    /// Handle one key press; returns false when the reader should quit
    fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        let extend = key_event.modifiers.contains(KeyModifiers::SHIFT);
        match key_event.code {
            KeyCode::Char('q') => return false,
            KeyCode::Esc => {
                if self.surface.anchor.is_none() {
                    return false;
                }
                self.surface.clear_selection();
                self.selection_changed();
            }
            KeyCode::Left => {
                let caret = self.caret_left();
                self.move_caret(caret, extend);
            }
            KeyCode::Right => {
                let caret = self.caret_right();
                self.move_caret(caret, extend);
            }
            KeyCode::Up => {
                let caret = self.caret_vertical(-1);
                self.move_caret(caret, extend);
            }
            KeyCode::Down => {
                let caret = self.caret_vertical(1);
                self.move_caret(caret, extend);
            }
            KeyCode::Tab => {
                let last = self.document.article_count().saturating_sub(1);
                let next = (self.surface.caret.0 + 1).min(last);
                self.move_caret((next, 0), false);
            }
            KeyCode::BackTab => {
                let prev = self.surface.caret.0.saturating_sub(1);
                self.move_caret((prev, 0), false);
            }
            KeyCode::PageDown => {
                self.scroll_offset =
                    (self.scroll_offset + self.viewport_height).min(self.max_scroll());
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(self.viewport_height);
            }
            KeyCode::Char('w') => self.select_word(),
            KeyCode::Enter => self.run_action('\n'),
            KeyCode::Char(c @ ('h' | 'u')) => self.run_action(c),
            _ => {}
        }
        true // Continue running
    }

    /// Styled spans for one body line
    fn body_line(&self, article: usize, start: usize, end: usize) -> Line<'static> {
        let container = &self.document.articles()[article].container;
        let flags = container.highlight_flags();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut run = String::new();
        let mut run_style = Style::default();

        for (i, ch) in container
            .original_text()
            .chars()
            .enumerate()
            .skip(start)
            .take(end - start)
        {
            if ch == '\n' || ch == '\r' {
                continue;
            }
            let mut style = Style::default();
            if flags.get(i).copied().unwrap_or(false) {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
            if self.surface.is_selected(article, i) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if self.surface.caret == (article, i) {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if style != run_style && !run.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            run_style = style;
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, run_style));
        }
        if self.surface.caret == (article, end) && end == container.char_len() {
            spans.push(Span::styled(" ", Style::default().add_modifier(Modifier::UNDERLINED)));
        }
        Line::from(spans)
    }

    fn line(&self, line: LayoutLine) -> Line<'static> {
        match line.kind {
            LineKind::Label => Line::styled(
                self.document.articles()[line.article].label.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            LineKind::Body { start, end } => self.body_line(line.article, start, end),
            LineKind::Blank => Line::default(),
        }
    }
}

/// Render the reader UI
fn render_reader(frame: &mut Frame, state: &mut ReaderState) {
    let area = frame.area();

    let chunks = Layout::default()
        .constraints([
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // Update viewport based on available space (minus borders)
    state.viewport_height = chunks[0].height.saturating_sub(2) as usize;
    state.relayout(chunks[0].width.saturating_sub(3) as usize);

    let visible_lines: Vec<Line> = state
        .surface
        .layout
        .iter()
        .skip(state.scroll_offset)
        .take(state.viewport_height)
        .map(|line| state.line(*line))
        .collect();

    let title = format!(
        "{} | arrows move, shift+arrows select, w word, Enter/h/u act, q quit",
        state.document.name
    );
    let paragraph = Paragraph::new(visible_lines)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(paragraph, chunks[0]);

    if state.total_lines() > state.viewport_height {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        let mut scrollbar_state = ScrollbarState::default()
            .content_length(state.total_lines())
            .viewport_content_length(state.viewport_height)
            .position(state.scroll_offset);

        let scrollbar_area = ratatui::layout::Rect {
            x: chunks[0].x + chunks[0].width - 1,
            y: chunks[0].y + 1,
            width: 1,
            height: chunks[0].height.saturating_sub(2),
        };

        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }

    render_popup(frame, chunks[0], state);

    let status_text = if state.status.is_empty() {
        format!(
            " {} 條 · Line {}/{}",
            state.document.article_count(),
            state.scroll_offset + 1,
            state.total_lines()
        )
    } else {
        format!(" {}", state.status)
    };
    let status_bar =
        Paragraph::new(status_text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_bar, chunks[1]);
}

/// Draw the action button just below the selection
fn render_popup(frame: &mut Frame, content: ratatui::layout::Rect, state: &ReaderState) {
    let popup = state.popup.state();
    let (Some(label), Some(rect)) = (popup.label(), popup.rect()) else {
        return;
    };
    let below = (rect.y + rect.height) as usize;
    if below < state.scroll_offset || below >= state.scroll_offset + state.viewport_height {
        return;
    }

    let text = format!("⏎ {label}");
    let width = (display_width(&text) + 2) as u16;
    let x = (content.x + 1 + rect.x as u16).min(content.right().saturating_sub(width));
    let y = content.y + 1 + (below - state.scroll_offset) as u16;
    let height = 3.min(content.bottom().saturating_sub(y));
    if height < 3 {
        return;
    }
    let area = ratatui::layout::Rect {
        x,
        y,
        width,
        height,
    };
    let color = match popup {
        PopupState::ShowingRemove { .. } => Color::Red,
        _ => Color::Green,
    };
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(color)),
        area,
    );
}

/// Run the interactive reader
pub fn run_reader(document: LawDocument, config: &Config) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let mut state = ReaderState::new(
        document,
        config,
        size.width.saturating_sub(3) as usize,
        size.height.saturating_sub(3) as usize,
    );

    let result = loop {
        terminal.draw(|frame| render_reader(frame, &mut state))?;

        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key_event) = event::read()?
            && key_event.kind == KeyEventKind::Press
            && !state.handle_key_event(key_event)
        {
            break Ok(());
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Check if stdout is an interactive terminal
pub fn is_interactive_terminal() -> bool {
    use std::io::IsTerminal;
    io::stdout().is_terminal()
}
