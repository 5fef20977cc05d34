//! Sprint dashboard interface.
//!
//! Three tabs over one snapshot of the task list: a Kanban board with one column
//! per status, the cumulative burndown chart, and a flat timeline table. The
//! snapshot is rebuilt whenever the cache expires or the user presses `r`; a
//! failed refresh keeps the previous snapshot on screen and shows the error.

use std::io;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row, Table,
        TableState, Tabs, Wrap,
    },
    Frame, Terminal,
};

use crate::burndown::{BurndownOptions, BurndownSeries};
use crate::cache::TaskCache;
use crate::fields::TimelineSort;
use crate::pipeline::{self, Snapshot};
use crate::source::TaskSource;
use crate::task::{status_key, Task};
use crate::tui::colors::{bucket_color, status_color, GOLD};
use crate::tui::enums::Tab;
use crate::views::{format_date, kanban_columns, timeline_rows, title_case, truncate, KanbanColumn};

/// Rows per kanban card, borders included.
const CARD_HEIGHT: usize = 5;

/// Main dashboard application state
pub struct DashboardApp<S> {
    cache: TaskCache<S>,
    opts: BurndownOptions,
    columns: Vec<String>,
    list_id: String,
    snapshot: Option<Snapshot>,
    last_refresh: Option<DateTime<Local>>,
    last_attempt: Option<Instant>,
    tab: Tab,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: Vec<usize>,
    timeline_state: TableState,
    timeline_sort: TimelineSort,
    /// Index into `columns` of the status the timeline is filtered to.
    timeline_status: Option<usize>,
    show_task_detail: bool,
    status_message: String,
    error: Option<String>,
    should_quit: bool,
}

impl<S: TaskSource> DashboardApp<S> {
    /// Create the app. Nothing is fetched until [`DashboardApp::refresh`] or `run`.
    pub fn new(
        cache: TaskCache<S>,
        opts: BurndownOptions,
        columns: Vec<String>,
        list_id: impl Into<String>,
    ) -> Self {
        let column_count = columns.len();
        DashboardApp {
            cache,
            opts,
            columns,
            list_id: list_id.into(),
            snapshot: None,
            last_refresh: None,
            last_attempt: None,
            tab: Tab::default(),
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: vec![0; column_count],
            timeline_state: TableState::default(),
            timeline_sort: TimelineSort::default(),
            timeline_status: None,
            show_task_detail: false,
            status_message: String::new(),
            error: None,
            should_quit: false,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the pipeline now, through the cache.
    pub fn refresh(&mut self) {
        self.last_attempt = Some(Instant::now());
        let today = Local::now().date_naive();
        match pipeline::snapshot(&mut self.cache, &self.opts, today) {
            Ok(snapshot) => {
                let dropped = snapshot.series.dropped_total();
                self.snapshot = Some(snapshot);
                self.last_refresh = Some(Local::now());
                self.error = None;
                self.status_message = if dropped > 0 {
                    format!("Refreshed ({} task(s) with a status outside the chart)", dropped)
                } else {
                    "Refreshed".to_string()
                };
                self.clamp_selection();
            }
            Err(e) => {
                tracing::error!(target: "sdash.tui", error = %e, "refresh failed");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Refetch once the cached batch has expired. After a failure the next
    /// automatic attempt waits a full TTL; `r` retries immediately.
    pub fn tick(&mut self, now: Instant) {
        if self.cache.is_fresh_at(now) {
            return;
        }
        let due = self
            .last_attempt
            .map_or(true, |t| now.saturating_duration_since(t) >= self.cache.ttl());
        if due {
            self.cache.invalidate();
            self.refresh();
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, code: KeyCode) {
        if self.show_task_detail {
            if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.show_task_detail = false;
            }
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('1') => self.switch_tab(Tab::Kanban),
            KeyCode::Char('2') => self.switch_tab(Tab::Burndown),
            KeyCode::Char('3') => self.switch_tab(Tab::Timeline),
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.tab.prev()),
            KeyCode::Char('r') => {
                self.cache.invalidate();
                self.refresh();
            }
            KeyCode::Char('s') if self.tab == Tab::Timeline => self.cycle_timeline_sort(),
            KeyCode::Char('f') if self.tab == Tab::Timeline => self.cycle_timeline_status(),
            KeyCode::Left | KeyCode::Char('h') if self.tab == Tab::Kanban => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right | KeyCode::Char('l') if self.tab == Tab::Kanban => {
                if self.selected_column + 1 < self.columns.len() {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Enter => {
                if self.selected_task().is_some() {
                    self.show_task_detail = true;
                }
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.status_message.clear();
        self.clamp_selection();
    }

    fn cycle_timeline_sort(&mut self) {
        self.timeline_sort = self.timeline_sort.next();
        self.status_message = format!("Timeline sorted by {}", self.timeline_sort.label());
    }

    /// Step the timeline filter through the board's statuses, then back to all.
    fn cycle_timeline_status(&mut self) {
        self.timeline_status = match self.timeline_status {
            None if !self.columns.is_empty() => Some(0),
            Some(i) if i + 1 < self.columns.len() => Some(i + 1),
            _ => None,
        };
        self.status_message = match self.timeline_filter() {
            Some(status) => format!("Timeline showing {}", title_case(status)),
            None => "Timeline showing all statuses".to_string(),
        };
        self.timeline_state.select(None);
        self.clamp_selection();
    }

    fn timeline_filter(&self) -> Option<&str> {
        self.timeline_status
            .and_then(|i| self.columns.get(i))
            .map(String::as_str)
    }

    fn timeline(&self) -> Vec<&Task> {
        match &self.snapshot {
            Some(snap) => timeline_rows(&snap.tasks, self.timeline_sort, self.timeline_filter()),
            None => Vec::new(),
        }
    }

    fn column_len(&self, index: usize) -> usize {
        let Some(snap) = &self.snapshot else { return 0 };
        self.columns
            .get(index)
            .map(|label| {
                let key = status_key(label);
                snap.tasks.iter().filter(|t| t.status_key() == key).count()
            })
            .unwrap_or(0)
    }

    fn move_selection(&mut self, delta: isize) {
        match self.tab {
            Tab::Kanban => {
                let len = self.column_len(self.selected_column);
                if len > 0 {
                    self.selected_card = step(self.selected_card, delta, len);
                }
            }
            Tab::Timeline => {
                let len = self.timeline().len();
                if len > 0 {
                    let current = self.timeline_state.selected().unwrap_or(0);
                    self.timeline_state.select(Some(step(current, delta, len)));
                }
            }
            Tab::Burndown => {}
        }
    }

    /// Ensure selected column, card and row indices are valid
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }
        let column_len = self.column_len(self.selected_column);
        if column_len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }

        let rows = self.timeline().len();
        match self.timeline_state.selected() {
            _ if rows == 0 => self.timeline_state.select(None),
            None => self.timeline_state.select(Some(0)),
            Some(i) if i >= rows => self.timeline_state.select(Some(rows - 1)),
            Some(_) => {}
        }
    }

    /// Task under the cursor on the current tab.
    pub fn selected_task(&self) -> Option<&Task> {
        let snap = self.snapshot.as_ref()?;
        match self.tab {
            Tab::Kanban => {
                let columns = kanban_columns(&snap.tasks, &self.columns);
                columns
                    .get(self.selected_column)?
                    .tasks
                    .get(self.selected_card)
                    .copied()
            }
            Tab::Timeline => {
                let index = self.timeline_state.selected()?;
                timeline_rows(&snap.tasks, self.timeline_sort, self.timeline_filter())
                    .get(index)
                    .copied()
            }
            Tab::Burndown => None,
        }
    }

    /// Render the whole dashboard
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Body
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_tabs(f, chunks[1]);
        match self.tab {
            Tab::Kanban => self.render_board(f, chunks[2]),
            Tab::Burndown => self.render_burndown(f, chunks[2]),
            Tab::Timeline => self.render_timeline(f, chunks[2]),
        }
        self.render_status_bar(f, chunks[3]);

        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let refreshed = self
            .last_refresh
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        let header_text = vec![Line::from(vec![
            Span::styled("SPRINT TRACKER", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("List: {}  Last refresh: {}", self.list_id, refreshed),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<String> = Tab::ALL
            .iter()
            .map(|t| format!("{} {}", t.index() + 1, t.title()))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .select(self.tab.index())
            .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_placeholder(&self, f: &mut Frame, area: Rect, title: &str) {
        let text = match &self.error {
            Some(e) => format!("Could not load tasks: {e}\nPress r to retry."),
            None => "Loading tasks…".to_string(),
        };
        let p = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: true });
        f.render_widget(p, area);
    }

    /// Render the kanban board
    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let Some(snap) = self.snapshot.as_ref() else {
            self.render_placeholder(f, area, "Kanban");
            return;
        };
        let columns = kanban_columns(&snap.tasks, &self.columns);
        if columns.is_empty() {
            return;
        }

        let constraints: Vec<Constraint> = (0..columns.len())
            .map(|_| Constraint::Ratio(1, columns.len() as u32))
            .collect();
        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        for (i, (column, &column_area)) in columns.iter().zip(columns_layout.iter()).enumerate() {
            let selected_card = (i == self.selected_column).then_some(self.selected_card);
            render_column(
                f,
                column_area,
                column,
                selected_card,
                &mut self.column_scroll_offsets[i],
            );
        }
    }

    fn render_burndown(&self, f: &mut Frame, area: Rect) {
        let Some(snap) = self.snapshot.as_ref() else {
            self.render_placeholder(f, area, "Burndown");
            return;
        };
        let series = &snap.series;
        let block = Block::default().borders(Borders::ALL).title("Burndown");
        if series.is_empty() {
            let p = Paragraph::new("No tasks to chart.")
                .block(block)
                .alignment(Alignment::Center);
            f.render_widget(p, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let points = chart_points(series);
        let datasets: Vec<Dataset> = series
            .buckets()
            .iter()
            .zip(&points)
            .enumerate()
            .map(|(i, (bucket, data))| {
                Dataset::default()
                    .name(title_case(bucket))
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(bucket_color(i, bucket)))
                    .data(data)
            })
            .collect();

        let x_max = series.len().saturating_sub(1).max(1) as f64;
        let y_max = series.max_count().max(1) as f64;
        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Day")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, x_max])
                    .labels(date_labels(series)),
            )
            .y_axis(
                Axis::default()
                    .title("Tasks")
                    .style(Style::default().fg(Color::Gray))
                    .bounds([0.0, y_max])
                    .labels(vec!["0".to_string(), y_max.to_string()]),
            );
        f.render_widget(chart, chunks[0]);

        let note = if series.dropped().is_empty() {
            String::new()
        } else {
            let labels: Vec<String> = series
                .dropped()
                .iter()
                .map(|(label, n)| format!("{} ({})", label, n))
                .collect();
            format!("Not charted: {}", labels.join(", "))
        };
        f.render_widget(
            Paragraph::new(note).style(Style::default().fg(Color::Yellow)),
            chunks[1],
        );
    }

    fn render_timeline(&mut self, f: &mut Frame, area: Rect) {
        let Some(snap) = self.snapshot.as_ref() else {
            self.render_placeholder(f, area, "Timeline");
            return;
        };
        let rows: Vec<Row> = timeline_rows(&snap.tasks, self.timeline_sort, self.timeline_filter())
            .into_iter()
            .map(|t| {
                Row::new(vec![
                    Cell::from(t.name.clone()),
                    Cell::from(format_date(t.start)),
                    Cell::from(format_date(t.due)),
                    Cell::from(title_case(&t.status))
                        .style(Style::default().fg(status_color(&t.status_key()))),
                ])
            })
            .collect();
        let header = Row::new(vec!["Name", "Start", "Due", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Percentage(55),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ];
        let title = match self.timeline_filter() {
            Some(status) => format!(
                "Timeline (sort: {}, status: {})",
                self.timeline_sort.label(),
                title_case(status)
            ),
            None => format!("Timeline (sort: {})", self.timeline_sort.label()),
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(GOLD).fg(Color::Black))
            .highlight_symbol("> ");
        f.render_stateful_widget(table, area, &mut self.timeline_state);
    }

    /// Render the status bar
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, style) = if let Some(e) = &self.error {
            (
                format!("Error: {} | r: Retry | q: Quit", e),
                Style::default().bg(Color::Red).fg(Color::White),
            )
        } else if !self.status_message.is_empty() {
            (
                self.status_message.clone(),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            )
        } else {
            let total = self.snapshot.as_ref().map_or(0, |s| s.tasks.len());
            (
                format!(
                    "Tasks: {} | 1-3/Tab: View | arrows: Move | Enter: Details | s: Sort | f: Filter | r: Refresh | q: Quit",
                    total
                ),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            )
        };
        f.render_widget(Paragraph::new(text).style(style), area);
    }

    /// Render the task detail popup
    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else {
            return;
        };

        let popup_area = {
            let area = f.area();
            let popup_width = area.width / 10 * 7;
            let popup_height = 10.min(area.height);
            let x = (area.width - popup_width) / 2;
            let y = (area.height - popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };
        f.render_widget(Clear, popup_area);

        let detail_lines = vec![
            Line::from(Span::styled(
                task.name.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Status: {}", title_case(&task.status))),
            Line::from(format!("Start:  {}", format_date(task.start))),
            Line::from(format!("Due:    {}", format_date(task.due))),
            Line::from(format!("Link:   {}", task.url)),
        ];

        let popup_block = Block::default()
            .borders(Borders::ALL)
            .title("Task Details (Press Enter to close)")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD));
        let popup = Paragraph::new(detail_lines)
            .block(popup_block)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, popup_area);
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code);
                }
            }
        }
        Ok(())
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        self.refresh();
        while !self.should_quit {
            terminal.draw(|f| self.render(f))?;
            self.handle_input()?;
            self.tick(Instant::now());
        }
        Ok(())
    }
}

/// Move `current` by `delta`, clamped to `0..len`.
fn step(current: usize, delta: isize, len: usize) -> usize {
    current.saturating_add_signed(delta).min(len.saturating_sub(1))
}

/// Render a single status column with its scrollable cards
fn render_column(
    f: &mut Frame,
    area: Rect,
    column: &KanbanColumn<'_>,
    selected_card: Option<usize>,
    scroll_offset: &mut usize,
) {
    let accent = status_color(&column.key);
    let border_style = if selected_card.is_some() {
        Style::default().fg(accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} ({})", column.title, column.tasks.len()))
        .border_style(border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if column.tasks.is_empty() {
        *scroll_offset = 0;
        return;
    }

    let available_height = inner.height as usize;
    let visible_cards = (available_height / CARD_HEIGHT).max(1);

    // Keep the selected card in view
    if let Some(selected) = selected_card {
        if selected < *scroll_offset {
            *scroll_offset = selected;
        } else if selected >= *scroll_offset + visible_cards {
            *scroll_offset = selected + 1 - visible_cards;
        }
    }
    *scroll_offset = (*scroll_offset).min(column.tasks.len() - 1);

    let mut current_y = 0;
    let mut rendered_cards = 0;
    for (card_index, task) in column.tasks.iter().enumerate().skip(*scroll_offset) {
        if current_y + CARD_HEIGHT > available_height {
            break;
        }
        let card_area = Rect {
            x: inner.x,
            y: inner.y + current_y as u16,
            width: inner.width,
            height: CARD_HEIGHT as u16,
        };
        render_card(f, card_area, task, selected_card == Some(card_index), accent);
        current_y += CARD_HEIGHT;
        rendered_cards += 1;
    }

    if *scroll_offset > 0 {
        let indicator = Paragraph::new(format!("▲ +{} above", *scroll_offset))
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(indicator, Rect { height: 1, ..inner });
    }

    let remaining = column.tasks.len() - *scroll_offset - rendered_cards;
    if remaining > 0 && inner.height > 0 {
        let indicator = Paragraph::new(format!("▼ +{} below", remaining))
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(
            indicator,
            Rect {
                y: inner.y + inner.height - 1,
                height: 1,
                ..inner
            },
        );
    }
}

/// Render a single task card
fn render_card(f: &mut Frame, area: Rect, task: &Task, is_selected: bool, accent: Color) {
    let style = if is_selected {
        Style::default().bg(accent).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };

    let available_width = area.width.saturating_sub(2) as usize;
    let mut card_text: Vec<Line> = wrap_words(&task.name, available_width, 2)
        .into_iter()
        .map(Line::from)
        .collect();
    while card_text.len() < 2 {
        card_text.push(Line::from(""));
    }
    card_text.push(Line::from(format!(
        "{} → {}",
        format_date(task.start),
        format_date(task.due)
    )));

    let card = Paragraph::new(card_text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(card, area);
}

/// Greedy word wrap limited to `max_lines`. When the text does not fit, the last
/// line is filled with the remaining words and cut with `…`.
fn wrap_words(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let width = width.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for (i, word) in words.iter().enumerate() {
        let fits = current.is_empty() || current.chars().count() + 1 + word.chars().count() <= width;
        if fits {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if lines.len() + 1 >= max_lines {
            let full = format!("{} {}", current, words[i..].join(" "));
            let mut cut: String = full.chars().take(width.saturating_sub(1)).collect();
            cut.push('…');
            lines.push(cut);
            return lines;
        }
        lines.push(truncate(&std::mem::take(&mut current), width));
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(truncate(&current, width));
    }
    lines
}

/// One `(day index, count)` series per bucket.
fn chart_points(series: &BurndownSeries) -> Vec<Vec<(f64, f64)>> {
    (0..series.buckets().len())
        .map(|bucket| {
            series
                .rows()
                .iter()
                .enumerate()
                .map(|(x, row)| (x as f64, row.counts[bucket] as f64))
                .collect()
        })
        .collect()
}

/// First, middle and last day of the series as axis labels.
fn date_labels(series: &BurndownSeries) -> Vec<String> {
    let rows = series.rows();
    match rows.len() {
        0 => Vec::new(),
        1 | 2 => vec![rows[0].date.to_string(), rows[rows.len() - 1].date.to_string()],
        n => vec![
            rows[0].date.to_string(),
            rows[n / 2].date.to_string(),
            rows[n - 1].date.to_string(),
        ],
    }
}
