//! View models and plain-text renderings of the three dashboard views.
//!
//! The grouping and ordering helpers here are shared by the CLI printers and the
//! terminal UI, so both always show the same board, chart data and timeline.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::burndown::BurndownSeries;
use crate::fields::TimelineSort;
use crate::task::{status_key, Task};

/// One kanban column: the tasks whose status matches `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanbanColumn<'a> {
    pub key: String,
    pub title: String,
    pub tasks: Vec<&'a Task>,
}

/// Group tasks into the given status columns, preserving source order.
/// Tasks whose status matches no column are not shown on the board.
pub fn kanban_columns<'a, S: AsRef<str>>(tasks: &'a [Task], columns: &[S]) -> Vec<KanbanColumn<'a>> {
    columns
        .iter()
        .map(|label| {
            let key = status_key(label.as_ref());
            KanbanColumn {
                title: title_case(&key),
                tasks: tasks.iter().filter(|t| t.status_key() == key).collect(),
                key,
            }
        })
        .collect()
}

/// Tasks for the timeline table, optionally filtered to one status and sorted.
/// Tasks without the sort date go last; ties keep source order.
pub fn timeline_rows<'a>(
    tasks: &'a [Task],
    sort: TimelineSort,
    status: Option<&str>,
) -> Vec<&'a Task> {
    let wanted = status.map(status_key);
    let mut rows: Vec<&Task> = tasks
        .iter()
        .filter(|t| wanted.as_ref().map_or(true, |w| t.status_key() == *w))
        .collect();

    match sort {
        TimelineSort::Source => {}
        TimelineSort::Start => rows.sort_by_key(|t| (t.start.is_none(), t.start)),
        TimelineSort::Due => rows.sort_by_key(|t| (t.due.is_none(), t.due)),
        TimelineSort::Name => rows.sort_by_key(|t| t.name.to_lowercase()),
    }
    rows
}

/// Title-case every word ("in progress" -> "In Progress", "DONE" -> "Done").
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format an optional date for display.
pub fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Render the board as markdown-style sections with one linked line per task.
pub fn render_kanban(columns: &[KanbanColumn<'_>]) -> String {
    let mut out = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", col.title, col.tasks.len());
        if col.tasks.is_empty() {
            out.push_str("  -\n");
        }
        for t in &col.tasks {
            let _ = writeln!(out, "- [{}]({})", t.name, t.url);
        }
    }
    out
}

/// Render the timeline as a fixed-width table.
pub fn render_timeline(rows: &[&Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<40} {:<10} {:<10} {}", "Name", "Start", "Due", "Status");
    for t in rows {
        let _ = writeln!(
            out,
            "{:<40} {:<10} {:<10} {}",
            truncate(&t.name, 40),
            format_date(t.start),
            format_date(t.due),
            title_case(&t.status)
        );
    }
    out
}

/// Render the burndown series as a fixed-width table, one row per day.
pub fn render_burndown(series: &BurndownSeries) -> String {
    let mut out = String::new();
    if series.is_empty() {
        out.push_str("No tasks to chart.\n");
        return out;
    }

    let _ = write!(out, "{:<10}", "Date");
    for bucket in series.buckets() {
        let _ = write!(out, " {:>12}", truncate(&title_case(bucket), 12));
    }
    out.push('\n');
    for row in series.rows() {
        let _ = write!(out, "{:<10}", row.date);
        for count in &row.counts {
            let _ = write!(out, " {:>12}", count);
        }
        out.push('\n');
    }
    if !series.dropped().is_empty() {
        let labels: Vec<String> = series
            .dropped()
            .iter()
            .map(|(label, n)| format!("{label} ({n})"))
            .collect();
        let _ = writeln!(out, "Not charted: {}", labels.join(", "));
    }
    out
}

/// CSV export of the burndown series: `date,<bucket>,...`.
pub fn burndown_csv(series: &BurndownSeries) -> String {
    let mut out = String::from("date");
    for bucket in series.buckets() {
        out.push(',');
        out.push_str(&escape_csv(bucket));
    }
    out.push('\n');
    for row in series.rows() {
        out.push_str(&row.date.to_string());
        for count in &row.counts {
            let _ = write!(out, ",{count}");
        }
        out.push('\n');
    }
    out
}

/// Quote a CSV field that contains a delimiter, quote or newline.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
