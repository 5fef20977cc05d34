//! Subcommands and their handlers.
//!
//! Each `cmd_*` function runs one pipeline pass through the cache and writes its
//! view to `out`. The binary passes stdout; tests pass a buffer and a fake source.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::burndown::BurndownOptions;
use crate::cache::TaskCache;
use crate::config::Config;
use crate::error::DashError;
use crate::fields::TimelineSort;
use crate::pipeline::{load_tasks, snapshot};
use crate::source::{ClickUpSource, TaskSource};
use crate::tui::dashboard::DashboardApp;
use crate::tui::run::run_dashboard;
use crate::views::{burndown_csv, kanban_columns, render_burndown, render_kanban, render_timeline, timeline_rows};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive dashboard (Kanban, Burndown and Timeline tabs).
    Ui,

    /// Print the kanban board, one linked line per task.
    Kanban,

    /// Print the cumulative burndown series.
    Burndown {
        /// Write the series as CSV to this path instead of printing a table.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Fail when there are no tasks instead of printing an empty chart.
        #[arg(long)]
        strict: bool,
    },

    /// Print the timeline table: name, start, due, status.
    Timeline {
        /// Sort key.
        #[arg(long, value_enum, default_value_t = TimelineSort::Source)]
        sort: TimelineSort,
        /// Only show tasks with this status.
        #[arg(long)]
        status: Option<String>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Cache over the ClickUp source described by `config`.
pub fn open_cache(config: &Config) -> Result<TaskCache<ClickUpSource>, DashError> {
    let source = ClickUpSource::new(config)?;
    Ok(TaskCache::new(source, config.cache_ttl))
}

/// Launch the terminal user interface.
pub fn cmd_ui<S: TaskSource>(
    cache: TaskCache<S>,
    opts: BurndownOptions,
    columns: Vec<String>,
    list_id: &str,
) -> Result<(), DashError> {
    let mut app = DashboardApp::new(cache, opts, columns, list_id);
    run_dashboard(&mut app)?;
    Ok(())
}

/// Print tasks grouped into kanban columns.
pub fn cmd_kanban<S: TaskSource, W: Write>(
    cache: &mut TaskCache<S>,
    columns: &[String],
    out: &mut W,
) -> Result<(), DashError> {
    let tasks = load_tasks(cache)?;
    let board = kanban_columns(&tasks, columns);
    out.write_all(render_kanban(&board).as_bytes())?;
    Ok(())
}

/// Print the burndown table, or export it as CSV when `csv` is given.
pub fn cmd_burndown<S: TaskSource, W: Write>(
    cache: &mut TaskCache<S>,
    opts: &BurndownOptions,
    today: NaiveDate,
    csv: Option<&Path>,
    out: &mut W,
) -> Result<(), DashError> {
    let snap = snapshot(cache, opts, today)?;
    match csv {
        Some(path) => {
            std::fs::write(path, burndown_csv(&snap.series))?;
            tracing::info!(target: "sdash.cmd", path = %path.display(), days = snap.series.len(), "wrote burndown csv");
            writeln!(out, "Exported {} day(s) to {}", snap.series.len(), path.display())?;
        }
        None => out.write_all(render_burndown(&snap.series).as_bytes())?,
    }
    Ok(())
}

/// Print the timeline table.
pub fn cmd_timeline<S: TaskSource, W: Write>(
    cache: &mut TaskCache<S>,
    sort: TimelineSort,
    status: Option<&str>,
    out: &mut W,
) -> Result<(), DashError> {
    let tasks = load_tasks(cache)?;
    let rows = timeline_rows(&tasks, sort, status);
    out.write_all(render_timeline(&rows).as_bytes())?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fields::{EmptySeriesPolicy, DEFAULT_COLUMNS};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct StaticSource(Vec<Value>);

    impl TaskSource for StaticSource {
        fn fetch_tasks(&self) -> Result<Vec<Value>, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn cache(records: Vec<Value>) -> TaskCache<StaticSource> {
        TaskCache::new(StaticSource(records), Duration::from_secs(60))
    }

    fn sample() -> Vec<Value> {
        vec![
            json!({"id": "a1", "name": "Login page", "status": {"status": "to do"}, "due_date": "1704412800000"}),
            json!({"id": "b2", "name": "Release", "status": {"status": "done"}, "start_date": "2024-01-02"}),
        ]
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn columns() -> Vec<String> {
        DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_cmd_kanban_output() {
        let mut out = Vec::new();
        cmd_kanban(&mut cache(sample()), &columns()[..1], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "To Do (1)\n- [Login page](https://app.clickup.com/t/a1)\n"
        );
    }

    #[test]
    fn test_cmd_burndown_csv_file() {
        let path = std::env::temp_dir().join(format!("sdash-test-{}.csv", std::process::id()));
        let mut out = Vec::new();
        cmd_burndown(&mut cache(sample()), &BurndownOptions::with_buckets(["to do", "done"]), today(), Some(&path), &mut out)
            .unwrap();

        let csv = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            csv,
            "date,to do,done\n2024-01-02,0,1\n2024-01-03,0,1\n2024-01-04,0,1\n2024-01-05,1,1\n"
        );
        assert!(String::from_utf8(out).unwrap().starts_with("Exported 4 day(s)"));
    }

    #[test]
    fn test_cmd_burndown_strict_empty() {
        let opts = BurndownOptions::default().empty(EmptySeriesPolicy::Require);
        let err = cmd_burndown(&mut cache(vec![]), &opts, today(), None, &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 40);

        let mut out = Vec::new();
        cmd_burndown(&mut cache(vec![]), &BurndownOptions::default(), today(), None, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No tasks to chart.\n");
    }

    #[test]
    fn test_cmd_timeline_filters_status() {
        let mut out = Vec::new();
        cmd_timeline(&mut cache(sample()), TimelineSort::Due, Some("Done"), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Release"));
        assert!(!text.contains("Login page"));
    }

    #[test]
    fn test_malformed_record_exit_code() {
        let records = vec![json!({"id": "x", "status": {"status": "done"}})];
        let err = cmd_kanban(&mut cache(records), &columns(), &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 30);
    }
}
