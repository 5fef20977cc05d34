use clap::Parser;

use crate::burndown::BurndownOptions;
use crate::cmd::Commands;
use crate::fields::{UnknownStatusPolicy, DEFAULT_COLUMNS};

/// Sprint dashboard for a ClickUp list.
/// Reads CLICKUP_TOKEN and CLICKUP_LIST_ID from the environment.
#[derive(Parser, Debug)]
#[command(name = "sdash", version, about = "Kanban, burndown and timeline views of a ClickUp list")]
pub struct Cli {
    /// Status charted on the burndown. May be repeated. Default: todo, in progress, done.
    #[arg(long = "bucket", global = true)]
    pub buckets: Vec<String>,

    /// Kanban column status, in board order. May be repeated.
    /// Default: to do, in progress, review, done.
    #[arg(long = "column", global = true)]
    pub columns: Vec<String>,

    /// What to do with statuses that are not a burndown bucket.
    #[arg(long, value_enum, global = true, default_value_t = UnknownStatusPolicy::Warn)]
    pub unknown_status: UnknownStatusPolicy,

    /// Log filter, e.g. "info" or "sdash=debug". RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Burndown options from `--bucket` and `--unknown-status`.
    pub fn burndown_options(&self) -> BurndownOptions {
        let opts = if self.buckets.is_empty() {
            BurndownOptions::default()
        } else {
            BurndownOptions::with_buckets(&self.buckets)
        };
        opts.unknown_status(self.unknown_status)
    }

    /// Kanban columns from `--column`, falling back to the default board.
    pub fn kanban_columns(&self) -> Vec<String> {
        if self.columns.is_empty() {
            DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect()
        } else {
            self.columns.clone()
        }
    }
}
