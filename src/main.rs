//! # sdash - Sprint dashboard for a ClickUp list
//!
//! Polls one ClickUp list and shows it three ways: a Kanban board grouped by
//! status, a cumulative burndown of status counts over time, and a timeline table
//! of start and due dates. Everything is available as an interactive terminal UI
//! and as plain-text commands for scripts.
//!
//! ## Quick Start
//!
//! ```bash
//! export CLICKUP_TOKEN=pk_...
//! export CLICKUP_LIST_ID=901234
//!
//! # Interactive dashboard
//! sdash ui
//!
//! # Plain-text views
//! sdash kanban
//! sdash burndown --csv burndown.csv
//! sdash timeline --sort due --status "in progress"
//! ```
//!
//! ## Configuration
//!
//! - `CLICKUP_TOKEN`, `CLICKUP_LIST_ID`: required.
//! - `CLICKUP_API_BASE`: API root, defaults to `https://api.clickup.com/api/v2`.
//! - `SDASH_CACHE_TTL_SECS`: how long a fetched list is reused (default 60).
//! - `SDASH_HTTP_TIMEOUT_SECS`: request timeout (default 30).
//!
//! ## Exit codes
//!
//! `11` configuration, `20` fetch or I/O, `30` malformed task data, `40` no tasks
//! with `burndown --strict`.

use std::io;

use chrono::Local;
use clap::Parser;

pub mod burndown;
pub mod cache;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod fields;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod task;
pub mod views;
pub mod tui {
    pub mod colors;
    pub mod dashboard;
    pub mod enums;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use config::Config;
use error::DashError;
use fields::EmptySeriesPolicy;
use logging::{init_tracing, LogTarget};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = real_main(cli) {
        eprintln!("sdash: {e}");
        std::process::exit(e.exit_code());
    }
}

fn real_main(cli: Cli) -> Result<(), DashError> {
    let opts = cli.burndown_options();
    let columns = cli.kanban_columns();

    match cli.command {
        // Completions need neither logging nor credentials
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Ui => {
            let config = prepare(&cli.log_level, LogTarget::File)?;
            cmd_ui(open_cache(&config)?, opts, columns, &config.list_id)
        }
        Commands::Kanban => {
            let config = prepare(&cli.log_level, LogTarget::Stderr)?;
            cmd_kanban(&mut open_cache(&config)?, &columns, &mut io::stdout().lock())
        }
        Commands::Burndown { csv, strict } => {
            let config = prepare(&cli.log_level, LogTarget::Stderr)?;
            let opts = if strict { opts.empty(EmptySeriesPolicy::Require) } else { opts };
            let today = Local::now().date_naive();
            cmd_burndown(&mut open_cache(&config)?, &opts, today, csv.as_deref(), &mut io::stdout().lock())
        }
        Commands::Timeline { sort, status } => {
            let config = prepare(&cli.log_level, LogTarget::Stderr)?;
            cmd_timeline(&mut open_cache(&config)?, sort, status.as_deref(), &mut io::stdout().lock())
        }
    }
}

/// Install logging, then read the configuration from the environment.
fn prepare(log_level: &str, target: LogTarget) -> Result<Config, DashError> {
    init_tracing(log_level, target)?;
    let config = Config::from_env()?;
    tracing::debug!(target: "sdash", config = ?config, "configuration loaded");
    Ok(config)
}
