//! Tracing setup.
//!
//! Console commands log to stderr. The terminal UI owns the screen, so it logs
//! to `sdash.<pid>.log` in the system temp directory instead. `RUST_LOG`, when
//! set, overrides the `--log-level` flag.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::DashError;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// A per-process file in the temp directory.
    File,
}

/// Path of the log file used by [`LogTarget::File`].
pub fn log_file_path() -> PathBuf {
    std::env::temp_dir()
        .join("sdash")
        .join(format!("sdash.{}.log", std::process::id()))
}

fn build_filter(level: &str) -> Result<EnvFilter, DashError> {
    match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => Ok(EnvFilter::from_default_env()),
        _ => EnvFilter::try_new(level)
            .map_err(|e| DashError::Config(format!("invalid log level {level:?}: {e}"))),
    }
}

/// Install the global subscriber. Calling it twice is an error from
/// `tracing_subscriber`, so only `main` does.
pub fn init_tracing(level: &str, target: LogTarget) -> Result<(), DashError> {
    let filter = build_filter(level)?;

    let mut maybe_writer = None;
    if target == LogTarget::File {
        let path = log_file_path();
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        std::fs::create_dir_all(&dir)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sdash.log".into());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    let console_layer = (target == LogTarget::Stderr).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DashError::Config(format!("failed to install logger: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_is_per_process() {
        let path = log_file_path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("sdash.{}.log", std::process::id()));
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let err = build_filter("sdash=loud").unwrap_err();
        assert_eq!(err.exit_code(), 11);
    }
}
