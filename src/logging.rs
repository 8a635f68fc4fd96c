//! Logging setup for applications embedding driftwatch.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber. These helpers install one:
//!
//! - [`init`]: console output filtered by `RUST_LOG` (default `info`)
//! - [`init_with_dir`]: console plus a daily rolling `driftwatch.<date>.log`
//!   and a warnings-only `error.<date>.log` in the given directory
//!
//! ```no_run
//! driftwatch::logging::init().expect("Failed to initialize logging");
//! tracing::info!("monitor started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_PREFIX: &str = "driftwatch";
const ERROR_LOG_PREFIX: &str = "error";
const MAX_LOG_FILES: usize = 10;

fn env_filter() -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")
}

/// Installs a console-only subscriber.
///
/// # Errors
///
/// Returns error if the filter is invalid or a global subscriber is already set.
pub fn init() -> Result<()> {
    let stdout_layer = fmt::layer().with_target(true).with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(stdout_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Installs a console subscriber plus rolling file appenders under `log_dir`.
///
/// # Errors
///
/// Returns error if the directory cannot be created, the appenders fail to
/// open, or a global subscriber is already set.
pub fn init_with_dir(log_dir: &Path) -> Result<()> {
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    let all_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create all-logs file appender")?;

    let error_logs_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(ERROR_LOG_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create error-logs file appender")?;

    let stdout_layer = fmt::layer().with_target(true).with_line_number(true);

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(all_logs_appender);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(error_logs_appender)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(stdout_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {:?}", log_dir);
    Ok(())
}

/// Path of today's general log file inside `log_dir`.
pub fn current_log_path(log_dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    log_dir.join(format!("{LOG_PREFIX}.{today}.log"))
}

/// Path of today's warnings-only log file inside `log_dir`.
pub fn current_error_log_path(log_dir: &Path) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    log_dir.join(format!("{ERROR_LOG_PREFIX}.{today}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_paths_are_dated() {
        let dir = Path::new("/var/log/monitor");
        let path = current_log_path(dir);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        assert!(name.starts_with("driftwatch."));
        assert!(name.ends_with(".log"));
        assert!(current_error_log_path(dir).starts_with(dir));
    }
}
