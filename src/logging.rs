//! Logging for the portal
//!
//! Logs go to stderr and to two daily-rotated files in the log directory:
//!
//! - `reportcard.<date>.log`: everything at the active level
//! - `error.<date>.log`: warnings and errors only
//!
//! `RUST_LOG` overrides the default `info` level. PINs are never logged in
//! full; see [`crate::ledger::mask_pin`].
//!
//! ```no_run
//! use reportcard::logging;
//!
//! logging::init(None).expect("Failed to initialize logging");
//! tracing::info!("Portal started");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const LOG_PREFIX: &str = "reportcard";
const ERROR_LOG_PREFIX: &str = "error";
const MAX_LOG_FILES: usize = 10;

/// Resolve and create the log directory.
///
/// Uses `configured` when given, otherwise the platform data directory:
/// - Windows: `%APPDATA%/reportcard/logs`
/// - macOS: `~/Library/Application Support/reportcard/logs`
/// - Linux: `~/.local/share/reportcard/logs`
pub fn get_log_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let log_dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .context("Failed to determine data directory")?
            .join("reportcard")
            .join("logs"),
    };

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

/// Install the global subscriber. Call once, before serving.
///
/// # Errors
///
/// Returns error if the log directory or the file appenders cannot be created.
pub fn init(configured_dir: Option<&Path>) -> Result<()> {
    let log_dir = get_log_dir(configured_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    // stdout carries command output, so the console layer writes to stderr
    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender(&log_dir, LOG_PREFIX)?);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(appender(&log_dir, ERROR_LOG_PREFIX)?)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}

fn dated_log_path(log_dir: &Path, prefix: &str) -> PathBuf {
    let today = chrono::Local::now().format("%Y-%m-%d");
    log_dir.join(format!("{prefix}.{today}.log"))
}

/// Path of today's main log file
pub fn get_current_log_path(configured_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(dated_log_path(&get_log_dir(configured_dir)?, LOG_PREFIX))
}

/// Path of today's error log file
pub fn get_current_error_log_path(configured_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(dated_log_path(
        &get_log_dir(configured_dir)?,
        ERROR_LOG_PREFIX,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_log_dir_is_created() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let wanted = tmp.path().join("portal").join("logs");

        let log_dir = get_log_dir(Some(&wanted))?;
        assert_eq!(log_dir, wanted);
        assert!(log_dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_current_log_paths() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let log = get_current_log_path(Some(tmp.path()))?;
        let errors = get_current_error_log_path(Some(tmp.path()))?;

        let log_name = log.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(log_name.starts_with("reportcard.") && log_name.ends_with(".log"));
        assert!(errors.starts_with(tmp.path()));
        Ok(())
    }
}
