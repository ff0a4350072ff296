//! Logging setup for storeaudit.
//!
//! Console output plus daily-rolling files in the platform data directory:
//!
//! - `storeaudit.<date>.log`: everything the env filter lets through
//! - `error.<date>.log`: warnings and errors only
//!
//! Ten files of each kind are retained. `RUST_LOG` overrides the default
//! `info` level.
//!
//! ```no_run
//! storeaudit::logging::init(None, true).expect("Failed to initialize logging");
//! tracing::info!("ready");
//! ```

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const APP_DIR: &str = "storeaudit";
const MAX_LOG_FILES: usize = 10;

/// Default log directory, created on demand.
///
/// - Windows: `%APPDATA%/storeaudit/logs`
/// - macOS: `~/Library/Application Support/storeaudit/logs`
/// - Linux: `~/.local/share/storeaudit/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    Ok(base_dir.join(APP_DIR).join("logs"))
}

fn rolling_appender(dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("Failed to create {prefix} log appender"))
}

fn env_filter() -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")
}

/// Installs the global subscriber.
///
/// With `file_logging` off only the console layer is installed and
/// `log_dir` is ignored.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or an appender
/// cannot be built.
pub fn init(log_dir: Option<&Path>, file_logging: bool) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    if !file_logging {
        tracing_subscriber::registry()
            .with(env_filter()?)
            .with(console_layer)
            .init();
        return Ok(());
    }

    let log_dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => get_log_dir()?,
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let all_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(rolling_appender(&log_dir, APP_DIR)?);

    let error_logs_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(rolling_appender(&log_dir, "error")?)
        .with_filter(EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter()?)
        .with(console_layer)
        .with(all_logs_layer)
        .with(error_logs_layer)
        .init();

    tracing::debug!("Logging initialized, log directory: {}", log_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_log_dir() {
        let log_dir = get_log_dir().expect("Failed to get log dir");
        assert!(log_dir.ends_with("storeaudit/logs") || log_dir.ends_with("storeaudit\\logs"));
    }
}
