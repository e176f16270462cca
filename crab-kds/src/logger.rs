//! Logging Infrastructure
//!
//! - 控制台输出 (plain / JSON)
//! - 可选按天滚动的日志文件 `kds.YYYY-MM-DD.log`
//! - 过期日志文件定期清理

use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, prelude::*};

const LOG_PREFIX: &str = "kds";
const LOG_SUFFIX: &str = "log";

/// Days a rotated log file is kept
pub const LOG_RETENTION_DAYS: i64 = 14;

/// Delete rotated log files older than `retention_days`
///
/// Returns the number of files removed. Files not matching
/// `kds.YYYY-MM-DD.log` are left alone.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> anyhow::Result<usize> {
    let cutoff = Local::now().date_naive() - chrono::Duration::days(retention_days);
    remove_logs_before(log_dir, cutoff)
}

fn remove_logs_before(log_dir: &Path, cutoff: NaiveDate) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(log_file_date)
        else {
            continue;
        };

        if date < cutoff {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %path.display(), "Deleted old log file");
        }
    }

    Ok(removed)
}

/// Date part of `kds.YYYY-MM-DD.log`
fn log_file_date(name: &str) -> Option<NaiveDate> {
    let date = name
        .strip_prefix(LOG_PREFIX)?
        .strip_prefix('.')?
        .strip_suffix(LOG_SUFFIX)?
        .strip_suffix('.')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug"), overridden by `RUST_LOG`
/// * `json_format` - JSON console output instead of plain text
/// * `log_dir` - Optional directory for daily rotating log files
///
/// # Examples
/// ```no_run
/// // Console only
/// crab_kds::logger::init_logger("debug", false, None)?;
///
/// // Console + file
/// crab_kds::logger::init_logger("info", true, Some("./logs"))?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let console_layer = if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let file_layer = match log_dir {
        Some(dir) => {
            let log_dir = Path::new(dir);
            fs::create_dir_all(log_dir)?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix(LOG_SUFFIX)
                .build(log_dir)?;

            // Start cleanup task
            tokio::spawn(periodic_cleanup(log_dir.to_path_buf()));

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(appender))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Periodic cleanup task - runs every hour to clean old logs
async fn periodic_cleanup(log_dir: PathBuf) {
    use tokio::time::{Duration, sleep};

    loop {
        if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
            tracing::error!(error = %e, "Failed to cleanup old logs");
        }
        sleep(Duration::from_secs(3600)).await;
    }
}
