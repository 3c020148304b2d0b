//! Per-run logging: console plus a timestamped report file.

use anyhow::Context;
use chrono::Local;
use selfsort_core::scanner::{REPORT_PREFIX, REPORT_SUFFIX};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Keeps the run's subscriber installed and flushes the report file on drop.
pub struct RunLog {
    pub path: PathBuf,
    _default: DefaultGuard,
    _file: WorkerGuard,
}

/// Installs a subscriber for the current thread writing to stderr and to
/// `<log_dir>/cleanup_report_<YYYYmmdd_HHMMSS>.log`. `RUST_LOG` overrides `level`.
pub fn start_run_log(log_dir: &Path, level: &str) -> anyhow::Result<RunLog> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let file_name = format!(
        "{}{}{}",
        REPORT_PREFIX,
        Local::now().format("%Y%m%d_%H%M%S"),
        REPORT_SUFFIX
    );
    let path = log_dir.join(&file_name);

    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("invalid log level {level:?}"))?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(file_writer),
        );

    Ok(RunLog {
        path,
        _default: tracing::subscriber::set_default(subscriber),
        _file: file_guard,
    })
}
