//! Tracing setup: human-readable stderr output plus a daily rolling log file.

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "tabula.log";

/// Installs the global subscriber. Keep the returned guard alive until exit,
/// or buffered file output is lost.
///
/// `RUST_LOG` overrides both defaults: `warn` (or `debug` when verbose) on
/// stderr and `info` in the file.
pub fn init(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "warn" };
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let file_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(stderr_filter),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .try_init()?;

    Ok(guard)
}
