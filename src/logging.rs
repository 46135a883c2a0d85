//! File tracing. The terminal owns stdout, so nothing is written there.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

pub const LOG_FILTER_ENV: &str = "CARTOLA_LOG";
const DEFAULT_FILTER: &str = "cartola_terminal=info";
const LOG_FILE_PREFIX: &str = "cartola_terminal.log";

/// Installs a daily-rolling file subscriber when `log_dir` is configured.
/// Keep the returned guard alive until shutdown so buffered lines get flushed.
pub fn init_logging(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let Some(dir) = config.log_dir.as_ref() else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log dir {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("tracing subscriber already installed")?;

    Ok(Some(guard))
}
