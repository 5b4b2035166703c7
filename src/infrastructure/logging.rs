//! Tracing initialization
//!
//! Console output always; an optional daily-rolled file when a log directory
//! is configured. Non-blocking writer guards are parked for the process
//! lifetime so buffered lines are flushed on shutdown.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::sync::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::config::LoggingConfig;

lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

struct UtcTimeFormatter;

impl FormatTime for UtcTimeFormatter {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("invalid log filter directive")?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_timer(UtcTimeFormatter)
        .with_target(false);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer);

    if let Some(dir) = &config.file_dir {
        let appender = tracing_appender::rolling::daily(dir, "reel-metrics.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }
        let file_layer = tracing_subscriber::fmt::layer()
            .with_timer(UtcTimeFormatter)
            .with_ansi(false)
            .with_writer(writer);
        registry
            .with(file_layer)
            .try_init()
            .context("installing tracing subscriber")?;
    } else {
        registry.try_init().context("installing tracing subscriber")?;
    }
    Ok(())
}
