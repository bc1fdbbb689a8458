//! Logging initialization.
//!
//! Sets up structured logging with tracing, pretty or JSON, to stderr or a file.

use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

// Keeps the non-blocking file writer alive until the process exits
static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

/// Initialize logging from configuration.
pub fn init_telemetry(config: &LoggingConfig) -> anyhow::Result<()> {
    match &config.file {
        Some(path) => init_telemetry_with_file(&config.level, config.json, path),
        None => init_telemetry_stderr(&config.level, config.json),
    }
}

fn init_telemetry_stderr(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

fn init_telemetry_with_file(log_level: &str, json_format: bool, log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()?;
    }

    if let Ok(mut g) = LOG_GUARD.lock() {
        *g = Some(guard);
    }

    Ok(())
}
