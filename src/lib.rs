//! Micro-benchmarks for bulk mutations through a change-tracking data layer.
//!
//! A [`TestDefinition`](benchmarks::TestDefinition) names a benchmark, a
//! one-time baseline setup and a [`Workload`](benchmarks::Workload). The
//! [`TestDefinitionRunner`](benchmarks::TestDefinitionRunner) runs warmup and
//! measured iterations, each inside its own rolled-back unit of work, and
//! times only the commit of every batch.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

pub mod benchmarks;
pub mod config;
pub mod database;
pub mod error;
pub mod orders;

pub use config::{BenchConfig, TargetConfig};
pub use error::{BenchmarkError, Result};

static TRACING_GUARDS: OnceLock<Mutex<Option<(WorkerGuard, WorkerGuard)>>> = OnceLock::new();

/// Installs stdout and daily-rolling file logging. Later calls are no-ops.
pub fn init_tracing(logs_dir: &Path) -> Result<()> {
    if TRACING_GUARDS.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("update_pipeline_bench")
        .filename_suffix("log")
        .build(logs_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create file appender: {e}"))?;

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
    let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let stdout_layer = Layer::new()
        .with_writer(non_blocking_stdout)
        .with_ansi(true)
        .with_target(true);

    let file_layer = Layer::new()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    TRACING_GUARDS
        .set(Mutex::new(Some((file_guard, stdout_guard))))
        .ok();

    Ok(())
}

/// Flushes buffered log lines by dropping the writer guards.
pub fn flush_tracing() {
    if let Some(guards) = TRACING_GUARDS.get()
        && let Ok(mut guards) = guards.lock()
    {
        guards.take();
    }
}
