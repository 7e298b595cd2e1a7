//! # pagetx
//!
//! Entry point of the demo engine: loads the TOML configuration, sets up logging, wires the
//! storage manager over a disk-backed table and a transaction log, then runs a concurrent insert
//! workload and reports how many transactions committed, aborted and were retried.

use crate::config::EngineConfig;
use crate::engine_environment::{DEMO_TABLE_ID, EngineEnvironment};
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

mod config;
mod engine_environment;
mod workload;

const DEFAULT_CONFIG_PATH: &str = "pagetx.toml";

fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = match EngineConfig::load_from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}: {}", e.source().map(ToString::to_string).unwrap_or_default());
            return ExitCode::FAILURE;
        }
    };

    let logging_guard = match init_logging(&config.storage.logs_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(path = %config_path, "configuration loaded");

    let env = match EngineEnvironment::new(config) {
        Ok(env) => env,
        Err(e) => {
            tracing::error!(error = %e, "cannot set up the engine");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        tables = ?env.catalog.table_ids(),
        log = %env.log.path().display(),
        "engine ready"
    );

    let workload = &env.engine_config.workload;
    tracing::info!(
        workers = workload.workers,
        transactions_per_worker = workload.transactions_per_worker,
        rows_per_transaction = workload.rows_per_transaction,
        "starting workload"
    );
    let summary = workload::run(&env.storage, DEMO_TABLE_ID, workload);

    let failed = summary.failed.load(Ordering::Relaxed);
    tracing::info!(
        committed = summary.committed.load(Ordering::Relaxed),
        aborted = summary.aborted.load(Ordering::Relaxed),
        retries = summary.retries.load(Ordering::Relaxed),
        failed,
        rows = summary.rows_inserted.load(Ordering::Relaxed),
        cached_pages = env.storage.cached_pages().len(),
        "workload finished"
    );

    drop(logging_guard);
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Sets up the logging for the engine
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    let file_appender = tracing_appender::rolling::daily(log_dir, "pagetx.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
