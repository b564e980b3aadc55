//! Tracing setup for the terminal client
//!
//! Logs go to <data dir>/folio/logs/folio.log so they never interleave with
//! the chat on stdout. `--tracing` sends everything to stderr instead.

use config::PathManager;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info,folio_core=debug,llm=info";

/// Install the global subscriber. Keep the returned guard alive until exit
/// or buffered lines are lost.
pub fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    if verbose {
        init_stderr_logging(EnvFilter::new("trace"));
        return None;
    }

    let Some(path) = PathManager::log_file_path() else {
        init_stderr_logging(EnvFilter::new("error"));
        return None;
    };

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("[folio] Failed to create log directory {:?}: {}", parent, e);
        }
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path);

    match file {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

            let subscriber = tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );

            if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                eprintln!("[folio] Failed to set tracing subscriber: {}", e);
            }
            tracing::info!("Logging initialized, writing to {:?}", path);
            Some(guard)
        }
        Err(e) => {
            eprintln!("[folio] Failed to open log file {:?}: {}", path, e);
            init_stderr_logging(EnvFilter::new("error"));
            None
        }
    }
}

fn init_stderr_logging(filter: EnvFilter) {
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}
