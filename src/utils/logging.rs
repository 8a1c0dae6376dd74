/// tracing subscriber setup
///
/// Filter comes from METRICS_DASH_LOG, then RUST_LOG, then the verbosity flag.
/// The interactive dashboard owns the terminal, so it logs to a file instead.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn env_filter(verbose: bool) -> EnvFilter {
    std::env::var("METRICS_DASH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        )
}

/// Log to stderr
pub fn init_logging(verbose: bool) {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

/// Log to a file (appending), creating its directory if needed
pub fn init_file_logging(verbose: bool, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {}", err);
    }

    Ok(())
}

/// Default log file for the interactive dashboard
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("metrics-dash")
        .join("dashboard.log")
}
