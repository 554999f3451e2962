//! Tracing subscriber setup.
//!
//! The terminal is owned by the UI, so all log output goes to a file.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

/// Install the global subscriber writing to `log_file_path`.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_global(log_file_path: &Path, default_level: &str) -> Result<()> {
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = File::create(log_file_path)?;
    build_subscriber(log_file, default_level).init();
    Ok(())
}

/// Subscriber configuration shared between the application and tests.
pub fn build_subscriber(
    log_file: File,
    default_level: &str,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_events_at_or_above_level() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), "info");

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(id = "a", "item added");
            tracing::debug!("hidden detail");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        // RUST_LOG may override the default in some environments.
        if std::env::var("RUST_LOG").is_err() {
            assert!(contents.contains("item added"));
            assert!(!contents.contains("hidden detail"));
        }
    }

    #[test]
    fn debug_level_includes_debug_events() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), "debug");
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(seq = 1, "load started");
        });
        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        if std::env::var("RUST_LOG").is_err() {
            assert!(contents.contains("load started"));
        }
    }
}
