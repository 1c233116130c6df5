//! Logging setup
//!
//! Stderr output plus an optional append-only log file. `RUST_LOG` overrides
//! the default level. The file sink is diagnostic only: if it cannot be
//! opened, logging continues on stderr.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Run `f` with a temporary stderr-only subscriber
///
/// Used for work that happens before [`init`] can run, such as loading the
/// config that names the log file.
pub fn bootstrap<T>(verbose: bool, f: impl FnOnce() -> T) -> T {
    let subscriber = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(default_filter(verbose))
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))
}

/// Install the global subscriber
///
/// Only fails if a global subscriber is already set.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let (file, file_error) = match log_file.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(default_filter(verbose))
    });

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(default_filter(verbose));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    if let Some(e) = file_error {
        warn!("⚠️ {:#}; logging to stderr only", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unopenable_log_file_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        assert!(open_log_file(dir.path()).is_err());
        assert!(init(false, Some(dir.path())).is_ok());
    }

    #[test]
    fn test_log_file_parent_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/narrator.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_bootstrap_installs_a_scoped_subscriber() {
        assert_eq!(bootstrap(true, || 42), 42);
        assert!(bootstrap(false, || tracing::enabled!(tracing::Level::ERROR)));
    }
}
