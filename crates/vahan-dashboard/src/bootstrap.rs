use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Create the data directory and the parent of the log file, if any.
pub fn ensure_directories(data_dir: &Path, log_file: Option<&Path>) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
    if let Some(parent) = log_file.and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to an [`EnvFilter`] directive.
pub fn filter_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr; with `log_file` set, a second non-blocking layer
/// appends plain-text lines to that file. The returned guard must be held
/// until exit or buffered file lines are lost.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_directories_creates_data_and_log_dirs() {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = tmp.path().join("vahan").join("data");
        let log_file = tmp.path().join("logs").join("vahan.log");

        ensure_directories(&data_dir, Some(&log_file)).expect("ensure_directories");

        assert!(data_dir.is_dir(), "data dir must exist");
        assert!(tmp.path().join("logs").is_dir(), "log dir must exist");
        assert!(!log_file.exists(), "log file itself is created lazily");
    }

    #[test]
    fn test_ensure_directories_bare_log_file_name() {
        let tmp = TempDir::new().expect("tempdir");
        let data_dir = tmp.path().join("data");
        ensure_directories(&data_dir, Some(Path::new("vahan.log"))).expect("ensure_directories");
        assert!(data_dir.is_dir());
    }

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("INFO"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("warning"), "warn");
        assert_eq!(filter_directive("VERBOSE"), "info");
    }
}
