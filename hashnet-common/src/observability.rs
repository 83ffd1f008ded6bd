//! Shared observability helpers for the pipeline binary and integration tests.
//!
//! [`init_logging`] installs one global `tracing` subscriber that writes to a
//! daily rolling file and, optionally, mirrors events to `stderr`. Later calls
//! are no-ops that return the already resolved log file path.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

const LOG_DIR_ENV: &str = "HASHNET_LOG_DIR";

/// Output encoding for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical name of the component (used for defaults and file names).
    pub app_name: &'static str,
    /// Configured directory for log output. `HASHNET_LOG_DIR` takes
    /// precedence; with neither set we fall back to `~/.local/share/<app_name>`.
    pub log_dir: Option<PathBuf>,
    /// Whether to duplicate events to `stderr` in addition to the file sink.
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "hashnet",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info".to_string(),
        }
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Returns the log file path for the current day.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let resolved_dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&resolved_dir)
        .with_context(|| format!("failed to create log directory: {}", resolved_dir.display()))?;

    let log_filename = format!("{}.log", config.app_name);
    let today = Local::now().format("%Y-%m-%d").to_string();
    let full_path = resolved_dir.join(format!("{log_filename}.{today}"));

    let appender = rolling::daily(&resolved_dir, &log_filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match (config.format, config.emit_stderr) {
        (LogFormat::Text, false) => registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .try_init(),
        (LogFormat::Text, true) => registry
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, false) => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        (LogFormat::Json, true) => registry
            .with(fmt::layer().json().with_writer(writer))
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_PATH.set(full_path.clone());
    Ok(full_path)
}

fn resolve_log_dir(app_name: &str, configured: Option<&Path>) -> PathBuf {
    match std::env::var(LOG_DIR_ENV) {
        Ok(env_dir) if !env_dir.trim().is_empty() => expand_home(Path::new(&env_dir)),
        _ => match configured {
            Some(dir) => expand_home(dir),
            None => default_data_dir(app_name),
        },
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(app_name),
        Err(_) => PathBuf::from(".").join(app_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn configured_dir_used_without_env() {
        let tmp = tempfile::tempdir().unwrap();
        temp_env::with_var_unset(LOG_DIR_ENV, || {
            let dir = resolve_log_dir("hashnet", Some(tmp.path()));
            assert_eq!(dir, tmp.path());
        });
    }

    #[test]
    #[serial]
    fn env_dir_overrides_configured_dir() {
        let configured = tempfile::tempdir().unwrap();
        let from_env = tempfile::tempdir().unwrap();
        temp_env::with_var(LOG_DIR_ENV, Some(from_env.path()), || {
            let dir = resolve_log_dir("hashnet", Some(configured.path()));
            assert_eq!(dir, from_env.path());
        });
    }

    #[test]
    #[serial]
    fn falls_back_to_data_dir() {
        temp_env::with_vars([(LOG_DIR_ENV, None::<&str>), ("HOME", Some("/home/tester"))], || {
            assert_eq!(
                resolve_log_dir("hashnet", None),
                PathBuf::from("/home/tester/.local/share/hashnet")
            );
        });
    }

    #[test]
    fn relative_paths_are_left_alone() {
        assert_eq!(expand_home(Path::new("logs/run")), PathBuf::from("logs/run"));
    }

    #[test]
    fn log_format_reads_lowercase() {
        let f: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(f, LogFormat::Json);
    }
}
