//! Structured logging for bad-apple
//!
//! Logging uses `tracing` with a pretty or JSON formatter on stderr and an
//! optional append-only log file. Instead of installing a process-wide
//! subscriber, [`build_dispatch`] returns a [`Dispatch`] that the
//! [`Reducer`](crate::reducer::Reducer) holds and installs as the scoped
//! default for the duration of a run.
//!
//! # Usage
//!
//! ```ignore
//! use bad_apple_core::logging::{build_dispatch, LogConfig};
//!
//! let dispatch = build_dispatch(&LogConfig::for_verbosity(2))?;
//! let reducer = Reducer::new(runner).with_dispatch(dispatch);
//! ```
//!
//! # Fields
//!
//! Events about a tested range carry `range`, `lines` and, once the command
//! exits, `exit_code` (absent when the command was killed by a signal).
//!
//! stdout is reserved for failing lines and reports; logs never go there.

pub use crate::config::LogFormat;
use crate::config::level_for_verbosity;
use std::io::{self, IsTerminal};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG environment variable
    pub level: String,

    /// Output format (pretty or json)
    pub format: LogFormat,

    /// Optional path to log file, appended to alongside stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LogConfig {
    /// Configuration for a `-v` repetition count.
    #[must_use]
    pub fn for_verbosity(verbose: u8) -> Self {
        Self {
            level: level_for_verbosity(verbose).to_string(),
            ..Self::default()
        }
    }
}

/// Error type for logging setup
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("failed to open log file")]
    FileCreate(#[from] io::Error),
}

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

fn ensure_parent_dir(path: &std::path::Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn open_log_file(path: &std::path::Path) -> io::Result<std::fs::File> {
    ensure_parent_dir(path)?;
    let existed = path.exists();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    #[cfg(unix)]
    if !existed {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    #[cfg(not(unix))]
    let _ = existed;
    Ok(file)
}

/// Build the filter for `config`, letting `RUST_LOG` take precedence.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|_| LogError::InvalidLevel(config.level.clone()))
}

/// Build a logging dispatcher writing to stderr (and the configured file).
///
/// Nothing is installed globally; callers decide where the dispatcher is
/// the default.
pub fn build_dispatch(config: &LogConfig) -> Result<Dispatch, LogError> {
    let ansi = io::stderr().is_terminal();
    build_dispatch_with(env_filter(config)?, config, std::io::stderr, ansi)
}

fn build_dispatch_with<W>(
    filter: EnvFilter,
    config: &LogConfig,
    writer: W,
    ansi: bool,
) -> Result<Dispatch, LogError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    match config.format {
        LogFormat::Pretty => layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_ansi(ansi)
                .boxed(),
        ),
        LogFormat::Json => layers.push(
            fmt::layer()
                .json()
                .with_timer(SystemTime)
                .with_writer(writer)
                .with_target(true)
                .flatten_event(true)
                .boxed(),
        ),
    }

    if let Some(path) = &config.file {
        let file = Mutex::new(open_log_file(path)?);
        match config.format {
            LogFormat::Pretty => layers.push(
                fmt::layer()
                    .with_writer(file)
                    .with_target(true)
                    .with_ansi(false)
                    .boxed(),
            ),
            LogFormat::Json => layers.push(
                fmt::layer()
                    .json()
                    .with_timer(SystemTime)
                    .with_writer(file)
                    .with_target(true)
                    .flatten_event(true)
                    .boxed(),
            ),
        }
    }

    let subscriber = tracing_subscriber::registry().with(filter).with(layers);
    Ok(Dispatch::new(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// A mock writer that captures output to a shared buffer for testing
    #[derive(Clone)]
    struct MockLogWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl MockLogWriter {
        fn new() -> Self {
            Self {
                buffer: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn contents(&self) -> String {
            String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for MockLogWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for MockLogWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(verbose: u8, format: LogFormat) -> (Dispatch, MockLogWriter) {
        let writer = MockLogWriter::new();
        let config = LogConfig {
            format,
            ..LogConfig::for_verbosity(verbose)
        };
        let dispatch = build_dispatch_with(
            EnvFilter::new(&config.level),
            &config,
            writer.clone(),
            false,
        )
        .unwrap();
        (dispatch, writer)
    }

    #[test]
    fn default_config_is_warn_pretty() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn quiet_dispatch_drops_debug_events() {
        let (dispatch, writer) = capture(0, LogFormat::Pretty);
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!(range = "[0, 4)", "testing range");
            tracing::info!("executing");
            tracing::warn!("kept");
        });
        let output = writer.contents();
        assert!(!output.contains("testing range"));
        assert!(!output.contains("executing"));
        assert!(output.contains("kept"));
    }

    #[test]
    fn debug_dispatch_keeps_range_events() {
        let (dispatch, writer) = capture(2, LogFormat::Pretty);
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!(range = "[0, 4)", exit_code = 1, "command exited");
        });
        let output = writer.contents();
        assert!(output.contains("command exited"));
        assert!(output.contains("exit_code=1"));
    }

    #[test]
    fn json_logs_are_parseable() {
        let (dispatch, writer) = capture(1, LogFormat::Json);
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(range = "[2, 3)", lines = 1u64, "testing range");
        });

        let output = writer.contents();
        let line = output.lines().find(|line| !line.trim().is_empty()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();

        assert!(parsed.get("timestamp").is_some());
        assert_eq!(parsed.get("range").and_then(|v| v.as_str()), Some("[2, 3)"));
        assert_eq!(
            parsed.get("lines").and_then(serde_json::Value::as_u64),
            Some(1)
        );
    }

    #[test]
    fn log_file_receives_events() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("bad-apple.log");
        let writer = MockLogWriter::new();
        let config = LogConfig {
            file: Some(path.clone()),
            ..LogConfig::for_verbosity(1)
        };
        let dispatch =
            build_dispatch_with(EnvFilter::new("info"), &config, writer, false).unwrap();
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!("to the file");
        });
        drop(dispatch);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("to the file"));

        #[cfg(unix)]
        {
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn invalid_level_rejected_without_env_override() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "bad_apple=loud".to_string(),
            ..LogConfig::default()
        };
        assert!(matches!(
            env_filter(&config),
            Err(LogError::InvalidLevel(_))
        ));
    }

    #[test]
    fn log_error_display() {
        assert_eq!(
            LogError::InvalidLevel("loud".to_string()).to_string(),
            "invalid log level: loud"
        );
    }
}
