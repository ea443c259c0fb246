//! # Logging Utilities
//!
//! Logging infrastructure for elfscope using `tracing`.
//!
//! Dump output goes to stdout, so every log line goes to stderr (and
//! optionally a file) where it cannot interleave with it. Supported:
//! - Pretty or JSON output
//! - Level filtering through `RUST_LOG` or an explicit level
//! - An optional daily-rolling log file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elfscope_utils::init_logging;
//!
//! // Keep the guard alive until exit so buffered file output is flushed.
//! let _guard = init_logging(None).expect("Failed to initialize logging");
//! tracing::warn!("section header table is truncated");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g., `RUST_LOG=debug`, `RUST_LOG=elfscope_core::dwarf=trace`)
//! - `ELFSCOPE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `ELFSCOPE_LOG_FILE`: Optional path of a log file written in addition to stderr

use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_VAR: &str = "ELFSCOPE_LOG_FORMAT";
/// Environment variable naming an additional log file.
pub const LOG_FILE_VAR: &str = "ELFSCOPE_LOG_FILE";

/// Level used when neither `--log-level` nor `RUST_LOG` says otherwise.
///
/// Diagnostics are mirrored as `warn`/`error` events, so this shows them
/// without the per-pass `debug` chatter.
pub const DEFAULT_LEVEL: LogLevel = LogLevel::Warn;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable (default)
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_owned())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    /// Most verbose; includes per-record decoder tracing.
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl LogLevel
{
    /// The filter directive for this level.
    pub fn as_str(self) -> &'static str
    {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_owned())),
        }
    }
}

/// Keeps the background file writer alive. Dropping it flushes the file.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment.
///
/// `level` comes from the `--log-level` flag and takes precedence over
/// `RUST_LOG`. Without either, [`DEFAULT_LEVEL`] applies.
///
/// ## Errors
///
/// Returns an error if:
/// - `ELFSCOPE_LOG_FORMAT` holds an unknown format
/// - `RUST_LOG` is not a valid filter directive
/// - A global subscriber is already installed
pub fn init_logging(level: Option<LogLevel>) -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_VAR) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::Pretty,
    };
    let directives = filter_directives(level, env::var("RUST_LOG").ok().as_deref());
    let log_file = env::var(LOG_FILE_VAR).ok().map(PathBuf::from);
    init_logging_with(format, &directives, log_file.as_deref())
}

/// Initialize logging with an explicit level and format, ignoring the environment.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_with(format, level.as_str(), None)
}

/// Resolve the filter directives: explicit level, then `RUST_LOG`, then the default.
pub fn filter_directives(level: Option<LogLevel>, rust_log: Option<&str>) -> String
{
    if let Some(level) = level {
        return level.as_str().to_owned();
    }
    match rust_log.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_owned(),
        _ => DEFAULT_LEVEL.as_str().to_owned(),
    }
}

fn layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
    }
}

fn env_filter(directives: &str) -> Result<EnvFilter, LoggingError>
{
    EnvFilter::try_new(directives).map_err(|err| LoggingError::InvalidFilter(format!("{directives}: {err}")))
}

fn init_logging_with(format: LogFormat, directives: &str, log_file: Option<&Path>) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![layer(format, io::stderr, io::stderr().is_terminal(), env_filter(directives)?)];
    let mut guard = LoggingGuard::default();

    if let Some(path) = log_file {
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file_name = path
            .file_name()
            .ok_or_else(|| LoggingError::InvalidFile(path.display().to_string()))?;
        std::fs::create_dir_all(directory)?;
        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        layers.push(layer(format, writer, false, env_filter(directives)?));
        guard._file = Some(file_guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid log file path: {0}")]
    InvalidFile(String),

    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert!(matches!(LogFormat::from_str("yaml"), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(matches!(LogLevel::from_str("loud"), Err(LoggingError::InvalidLevel(_))));
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
    }

    #[test]
    fn test_explicit_level_beats_rust_log()
    {
        assert_eq!(filter_directives(Some(LogLevel::Debug), Some("trace")), "debug");
    }

    #[test]
    fn test_invalid_directives()
    {
        assert!(matches!(env_filter("elfscope=loud"), Err(LoggingError::InvalidFilter(_))));
    }

    #[test]
    fn test_filter_falls_back_to_default()
    {
        assert_eq!(filter_directives(None, None), "warn");
        assert_eq!(filter_directives(None, Some("  ")), "warn");
        assert_eq!(
            filter_directives(None, Some("elfscope_core=trace")),
            "elfscope_core=trace"
        );
    }
}
