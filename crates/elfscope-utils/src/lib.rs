//! # elfscope Utilities
//!
//! Shared utilities and helpers for elfscope.
//!
//! Currently this is the logging setup used by the command-line front end,
//! built on `tracing-subscriber`.

pub mod logging;

pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
