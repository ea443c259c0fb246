//! # Diagnostics
//!
//! Structured diagnostic stream produced while decoding.
//!
//! Every diagnostic carries the section (or pseudo-section such as
//! `"file header"`) and offset it is attributable to, so a user can locate the
//! corruption in the original file. Each entry is also mirrored to `tracing` at
//! `warn` or `error` level when it is recorded.

use std::fmt;

use tracing::{error, warn};

use crate::error::ElfError;

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity
{
    /// Decoding continues; the affected output is marked corrupt or incomplete.
    Warning,
    /// The current pass aborted; other passes may still run.
    Fatal,
}

impl fmt::Display for Severity
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            Severity::Warning => "warning",
            Severity::Fatal => "error",
        };
        write!(f, "{label}")
    }
}

/// One entry of the diagnostic stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic
{
    /// Warning or fatal
    pub severity: Severity,
    /// Section name (or pass name) the problem belongs to
    pub section: Option<String>,
    /// File or section offset of the problem
    pub offset: Option<u64>,
    /// Human-readable description
    pub message: String,
}

impl fmt::Display for Diagnostic
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.severity)?;
        if let Some(section) = &self.section {
            write!(f, " [{section}]")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " @0x{offset:x}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Collector for diagnostics raised during one decode session.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics
{
    entries: Vec<Diagnostic>,
}

impl Diagnostics
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Record a warning.
    pub fn warn(&mut self, section: Option<&str>, offset: Option<u64>, message: impl Into<String>)
    {
        let message = message.into();
        warn!(section = section.unwrap_or("-"), offset = offset.unwrap_or(0), "{message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            section: section.map(str::to_owned),
            offset,
            message,
        });
    }

    /// Record a pass-aborting error.
    pub fn fatal(&mut self, section: Option<&str>, offset: Option<u64>, message: impl Into<String>)
    {
        let message = message.into();
        error!(section = section.unwrap_or("-"), offset = offset.unwrap_or(0), "{message}");
        self.entries.push(Diagnostic {
            severity: Severity::Fatal,
            section: section.map(str::to_owned),
            offset,
            message,
        });
    }

    /// Record an [`ElfError`] that aborted a pass.
    pub fn record_error(&mut self, section: Option<&str>, err: &ElfError)
    {
        self.fatal(section, err.offset(), err.to_string());
    }

    /// Record an [`ElfError`] that was recovered from.
    pub fn record_warning(&mut self, section: Option<&str>, err: &ElfError)
    {
        self.warn(section, err.offset(), err.to_string());
    }

    pub fn extend(&mut self, other: Diagnostics)
    {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic>
    {
        self.entries.iter()
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Number of warnings recorded so far.
    pub fn warning_count(&self) -> usize
    {
        self.entries.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    /// Whether any pass aborted.
    pub fn has_fatal(&self) -> bool
    {
        self.entries.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Whether any recorded message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool
    {
        self.entries.iter().any(|d| d.message.contains(needle))
    }

    pub fn into_vec(self) -> Vec<Diagnostic>
    {
        self.entries
    }
}
