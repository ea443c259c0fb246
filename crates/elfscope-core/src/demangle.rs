//! Symbol demangling utilities.
//!
//! This module provides functions to demangle symbol names and detect their
//! programming language. It handles Rust, C++, and C symbols.
//!
//! ## Language Detection
//!
//! The module detects the language of a symbol by examining its mangling pattern:
//!
//! - Rust symbols: Start with `_R` or `_ZN` and demangle successfully
//! - C++ symbols: Start with `_Z` (Itanium mangling)
//! - C symbols: Everything else

use std::fmt;

use rustc_demangle::try_demangle;

/// Programming language associated with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLanguage
{
    /// Rust symbol (detected via mangling).
    Rust,
    /// C++ symbol (Itanium mangling without Rust extensions).
    Cpp,
    /// C symbol or unmangled global.
    C,
}

impl fmt::Display for SymbolLanguage
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolLanguage::Rust => "rust",
            SymbolLanguage::Cpp => "c++",
            SymbolLanguage::C => "c",
        };
        write!(f, "{label}")
    }
}

/// A symbol name with demangling metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolName
{
    raw: String,
    demangled: Option<String>,
}

impl SymbolName
{
    /// Wrap a raw name without attempting to demangle it.
    pub fn plain(raw: impl Into<String>) -> Self
    {
        Self {
            raw: raw.into(),
            demangled: None,
        }
    }

    /// Raw (mangled) name as stored in the string table.
    pub fn raw(&self) -> &str
    {
        &self.raw
    }

    /// Demangled human-friendly name if available.
    pub fn demangled(&self) -> Option<&str>
    {
        self.demangled.as_deref()
    }

    /// Preferred presentation (demangled fallback to raw).
    pub fn display_name(&self) -> &str
    {
        self.demangled.as_deref().unwrap_or(&self.raw)
    }

    /// Language classification for the symbol.
    pub fn language(&self) -> SymbolLanguage
    {
        if self.demangled.is_some() && (self.raw.starts_with("_R") || self.raw.starts_with("_ZN")) {
            SymbolLanguage::Rust
        } else if self.raw.starts_with("_Z") {
            SymbolLanguage::Cpp
        } else {
            SymbolLanguage::C
        }
    }
}

impl fmt::Display for SymbolName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.display_name())
    }
}

/// Create a `SymbolName` from a raw string-table entry, demangling Rust names.
pub fn make_symbol_name(raw: impl Into<String>) -> SymbolName
{
    let raw = raw.into();
    // `{:#}` drops the trailing hash of legacy Rust symbols
    let demangled = try_demangle(&raw).ok().map(|d| format!("{d:#}"));
    SymbolName { raw, demangled }
}
