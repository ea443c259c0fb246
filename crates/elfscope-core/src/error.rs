//! # Error Types
//!
//! General error handling for the decoder.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for decode operations
///
/// This enum represents all the ways a decode step can fail. Most variants are
/// recoverable at the level of a single pass, section or unit: the caller turns
/// them into a [`Diagnostic`](crate::Diagnostic) and carries on with the next
/// piece of the file.
///
/// ## Error Categories
///
/// 1. **Whole-file errors**: MalformedMagic, UnsupportedClass
/// 2. **Pass errors**: TruncatedRead, OutOfMemory, Io
/// 3. **Record errors**: IndexOutOfRange, Corrupt
/// 4. **DWARF errors**: UnsupportedVersion, InconsistentOrdering
#[derive(Error, Debug)]
pub enum ElfError
{
    /// The first four bytes are not `\x7fELF`
    ///
    /// Nothing else in the input is decoded once this is seen.
    #[error("Not an ELF file: bad magic bytes {0:02x?}")]
    MalformedMagic([u8; 4]),

    /// A read extends past the end of the available bytes
    ///
    /// `offset` and `len` describe the requested range, `available` the size of
    /// the buffer or source it was requested from.
    #[error("Truncated read: 0x{len:x} bytes at offset 0x{offset:x} exceed available 0x{available:x}")]
    TruncatedRead
    {
        /// Start of the requested range
        offset: u64,
        /// Number of bytes requested
        len: u64,
        /// Number of bytes actually available
        available: u64,
    },

    /// A `record_size * count` computation overflowed or the result cannot be allocated
    ///
    /// Counts come straight from untrusted file fields, so this is checked before
    /// any buffer is sized.
    #[error("Out of memory: cannot allocate {count} records of {record_size} bytes")]
    OutOfMemory
    {
        /// Size of one record in bytes
        record_size: u64,
        /// Number of records requested
        count: u64,
    },

    /// A link/info/index field names a table entry that does not exist
    #[error("Index out of range: {what} index {index} (limit {limit})")]
    IndexOutOfRange
    {
        /// What kind of index this is (e.g. "symbol", "section")
        what: &'static str,
        /// The offending index
        index: u64,
        /// Number of valid entries
        limit: u64,
    },

    /// A DWARF unit or line program uses a version this decoder does not handle
    #[error("Unsupported DWARF version {version} at offset 0x{offset:x} (only versions 2 and 3 are supported)")]
    UnsupportedVersion
    {
        /// Section offset of the unit header
        offset: u64,
        /// Version number found in the header
        version: u16,
    },

    /// Location or range list offsets are not in ascending order within a unit
    #[error("Inconsistent ordering: {0}")]
    InconsistentOrdering(String),

    /// The ELF class byte is neither ELFCLASS32 nor ELFCLASS64
    #[error("Unsupported ELF class {0}")]
    UnsupportedClass(u8),

    /// A structure failed validation
    #[error("Corrupt {what} at offset 0x{offset:x}: {reason}")]
    Corrupt
    {
        /// What was being decoded
        what: &'static str,
        /// Offset of the offending structure
        offset: u64,
        /// Description of the problem
        reason: String,
    },

    /// I/O error from the underlying byte source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ElfError
{
    /// Build a [`ElfError::Corrupt`] error.
    pub fn corrupt(what: &'static str, offset: u64, reason: impl Into<String>) -> Self
    {
        ElfError::Corrupt {
            what,
            offset,
            reason: reason.into(),
        }
    }

    /// Whether this error aborts decoding of the whole file.
    #[must_use]
    pub fn is_fatal(&self) -> bool
    {
        matches!(self, ElfError::MalformedMagic(_) | ElfError::UnsupportedClass(_))
    }

    /// Offset in the input that this error is attributable to, if known.
    #[must_use]
    pub fn offset(&self) -> Option<u64>
    {
        match self {
            ElfError::TruncatedRead { offset, .. }
            | ElfError::UnsupportedVersion { offset, .. }
            | ElfError::Corrupt { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Convenience type alias for `Result<T, ElfError>`
///
/// ```rust
/// use elfscope_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, ElfError>;
