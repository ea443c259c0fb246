//! # elfscope-core
//!
//! Structural decoding of ELF object files and the DWARF debug information
//! embedded in them.
//!
//! This crate provides the read-only analysis layer of elfscope, including:
//! - Primitive readers (endianness-aware integers, LEB128, bounds-checked bulk reads)
//! - The ELF container model (file header, sections, segments, symbols, relocations)
//! - Dynamic table and symbol versioning resolution
//! - Per-architecture naming tables for relocation types, dynamic tags and more
//! - DWARF decoding (abbreviations, DIE trees, location expressions, line programs,
//!   call-frame programs, deferred location/range lists)
//! - IA-64 and PA-RISC unwind table decoding
//!
//! ## Error model
//!
//! Corruption inside a single section, unit or record never aborts the whole file.
//! Those conditions are pushed as [`Diagnostic`]s and the affected output degrades
//! to a placeholder. Only a bad magic number, an unreadable file header or an
//! unsupported ELF class abort decoding of the file.
//!
//! ## Example
//!
//! ```rust,no_run
//! use elfscope_core::{decode, DecodeOptions, DumpRequest, FileSource};
//!
//! # fn example() -> elfscope_core::Result<()> {
//! let source = FileSource::open("/bin/true")?;
//! let report = decode(&source, &DumpRequest::all(), &DecodeOptions::default())?;
//! println!("machine: {}", elfscope_core::arch::machine_name(report.header.machine));
//! for diagnostic in &report.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod arch;
pub mod demangle;
pub mod diagnostics;
pub mod dwarf;
pub mod elf;
pub mod error;
pub mod options;
pub mod prelude;
pub mod reader;
pub mod report;
pub mod source;
pub mod unwind;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use elf::Container;
pub use error::{ElfError, Result};
pub use options::DecodeOptions;
pub use report::{decode, DebugDump, DebugReport, DecodeReport, DumpRequest, UnwindReport};
pub use source::{ByteSource, FileSource, SliceSource, SubSource};
