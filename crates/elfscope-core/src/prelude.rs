//! Common module for library exports

pub use crate::arch::{guess_relocation_style, RelocationStyle};
pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
pub use crate::elf::{Container, FileHeader, SectionDescriptor, SectionIndex, SegmentDescriptor, Symbol};
pub use crate::error::{ElfError, Result};
pub use crate::options::DecodeOptions;
pub use crate::reader::ByteOrder;
pub use crate::report::{decode, DebugDump, DecodeReport, DumpRequest};
pub use crate::source::{ByteSource, FileSource, SliceSource, SubSource};
