//! # ELF Container Model
//!
//! Width-independent decoding of the ELF container: file header, section and
//! program headers, symbol tables, relocations, the dynamic table, symbol
//! versioning, section groups and notes.
//!
//! Everything hangs off a [`Container`], the per-file decode session. Each
//! submodule adds the passes for one kind of structure, either as free
//! functions over raw bytes (easy to test in isolation) or as methods on the
//! container that locate the input through the section or segment tables.

pub mod container;
pub mod dynamic;
pub mod group;
pub mod header;
pub mod notes;
pub mod relocation;
pub mod section;
pub mod segment;
pub mod strtab;
pub mod symbol;
pub mod version;

pub use container::Container;
pub use dynamic::{DynamicEntry, DynamicTable};
pub use group::SectionGroup;
pub use header::{parse_header, ElfClass, FileHeader};
pub use notes::Note;
pub use relocation::{Relocation, RelocationSection, SymbolRef};
pub use section::{section_header_index, section_header_number, SectionDescriptor, SectionIndex};
pub use segment::{map_address_to_offset, SegmentDescriptor, SegmentMapping};
pub use strtab::{StringTable, CORRUPT_NAME};
pub use symbol::{Symbol, SymbolTable};
pub use version::{resolve_symbol_version, VersionInfo, VersionLabel};
