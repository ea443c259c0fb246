//! # Primitive Reader
//!
//! Endianness-parameterised integer extraction, LEB128 decoding, overflow-checked
//! bulk reads and a bounds-checked cursor.
//!
//! The byte order is chosen once per file (from the ELF identification bytes)
//! and threaded explicitly into every decode call as a [`ByteOrder`] value.

pub mod bulk;
pub mod cursor;
pub mod endian;
pub mod leb128;

pub use bulk::{bulk_read, table_size};
pub use cursor::Cursor;
pub use endian::{read_sint, read_uint, write_uint, ByteOrder};
pub use leb128::{read_sleb128, read_uleb128, write_sleb128, write_uleb128};
