//! Bounds- and overflow-checked table reads.

use tracing::trace;

use crate::error::{ElfError, Result};
use crate::source::ByteSource;

/// Compute `record_size * count`, failing with [`ElfError::OutOfMemory`] on overflow
/// or when the product cannot be addressed on this host.
pub fn table_size(record_size: u64, count: u64) -> Result<u64>
{
    let total = record_size
        .checked_mul(count)
        .ok_or(ElfError::OutOfMemory { record_size, count })?;
    if usize::try_from(total).is_err() {
        return Err(ElfError::OutOfMemory { record_size, count });
    }
    Ok(total)
}

/// Read `count` records of `record_size` bytes starting at `offset`.
///
/// ## Errors
///
/// - [`ElfError::OutOfMemory`] when `record_size * count` overflows
/// - [`ElfError::TruncatedRead`] when the table extends past the end of `source`
pub fn bulk_read<S>(source: &S, offset: u64, record_size: u64, count: u64) -> Result<Vec<u8>>
where
    S: ByteSource + ?Sized,
{
    let total = table_size(record_size, count)?;
    trace!(offset, record_size, count, "bulk read");
    source.read_at(offset, total)
}
