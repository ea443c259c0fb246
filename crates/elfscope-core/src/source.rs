//! # Byte Sources
//!
//! Random-access byte sources the decoder reads from.
//!
//! All decoder offsets are relative to the start of a [`ByteSource`]. Archive
//! members are handled by wrapping the archive in a [`SubSource`] whose base is
//! the member's start, which keeps the core independent of archive iteration.

use std::cell::RefCell;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{ElfError, Result};

/// A seekable, read-only source of bytes.
pub trait ByteSource
{
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns [`ElfError::TruncatedRead`] when the range extends past [`size`](Self::size).
    fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>>;

    /// Total number of bytes available.
    fn size(&self) -> u64;
}

/// Validate that `[offset, offset + len)` lies inside a source of `size` bytes.
pub(crate) fn check_range(offset: u64, len: u64, size: u64) -> Result<()>
{
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(ElfError::TruncatedRead {
            offset,
            len,
            available: size.saturating_sub(offset),
        }),
    }
}

/// An in-memory byte source.
#[derive(Debug, Clone, Copy)]
pub struct SliceSource<'a>
{
    data: &'a [u8],
}

impl<'a> SliceSource<'a>
{
    pub fn new(data: &'a [u8]) -> Self
    {
        Self { data }
    }
}

impl ByteSource for SliceSource<'_>
{
    fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>>
    {
        check_range(offset, len, self.data.len() as u64)?;
        let start = offset as usize;
        Ok(self.data[start..start + len as usize].to_vec())
    }

    fn size(&self) -> u64
    {
        self.data.len() as u64
    }
}

impl ByteSource for Vec<u8>
{
    fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>>
    {
        SliceSource::new(self).read_at(offset, len)
    }

    fn size(&self) -> u64
    {
        self.len() as u64
    }
}

/// A byte source backed by an open file.
#[derive(Debug)]
pub struct FileSource
{
    file: RefCell<File>,
    size: u64,
}

impl FileSource
{
    /// Open `path` for reading.
    ///
    /// ## Errors
    ///
    /// Returns [`ElfError::Io`] if the file cannot be opened or its size queried.
    pub fn open(path: impl AsRef<Path>) -> Result<Self>
    {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: RefCell::new(file),
            size,
        })
    }
}

impl ByteSource for FileSource
{
    fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>>
    {
        check_range(offset, len, self.size)?;
        let len = usize::try_from(len).map_err(|_| ElfError::OutOfMemory { record_size: 1, count: len })?;
        let mut buffer = vec![0u8; len];
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn size(&self) -> u64
    {
        self.size
    }
}

/// A window `[base, base + len)` over another source.
///
/// Used for archive members: offsets passed to the decoder are relative to
/// the member start and reads never escape the member.
pub struct SubSource<'a>
{
    inner: &'a dyn ByteSource,
    base: u64,
    len: u64,
}

impl<'a> SubSource<'a>
{
    /// Create a window; `len` is clamped to the bytes actually available.
    pub fn new(inner: &'a dyn ByteSource, base: u64, len: u64) -> Self
    {
        let available = inner.size().saturating_sub(base);
        Self {
            inner,
            base,
            len: len.min(available),
        }
    }

    pub fn base(&self) -> u64
    {
        self.base
    }
}

impl ByteSource for SubSource<'_>
{
    fn read_at(&self, offset: u64, len: u64) -> Result<Vec<u8>>
    {
        check_range(offset, len, self.len)?;
        self.inner.read_at(self.base + offset, len)
    }

    fn size(&self) -> u64
    {
        self.len
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_slice_source_reads_in_bounds()
    {
        let data = [1u8, 2, 3, 4, 5];
        let source = SliceSource::new(&data);
        assert_eq!(source.read_at(1, 3).unwrap(), vec![2, 3, 4]);
        assert_eq!(source.size(), 5);
    }

    #[test]
    fn test_slice_source_rejects_short_read()
    {
        let data = [0u8; 4];
        let source = SliceSource::new(&data);
        match source.read_at(2, 4) {
            Err(ElfError::TruncatedRead { offset, len, available }) => {
                assert_eq!((offset, len, available), (2, 4, 2));
            }
            other => panic!("expected TruncatedRead, got {other:?}"),
        }
    }

    #[test]
    fn test_slice_source_rejects_overflowing_range()
    {
        let data = [0u8; 4];
        let source = SliceSource::new(&data);
        assert!(source.read_at(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_sub_source_is_relative_to_base()
    {
        let data: Vec<u8> = (0u8..32).collect();
        let sub = SubSource::new(&data, 8, 8);
        assert_eq!(sub.size(), 8);
        assert_eq!(sub.read_at(0, 2).unwrap(), vec![8, 9]);
        assert!(sub.read_at(7, 2).is_err());
    }
}
