//! Bounds-checked forward cursor over an in-memory buffer.
//!
//! The DWARF decoders operate on whole sections loaded into memory; every field
//! they read goes through a [`Cursor`], which reports truncation as an
//! [`ElfError::TruncatedRead`] carrying the absolute section offset.

use std::borrow::Cow;

use super::endian::{read_sint, read_uint, ByteOrder};
use super::leb128::{read_sleb128, read_uleb128};
use crate::error::{ElfError, Result};

#[derive(Debug, Clone)]
pub struct Cursor<'a>
{
    data: &'a [u8],
    pos: usize,
    order: ByteOrder,
    /// Offset of `data[0]` within the enclosing section, for error reporting.
    base: u64,
}

impl<'a> Cursor<'a>
{
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self
    {
        Self {
            data,
            pos: 0,
            order,
            base: 0,
        }
    }

    /// A cursor whose reported offsets start at `base`.
    pub fn with_base(data: &'a [u8], order: ByteOrder, base: u64) -> Self
    {
        Self {
            data,
            pos: 0,
            order,
            base,
        }
    }

    pub fn order(&self) -> ByteOrder
    {
        self.order
    }

    /// Current position relative to the start of the buffer.
    pub fn position(&self) -> usize
    {
        self.pos
    }

    /// Current position as an offset in the enclosing section.
    pub fn offset(&self) -> u64
    {
        self.base + self.pos as u64
    }

    pub fn remaining(&self) -> usize
    {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool
    {
        self.remaining() == 0
    }

    /// Remaining unread bytes.
    pub fn rest(&self) -> &'a [u8]
    {
        &self.data[self.pos..]
    }

    fn truncated(&self, len: usize) -> ElfError
    {
        ElfError::TruncatedRead {
            offset: self.offset(),
            len: len as u64,
            available: self.remaining() as u64,
        }
    }

    /// Move to an absolute position in the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()>
    {
        if pos > self.data.len() {
            return Err(ElfError::TruncatedRead {
                offset: self.base + pos as u64,
                len: 0,
                available: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, len: usize) -> Result<()>
    {
        self.bytes(len).map(|_| ())
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]>
    {
        if len > self.remaining() {
            return Err(self.truncated(len));
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Split off the next `len` bytes as their own cursor, advancing past them.
    pub fn split(&mut self, len: usize) -> Result<Cursor<'a>>
    {
        let base = self.offset();
        let data = self.bytes(len)?;
        Ok(Cursor::with_base(data, self.order, base))
    }

    pub fn uint(&mut self, width: usize) -> Result<u64>
    {
        if width > self.remaining() {
            return Err(self.truncated(width));
        }
        let value = read_uint(&self.data[self.pos..], width, self.order)?;
        self.pos += width;
        Ok(value)
    }

    pub fn sint(&mut self, width: usize) -> Result<i64>
    {
        if width > self.remaining() {
            return Err(self.truncated(width));
        }
        let value = read_sint(&self.data[self.pos..], width, self.order)?;
        self.pos += width;
        Ok(value)
    }

    pub fn u8(&mut self) -> Result<u8>
    {
        self.uint(1).map(|v| v as u8)
    }

    pub fn i8(&mut self) -> Result<i8>
    {
        self.sint(1).map(|v| v as i8)
    }

    pub fn u16(&mut self) -> Result<u16>
    {
        self.uint(2).map(|v| v as u16)
    }

    pub fn u32(&mut self) -> Result<u32>
    {
        self.uint(4).map(|v| v as u32)
    }

    pub fn u64(&mut self) -> Result<u64>
    {
        self.uint(8)
    }

    pub fn uleb(&mut self) -> Result<u64>
    {
        let (value, used) = read_uleb128(self.rest()).map_err(|_| self.truncated(self.remaining() + 1))?;
        self.pos += used;
        Ok(value)
    }

    pub fn sleb(&mut self) -> Result<i64>
    {
        let (value, used) = read_sleb128(self.rest()).map_err(|_| self.truncated(self.remaining() + 1))?;
        self.pos += used;
        Ok(value)
    }

    /// Read a target address of `size` bytes.
    pub fn address(&mut self, size: u8) -> Result<u64>
    {
        if size == 0 || size > 8 {
            return Err(ElfError::corrupt("address", self.offset(), format!("invalid address size {size}")));
        }
        self.uint(usize::from(size))
    }

    /// Read a NUL-terminated string, consuming the terminator.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn cstr(&mut self) -> Result<Cow<'a, str>>
    {
        let rest = self.rest();
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| self.truncated(rest.len() + 1))?;
        let raw = &rest[..len];
        self.pos += len + 1;
        Ok(String::from_utf8_lossy(raw))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_sequential_reads()
    {
        let data = [0x01, 0x34, 0x12, 0x80, 0x01, b'h', b'i', 0, 0x7f];
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        assert_eq!(cursor.u8().unwrap(), 1);
        assert_eq!(cursor.u16().unwrap(), 0x1234);
        assert_eq!(cursor.uleb().unwrap(), 128);
        assert_eq!(cursor.cstr().unwrap(), "hi");
        assert_eq!(cursor.sleb().unwrap(), -1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_truncation_reports_absolute_offset()
    {
        let data = [0u8; 3];
        let mut cursor = Cursor::with_base(&data, ByteOrder::Big, 0x100);
        cursor.u8().unwrap();
        match cursor.u32() {
            Err(ElfError::TruncatedRead { offset, len, available }) => {
                assert_eq!((offset, len, available), (0x101, 4, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_string()
    {
        let data = *b"abc";
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        assert!(cursor.cstr().is_err());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_split_advances_parent()
    {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = Cursor::with_base(&data, ByteOrder::Little, 10);
        cursor.u8().unwrap();
        let mut inner = cursor.split(2).unwrap();
        assert_eq!(inner.offset(), 11);
        assert_eq!(inner.u16().unwrap(), 0x0302);
        assert_eq!(cursor.u8().unwrap(), 4);
    }
}
