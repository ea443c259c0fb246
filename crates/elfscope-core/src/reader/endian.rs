//! Fixed-width integer access in either byte order.

use crate::error::{ElfError, Result};

/// Byte order of a file, selected once from `EI_DATA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder
{
    Little,
    Big,
}

impl ByteOrder
{
    /// Read an unsigned integer of `width` bytes (1..=8) from the start of `bytes`.
    pub fn read_uint(self, bytes: &[u8], width: usize) -> Result<u64>
    {
        read_uint(bytes, width, self)
    }

    /// Read an unsigned integer of `width` bytes at `offset` in `bytes`.
    pub fn read_uint_at(self, bytes: &[u8], offset: usize, width: usize) -> Result<u64>
    {
        let slice = bytes.get(offset..).ok_or(ElfError::TruncatedRead {
            offset: offset as u64,
            len: width as u64,
            available: 0,
        })?;
        read_uint(slice, width, self).map_err(|err| match err {
            ElfError::TruncatedRead { len, available, .. } => ElfError::TruncatedRead {
                offset: offset as u64,
                len,
                available,
            },
            other => other,
        })
    }

    pub fn u16_at(self, bytes: &[u8], offset: usize) -> Result<u16>
    {
        self.read_uint_at(bytes, offset, 2).map(|v| v as u16)
    }

    pub fn u32_at(self, bytes: &[u8], offset: usize) -> Result<u32>
    {
        self.read_uint_at(bytes, offset, 4).map(|v| v as u32)
    }

    pub fn u64_at(self, bytes: &[u8], offset: usize) -> Result<u64>
    {
        self.read_uint_at(bytes, offset, 8)
    }
}

fn check_width(width: usize) -> Result<()>
{
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(ElfError::corrupt("integer", 0, format!("unsupported field width {width}")))
    }
}

/// Read an unsigned integer of `width` bytes from the front of `bytes`.
///
/// ## Errors
///
/// [`ElfError::TruncatedRead`] if fewer than `width` bytes are present and
/// [`ElfError::Corrupt`] if `width` is not in `1..=8`.
pub fn read_uint(bytes: &[u8], width: usize, order: ByteOrder) -> Result<u64>
{
    check_width(width)?;
    let field = bytes.get(..width).ok_or(ElfError::TruncatedRead {
        offset: 0,
        len: width as u64,
        available: bytes.len() as u64,
    })?;

    let value = match order {
        ByteOrder::Little => field.iter().rev().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        ByteOrder::Big => field.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    };
    Ok(value)
}

/// Read a signed integer of `width` bytes, sign-extending from the top bit of the field.
pub fn read_sint(bytes: &[u8], width: usize, order: ByteOrder) -> Result<i64>
{
    let raw = read_uint(bytes, width, order)?;
    let shift = 64 - 8 * width as u32;
    Ok(((raw << shift) as i64) >> shift)
}

/// Store the low `width` bytes of `value` at the front of `bytes`.
pub fn write_uint(bytes: &mut [u8], value: u64, width: usize, order: ByteOrder) -> Result<()>
{
    check_width(width)?;
    let available = bytes.len() as u64;
    let field = bytes.get_mut(..width).ok_or(ElfError::TruncatedRead {
        offset: 0,
        len: width as u64,
        available,
    })?;

    for (i, slot) in field.iter_mut().enumerate() {
        let shift = match order {
            ByteOrder::Little => 8 * i,
            ByteOrder::Big => 8 * (width - 1 - i),
        };
        *slot = (value >> shift) as u8;
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn mask(width: usize) -> u64
    {
        if width == 8 {
            u64::MAX
        } else {
            (1u64 << (8 * width)) - 1
        }
    }

    #[test]
    fn test_round_trip_all_widths_and_orders()
    {
        let samples = [0u64, 1, 0x7f, 0x80, 0xff, 0x1234, 0xdead_beef, 0x0123_4567_89ab_cdef, u64::MAX];
        for order in [ByteOrder::Little, ByteOrder::Big] {
            for width in [1usize, 2, 4, 8] {
                for &sample in &samples {
                    let mut buffer = [0u8; 12];
                    let offset = 3;
                    write_uint(&mut buffer[offset..], sample, width, order).unwrap();
                    let back = read_uint(&buffer[offset..], width, order).unwrap();
                    assert_eq!(back, sample & mask(width), "width {width} order {order:?}");
                }
            }
        }
    }

    #[test]
    fn test_byte_order_layout()
    {
        let bytes = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_uint(&bytes, 4, ByteOrder::Little).unwrap(), 0x7856_3412);
        assert_eq!(read_uint(&bytes, 4, ByteOrder::Big).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_read_sint_sign_extends()
    {
        assert_eq!(read_sint(&[0xff], 1, ByteOrder::Little).unwrap(), -1);
        assert_eq!(read_sint(&[0xfe, 0xff], 2, ByteOrder::Little).unwrap(), -2);
        assert_eq!(read_sint(&[0x7f, 0xff], 2, ByteOrder::Big).unwrap(), 0x7fff);
        assert_eq!(read_sint(&[0xff; 8], 8, ByteOrder::Big).unwrap(), -1);
    }

    #[test]
    fn test_short_buffer_is_truncated_read()
    {
        assert!(matches!(
            read_uint(&[1, 2], 4, ByteOrder::Little),
            Err(ElfError::TruncatedRead { len: 4, available: 2, .. })
        ));
        assert!(ByteOrder::Big.u32_at(&[0; 6], 4).is_err());
    }

    #[test]
    fn test_invalid_width_rejected()
    {
        assert!(read_uint(&[0; 16], 0, ByteOrder::Little).is_err());
        assert!(read_uint(&[0; 16], 9, ByteOrder::Little).is_err());
    }
}
