//! Little-Endian Base-128 variable-length integers.
//!
//! Bits beyond the 64th are discarded, matching what producers in the wild
//! expect; an encoding that runs off the end of the buffer is an error.

use crate::error::{ElfError, Result};

/// Decode an unsigned LEB128 value, returning the value and the number of bytes consumed.
pub fn read_uleb128(bytes: &[u8]) -> Result<(u64, usize)>
{
    let mut result = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if shift < 64 {
            result |= u64::from(byte & 0x7f) << shift;
        }
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }
    Err(unterminated(bytes.len()))
}

/// Decode a signed LEB128 value, sign-extending from the final byte.
pub fn read_sleb128(bytes: &[u8]) -> Result<(i64, usize)>
{
    let mut result = 0i64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if shift < 64 {
            result |= i64::from(byte & 0x7f) << shift;
        }
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, i + 1));
        }
    }
    Err(unterminated(bytes.len()))
}

fn unterminated(available: usize) -> ElfError
{
    ElfError::TruncatedRead {
        offset: 0,
        len: available as u64 + 1,
        available: available as u64,
    }
}

/// Append the unsigned LEB128 encoding of `value` to `out`.
pub fn write_uleb128(out: &mut Vec<u8>, mut value: u64)
{
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Append the signed LEB128 encoding of `value` to `out`.
pub fn write_sleb128(out: &mut Vec<u8>, mut value: i64)
{
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_known_encodings()
    {
        assert_eq!(read_uleb128(&[0x02]).unwrap(), (2, 1));
        assert_eq!(read_uleb128(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(read_uleb128(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(read_uleb128(&[0xe5, 0x8e, 0x26]).unwrap(), (624_485, 3));
        assert_eq!(read_sleb128(&[0x7f]).unwrap(), (-1, 1));
        assert_eq!(read_sleb128(&[0x80, 0x7f]).unwrap(), (-128, 2));
        assert_eq!(read_sleb128(&[0xc0, 0xbb, 0x78]).unwrap(), (-123_456, 3));
    }

    #[test]
    fn test_consumed_count_stops_at_terminator()
    {
        let bytes = [0x80, 0x01, 0xaa, 0xbb];
        assert_eq!(read_uleb128(&bytes).unwrap(), (128, 2));
    }

    #[test]
    fn test_unterminated_is_error()
    {
        assert!(read_uleb128(&[0x80, 0x80]).is_err());
        assert!(read_sleb128(&[]).is_err());
    }

    #[test]
    fn test_unsigned_values_survive_encoding()
    {
        for value in [0u64, 1, 63, 64, 127, 128, 255, 16_383, 16_384, 0xdead_beef, u64::MAX - 1, u64::MAX] {
            let mut encoded = Vec::new();
            write_uleb128(&mut encoded, value);
            let (last, rest) = encoded.split_last().unwrap();
            assert!(rest.iter().all(|b| b & 0x80 != 0));
            assert_eq!(last & 0x80, 0);
            assert_eq!(read_uleb128(&encoded).unwrap(), (value, encoded.len()));
        }
    }

    #[test]
    fn test_signed_values_survive_encoding()
    {
        for value in [0i64, 1, -1, 63, -64, 64, -65, 8191, -8192, i64::from(i32::MIN), i64::MAX, i64::MIN] {
            let mut encoded = Vec::new();
            write_sleb128(&mut encoded, value);
            let (last, rest) = encoded.split_last().unwrap();
            assert!(rest.iter().all(|b| b & 0x80 != 0));
            assert_eq!(last & 0x80, 0);
            assert_eq!(read_sleb128(&encoded).unwrap(), (value, encoded.len()));
        }
    }
}
