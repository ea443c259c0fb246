//! Compilation unit headers in `.debug_info`.

use gimli::Format;

use super::read_offset;
use crate::error::{ElfError, Result};
use crate::reader::Cursor;

/// Escape value of the initial length field selecting 64-bit DWARF.
const DWARF64_ESCAPE: u64 = 0xffff_ffff;
/// First value of the reserved initial length range.
const RESERVED_LENGTH: u64 = 0xffff_fff0;

/// Read a DWARF initial length field.
///
/// ## Errors
///
/// Fails on truncation or a length in the reserved `0xfffffff0..0xffffffff`
/// range.
pub fn read_initial_length(cursor: &mut Cursor<'_>) -> Result<(u64, Format)>
{
    let offset = cursor.offset();
    let length = u64::from(cursor.u32()?);
    if length == DWARF64_ESCAPE {
        return Ok((cursor.u64()?, Format::Dwarf64));
    }
    if length >= RESERVED_LENGTH {
        return Err(ElfError::corrupt(
            "initial length",
            offset,
            format!("reserved length value 0x{length:x}"),
        ));
    }
    Ok((length, Format::Dwarf32))
}

/// Split off the body of a length-prefixed record, positioning `cursor` after it.
///
/// A length that runs past the data is an error, since the following record
/// cannot be located.
pub(crate) fn split_record<'a>(cursor: &mut Cursor<'a>) -> Result<(u64, Format, Cursor<'a>)>
{
    let (length, format) = read_initial_length(cursor)?;
    let length = usize::try_from(length).map_err(|_| {
        ElfError::corrupt("initial length", cursor.offset(), format!("length 0x{length:x} is too large"))
    })?;
    let body = cursor.split(length)?;
    Ok((length as u64, format, body))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitHeader
{
    /// Offset of the unit within `.debug_info`.
    pub offset: u64,
    pub format: Format,
    pub unit_length: u64,
    pub version: u16,
    pub abbrev_offset: u64,
    pub address_size: u8,
    /// Bytes from `offset` to the first DIE.
    pub header_size: u64,
}

impl UnitHeader
{
    /// Parse a unit header, returning it with a cursor over the unit's DIEs.
    ///
    /// Once the initial length is readable `cursor` is always left at the next
    /// unit, so an unsupported or corrupt unit can be skipped.
    ///
    /// ## Errors
    ///
    /// [`ElfError::UnsupportedVersion`] for versions other than 2 and 3, and
    /// truncation or corruption errors for a malformed header.
    pub fn parse<'a>(cursor: &mut Cursor<'a>) -> Result<(UnitHeader, Cursor<'a>)>
    {
        let offset = cursor.offset();
        let (unit_length, format, body) = split_record(cursor)?;
        Self::parse_body(offset, unit_length, format, body)
    }

    /// Parse the rest of a header whose initial length has been read already.
    pub(crate) fn parse_body<'a>(
        offset: u64,
        unit_length: u64,
        format: Format,
        mut body: Cursor<'a>,
    ) -> Result<(UnitHeader, Cursor<'a>)>
    {
        let version = body.u16()?;
        if !(2..=3).contains(&version) {
            return Err(ElfError::UnsupportedVersion { offset, version });
        }
        let abbrev_offset = read_offset(&mut body, format)?;
        let address_size = body.u8()?;
        if !matches!(address_size, 1 | 2 | 4 | 8) {
            return Err(ElfError::corrupt(
                "unit header",
                offset,
                format!("invalid address size {address_size}"),
            ));
        }

        let header = UnitHeader {
            offset,
            format,
            unit_length,
            version,
            abbrev_offset,
            address_size,
            header_size: body.offset() - offset,
        };
        Ok((header, body))
    }

    /// Size of the initial length field.
    pub fn length_size(&self) -> u64
    {
        u64::from(self.format.initial_length_size())
    }

    /// Offset of the byte following this unit.
    pub fn end(&self) -> u64
    {
        self.offset + self.length_size() + self.unit_length
    }

    pub fn contains(&self, offset: u64) -> bool
    {
        (self.offset..self.end()).contains(&offset)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::reader::ByteOrder;

    fn unit32(version: u16, body: &[u8]) -> Vec<u8>
    {
        let mut out = Vec::new();
        let length = (2 + 4 + 1 + body.len()) as u32;
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&version.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.push(8);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_dwarf32_header()
    {
        let data = unit32(3, &[0x01, 0x00]);
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        let (header, body) = UnitHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.format, Format::Dwarf32);
        assert_eq!(header.version, 3);
        assert_eq!(header.address_size, 8);
        assert_eq!(header.header_size, 11);
        assert_eq!(header.end(), data.len() as u64);
        assert_eq!(body.remaining(), 2);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_dwarf64_escape()
    {
        let mut data = vec![0xff, 0xff, 0xff, 0xff];
        data.extend_from_slice(&(2u64 + 8 + 1).to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());
        data.extend_from_slice(&0x10u64.to_le_bytes());
        data.push(4);
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        let (header, _) = UnitHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.format, Format::Dwarf64);
        assert_eq!(header.abbrev_offset, 0x10);
        assert_eq!(header.length_size(), 12);
        assert_eq!(header.end(), data.len() as u64);
    }

    #[test]
    fn test_unsupported_version_leaves_cursor_at_next_unit()
    {
        let mut data = unit32(4, &[0x00]);
        let first_len = data.len();
        data.extend(unit32(2, &[0x00]));
        let mut cursor = Cursor::new(&data, ByteOrder::Little);

        let err = UnitHeader::parse(&mut cursor).unwrap_err();
        assert!(matches!(err, ElfError::UnsupportedVersion { offset: 0, version: 4 }));
        assert_eq!(cursor.position(), first_len);

        let (header, _) = UnitHeader::parse(&mut cursor).unwrap();
        assert_eq!(header.offset, first_len as u64);
        assert_eq!(header.version, 2);
    }

    #[test]
    fn test_reserved_length_is_corrupt()
    {
        let data = 0xffff_fff5u32.to_le_bytes();
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        assert!(matches!(read_initial_length(&mut cursor), Err(ElfError::Corrupt { .. })));
    }
}
