//! `.debug_aranges`: address ranges covered by each compilation unit.

use gimli::Format;
use tracing::debug;

use super::unit::split_record;
use super::{read_offset, DebugSection};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArangeSet
{
    pub offset: u64,
    pub format: Format,
    pub length: u64,
    pub version: u16,
    /// Offset of the described unit in `.debug_info`.
    pub info_offset: u64,
    pub address_size: u8,
    pub segment_size: u8,
    /// `(address, length)` pairs, without the terminating `(0, 0)`.
    pub ranges: Vec<(u64, u64)>,
}

fn parse_set(offset: u64, length: u64, format: Format, mut body: Cursor<'_>) -> Result<ArangeSet>
{
    let version = body.u16()?;
    if version != 2 {
        return Err(ElfError::UnsupportedVersion { offset, version });
    }
    let info_offset = read_offset(&mut body, format)?;
    let address_size = body.u8()?;
    let segment_size = body.u8()?;
    if !matches!(address_size, 1 | 2 | 4 | 8) {
        return Err(ElfError::corrupt(
            "address range set",
            offset,
            format!("invalid address size {address_size}"),
        ));
    }

    // tuples start at a multiple of twice the address size from the set start
    let tuple = u64::from(address_size) * 2;
    let header = body.offset() - offset;
    let padding = (tuple - header % tuple) % tuple;
    body.skip(padding as usize)?;

    let mut ranges = Vec::new();
    while body.remaining() >= usize::from(address_size) * 2 {
        let address = body.address(address_size)?;
        let len = body.address(address_size)?;
        if address == 0 && len == 0 {
            break;
        }
        ranges.push((address, len));
    }

    Ok(ArangeSet {
        offset,
        format,
        length,
        version,
        info_offset,
        address_size,
        segment_size,
        ranges,
    })
}

/// Decode every address range set in `section`.
pub fn parse_aranges(section: &DebugSection, order: ByteOrder, diags: &mut Diagnostics) -> Vec<ArangeSet>
{
    let what = section.name.as_str();
    let mut cursor = section.cursor(order);
    let mut sets = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let (length, format, body) = match split_record(&mut cursor) {
            Ok(record) => record,
            Err(err) => {
                diags.record_error(Some(what), &err);
                break;
            }
        };
        match parse_set(offset, length, format, body) {
            Ok(set) => sets.push(set),
            Err(err) => diags.record_warning(Some(what), &err),
        }
    }

    debug!(sets = sets.len(), "decoded address ranges");
    sets
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_padding_and_terminator()
    {
        let mut body = Vec::new();
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&0x40u32.to_le_bytes());
        body.push(8);
        body.push(0);
        // header is 12 bytes, pad to 16
        body.extend_from_slice(&[0; 4]);
        for value in [0x1000u64, 0x20, 0x2000, 0x8, 0, 0] {
            body.extend_from_slice(&value.to_le_bytes());
        }
        let mut data = (body.len() as u32).to_le_bytes().to_vec();
        data.extend(body);

        let section = DebugSection {
            name: ".debug_aranges".into(),
            offset: 0,
            address: 0,
            data,
        };
        let mut diags = Diagnostics::new();
        let sets = parse_aranges(&section, ByteOrder::Little, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].info_offset, 0x40);
        assert_eq!(sets[0].ranges, vec![(0x1000, 0x20), (0x2000, 0x8)]);
    }

    #[test]
    fn test_unsupported_version_is_warning()
    {
        let mut body = 3u16.to_le_bytes().to_vec();
        body.extend_from_slice(&[0; 6]);
        let mut data = (body.len() as u32).to_le_bytes().to_vec();
        data.extend(body);
        let section = DebugSection {
            name: ".debug_aranges".into(),
            offset: 0,
            address: 0,
            data,
        };
        let mut diags = Diagnostics::new();
        assert!(parse_aranges(&section, ByteOrder::Little, &mut diags).is_empty());
        assert_eq!(diags.warning_count(), 1);
    }
}
