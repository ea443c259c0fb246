//! `.debug_pubnames` and `.debug_pubtypes` name lookup tables.

use gimli::Format;
use tracing::debug;

use super::unit::split_record;
use super::{read_offset, DebugSection};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubName
{
    /// DIE offset relative to the start of the unit.
    pub die_offset: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubNameSet
{
    pub offset: u64,
    pub format: Format,
    pub length: u64,
    pub version: u16,
    pub info_offset: u64,
    pub info_length: u64,
    pub names: Vec<PubName>,
}

fn parse_set(offset: u64, length: u64, format: Format, mut body: Cursor<'_>) -> Result<PubNameSet>
{
    let version = body.u16()?;
    if version != 2 {
        return Err(ElfError::UnsupportedVersion { offset, version });
    }
    let info_offset = read_offset(&mut body, format)?;
    let info_length = read_offset(&mut body, format)?;

    let mut names = Vec::new();
    while !body.is_empty() {
        let die_offset = read_offset(&mut body, format)?;
        if die_offset == 0 {
            break;
        }
        names.push(PubName {
            die_offset,
            name: body.cstr()?.into_owned(),
        });
    }

    Ok(PubNameSet {
        offset,
        format,
        length,
        version,
        info_offset,
        info_length,
        names,
    })
}

/// Decode every set in a pubnames-style section.
pub fn parse_pubnames(section: &DebugSection, order: ByteOrder, diags: &mut Diagnostics) -> Vec<PubNameSet>
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

    debug!(section = what, sets = sets.len(), "decoded name table");
    sets
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_names_until_zero_offset()
    {
        let mut body = Vec::new();
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&0x80u32.to_le_bytes());
        body.extend_from_slice(&0x2du32.to_le_bytes());
        body.extend_from_slice(b"main\0");
        body.extend_from_slice(&0x5au32.to_le_bytes());
        body.extend_from_slice(b"helper\0");
        body.extend_from_slice(&0u32.to_le_bytes());
        let mut data = (body.len() as u32).to_le_bytes().to_vec();
        data.extend(body);

        let section = DebugSection {
            name: ".debug_pubnames".into(),
            offset: 0,
            address: 0,
            data,
        };
        let mut diags = Diagnostics::new();
        let sets = parse_pubnames(&section, ByteOrder::Little, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(sets[0].info_length, 0x80);
        let names: Vec<_> = sets[0].names.iter().map(|n| (n.die_offset, n.name.as_str())).collect();
        assert_eq!(names, vec![(0x2d, "main"), (0x5a, "helper")]);
    }
}
