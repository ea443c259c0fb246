//! IA-64 unwind tables (`SHT_IA_64_UNWIND`).
//!
//! Each table entry is three address-sized words: region start, region end
//! and a pointer to an unwind information block. The block starts with a
//! 64-bit header word packing a version, handler flags and the descriptor
//! length in words.

use object::elf::EM_IA_64;
use tracing::debug;

use super::{field_relocations, find_function, segment_base, SymbolMatch, UnwindAddress};
use crate::elf::{Container, SectionDescriptor, SectionIndex};
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// `SHT_LOPROC + 1`
pub const SHT_IA_64_UNWIND: u32 = 0x7000_0001;

const FLAG_EHANDLER: u16 = 0x1;
const FLAG_UHANDLER: u16 = 0x2;

/// Decoded unwind information block header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ia64UnwindInfo
{
    pub version: u16,
    pub flags: u16,
    /// Descriptor area length in address-sized words.
    pub length: u64,
    /// Region descriptors, undecoded.
    pub descriptors: Vec<u8>,
    /// Personality routine, present when a handler flag is set.
    pub personality: Option<u64>,
}

impl Ia64UnwindInfo
{
    pub fn has_exception_handler(&self) -> bool
    {
        self.flags & FLAG_EHANDLER != 0
    }

    pub fn has_unwind_handler(&self) -> bool
    {
        self.flags & FLAG_UHANDLER != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ia64UnwindEntry
{
    pub start: UnwindAddress,
    pub end: UnwindAddress,
    pub info: UnwindAddress,
    pub function: Option<SymbolMatch>,
    /// `None` when the block could not be read; the reason is a diagnostic.
    pub info_block: Option<Ia64UnwindInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ia64UnwindTable
{
    pub section: String,
    pub segment_base: u64,
    pub entries: Vec<Ia64UnwindEntry>,
}

/// Split raw table bytes into `[start, end, info]` triples, rebased on `base`.
pub fn decode_entries(data: &[u8], address_size: u8, order: ByteOrder, base: u64) -> Result<Vec<[UnwindAddress; 3]>>
{
    let record = usize::from(address_size) * 3;
    let mut cursor = Cursor::new(data, order);
    let mut out = Vec::with_capacity(data.len() / record);
    while cursor.remaining() >= record {
        let mut words = [UnwindAddress::absolute(0); 3];
        for word in &mut words {
            *word = UnwindAddress::absolute(cursor.address(address_size)?.wrapping_add(base));
        }
        out.push(words);
    }
    Ok(out)
}

/// Decode an unwind information block starting at the beginning of `data`.
pub fn parse_unwind_info(data: &[u8], offset: u64, address_size: u8, order: ByteOrder) -> Result<Ia64UnwindInfo>
{
    let mut cursor = Cursor::with_base(data, order, offset);
    let stamp = cursor.u64()?;
    let flags = ((stamp >> 32) & 0xffff) as u16;
    let length = stamp & 0xffff_ffff;
    let size = length
        .checked_mul(u64::from(address_size))
        .and_then(|size| usize::try_from(size).ok())
        .filter(|&size| size <= cursor.remaining())
        .ok_or_else(|| ElfError::corrupt("unwind info", offset, format!("descriptor length of {length} words runs past the section")))?;
    let descriptors = cursor.bytes(size)?.to_vec();
    let personality = if flags & (FLAG_EHANDLER | FLAG_UHANDLER) != 0 {
        Some(cursor.address(address_size)?)
    } else {
        None
    };
    Ok(Ia64UnwindInfo {
        version: (stamp >> 48) as u16,
        flags,
        length,
        descriptors,
        personality,
    })
}

/// The section holding an info block at `info`, and the block's offset in it.
fn locate_info<'c>(container: &'c Container<'_>, info: &UnwindAddress) -> Option<(&'c SectionDescriptor, u64)>
{
    let section = match info.section {
        SectionIndex::Regular(index) => container.section(index),
        _ => container
            .sections()
            .iter()
            .find(|section| section.is_alloc() && !section.is_nobits() && section.contains_address(info.address)),
    }?;
    Some((section, info.address.checked_sub(section.addr)?))
}

fn read_info_block(container: &Container<'_>, info: &UnwindAddress) -> Result<Ia64UnwindInfo>
{
    let (section, offset) = locate_info(container, info).ok_or_else(|| ElfError::IndexOutOfRange {
        what: "unwind info address",
        index: info.address,
        limit: 0,
    })?;
    let data = container.section_data(section)?;
    let start = usize::try_from(offset)
        .ok()
        .filter(|&start| start < data.len())
        .ok_or(ElfError::IndexOutOfRange {
            what: "unwind info offset",
            index: offset,
            limit: data.len() as u64,
        })?;
    let header = container.header();
    parse_unwind_info(&data[start..], section.offset + offset, header.address_size(), header.order)
}

fn decode_section(container: &Container<'_>, section: &SectionDescriptor) -> Result<Ia64UnwindTable>
{
    let header = container.header();
    let address_size = header.address_size();
    let base = segment_base(container, section);
    let data = container.section_data(section)?;
    let mut triples = decode_entries(&data, address_size, header.order, base)?;

    let entry_size = u64::from(address_size) * 3;
    for relocation in field_relocations(container, section, entry_size, u64::from(address_size), triples.len()) {
        if let Some(field) = triples[relocation.entry].get_mut(relocation.field) {
            relocation.apply(field);
        }
    }

    let symbols = container.primary_symbol_table();
    let distance = container.options().unwind_search_distance;
    let entries = triples
        .into_iter()
        .map(|[start, end, info]| {
            let info_block = if info.address == 0 {
                None
            } else {
                match read_info_block(container, &info) {
                    Ok(block) => Some(block),
                    Err(err) => {
                        container.record_warning(&section.name, &err);
                        None
                    }
                }
            };
            Ia64UnwindEntry {
                function: find_function(symbols.as_ref(), &start, distance),
                start,
                end,
                info,
                info_block,
            }
        })
        .collect::<Vec<_>>();

    debug!(section = %section.name, entries = entries.len(), segment_base = base, "decoded IA-64 unwind table");
    Ok(Ia64UnwindTable {
        section: section.name.clone(),
        segment_base: base,
        entries,
    })
}

/// Decode every IA-64 unwind section of `container`.
///
/// Returns nothing for other machines. A section that cannot be read is a
/// fatal diagnostic for that section only.
pub fn decode_unwind_table(container: &Container<'_>) -> Vec<Ia64UnwindTable>
{
    if container.header().machine != EM_IA_64 {
        return Vec::new();
    }
    container
        .sections_of_type(SHT_IA_64_UNWIND)
        .filter_map(|section| match decode_section(container, section) {
            Ok(table) => Some(table),
            Err(err) => {
                container.record_error(&section.name, &err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_entries_are_rebased()
    {
        let mut data = Vec::new();
        for word in [0x100u64, 0x180, 0x400, 0x180, 0x200, 0] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        let entries = decode_entries(&data, 8, ByteOrder::Little, 0x4000_0000).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0][0].address, 0x4000_0100);
        assert_eq!(entries[1][1].address, 0x4000_0200);
        assert_eq!(entries[0][0].section, SectionIndex::Undefined);
    }

    #[test]
    fn test_info_header_with_handler()
    {
        // version 1, ehandler, one descriptor word, then the personality
        let stamp: u64 = (1 << 48) | (1 << 32) | 1;
        let mut data = stamp.to_le_bytes().to_vec();
        data.extend_from_slice(&[0x03, 0, 0, 0, 0, 0, 0, 0]);
        data.extend_from_slice(&0x4000_1000u64.to_le_bytes());
        let info = parse_unwind_info(&data, 0x800, 8, ByteOrder::Little).unwrap();
        assert_eq!(info.version, 1);
        assert!(info.has_exception_handler());
        assert!(!info.has_unwind_handler());
        assert_eq!(info.descriptors.len(), 8);
        assert_eq!(info.personality, Some(0x4000_1000));
    }

    #[test]
    fn test_info_length_past_section()
    {
        let stamp: u64 = (1 << 48) | 4;
        let data = stamp.to_le_bytes();
        let err = parse_unwind_info(&data, 0x800, 8, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ElfError::Corrupt { offset: 0x800, .. }));
    }
}
