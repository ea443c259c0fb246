//! PA-RISC unwind tables (`.PARISC.unwind`).
//!
//! Entries are 16 bytes: two 32-bit addresses followed by two words of packed
//! descriptor bits, most significant bit first.

use object::elf::EM_PARISC;
use tracing::debug;

use super::{field_relocations, find_function, segment_base, SymbolMatch, UnwindAddress};
use crate::elf::{Container, SectionDescriptor};
use crate::error::Result;
use crate::reader::{ByteOrder, Cursor};

pub const UNWIND_SECTION_NAME: &str = ".PARISC.unwind";
/// `SHT_LOPROC + 1` on PA-RISC.
pub const SHT_PARISC_UNWIND: u32 = 0x7000_0001;

const ENTRY_SIZE: u64 = 16;
const FIELD_SIZE: u64 = 4;

fn bit(word: u32, shift: u32) -> bool
{
    (word >> shift) & 1 != 0
}

/// The bit-fields of one unwind descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HppaUnwindFlags
{
    pub cannot_unwind: bool,
    pub millicode: bool,
    pub millicode_save_sr0: bool,
    pub region_description: u8,
    pub entry_sr: bool,
    pub entry_fr: u8,
    pub entry_gr: u8,
    pub args_stored: bool,
    pub variable_frame: bool,
    pub separate_package_body: bool,
    pub frame_extension_millicode: bool,
    pub stack_overflow_check: bool,
    pub two_instruction_sp_increment: bool,
    pub ada_region: bool,
    pub cxx_info: bool,
    pub cxx_try_catch: bool,
    pub sched_entry_seq: bool,
    pub save_sp: bool,
    pub save_rp: bool,
    pub save_mrp_in_frame: bool,
    pub extn_ptr_defined: bool,
    pub cleanup_defined: bool,
    pub mpe_xl_interrupt_marker: bool,
    pub hp_ux_interrupt_marker: bool,
    pub large_frame: bool,
    pub pseudo_sp_set: bool,
    /// In 8-byte units.
    pub total_frame_size: u32,
}

impl HppaUnwindFlags
{
    pub fn from_words(first: u32, second: u32) -> Self
    {
        Self {
            cannot_unwind: bit(first, 31),
            millicode: bit(first, 30),
            millicode_save_sr0: bit(first, 29),
            region_description: ((first >> 27) & 0x3) as u8,
            entry_sr: bit(first, 25),
            entry_fr: ((first >> 21) & 0xf) as u8,
            entry_gr: ((first >> 16) & 0x1f) as u8,
            args_stored: bit(first, 15),
            variable_frame: bit(first, 14),
            separate_package_body: bit(first, 13),
            frame_extension_millicode: bit(first, 12),
            stack_overflow_check: bit(first, 11),
            two_instruction_sp_increment: bit(first, 10),
            ada_region: bit(first, 9),
            cxx_info: bit(first, 8),
            cxx_try_catch: bit(first, 7),
            sched_entry_seq: bit(first, 6),
            save_sp: bit(first, 4),
            save_rp: bit(first, 3),
            save_mrp_in_frame: bit(first, 2),
            extn_ptr_defined: bit(first, 1),
            cleanup_defined: bit(first, 0),
            mpe_xl_interrupt_marker: bit(second, 31),
            hp_ux_interrupt_marker: bit(second, 30),
            large_frame: bit(second, 29),
            pseudo_sp_set: bit(second, 28),
            total_frame_size: second & 0x07ff_ffff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HppaUnwindEntry
{
    pub start: UnwindAddress,
    pub end: UnwindAddress,
    pub flags: HppaUnwindFlags,
    pub function: Option<SymbolMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HppaUnwindTable
{
    pub section: String,
    pub segment_base: u64,
    pub entries: Vec<HppaUnwindEntry>,
}

/// Decode the whole entries in `data`, rebasing both addresses on `base`.
pub fn decode_entries(data: &[u8], order: ByteOrder, base: u64) -> Result<Vec<HppaUnwindEntry>>
{
    let mut cursor = Cursor::new(data, order);
    let mut out = Vec::with_capacity(data.len() / ENTRY_SIZE as usize);
    while cursor.remaining() >= ENTRY_SIZE as usize {
        let start = u64::from(cursor.u32()?).wrapping_add(base);
        let end = u64::from(cursor.u32()?).wrapping_add(base);
        let flags = HppaUnwindFlags::from_words(cursor.u32()?, cursor.u32()?);
        out.push(HppaUnwindEntry {
            start: UnwindAddress::absolute(start),
            end: UnwindAddress::absolute(end),
            flags,
            function: None,
        });
    }
    Ok(out)
}

fn is_unwind_section(section: &SectionDescriptor) -> bool
{
    section.name == UNWIND_SECTION_NAME || section.sh_type == SHT_PARISC_UNWIND
}

fn decode_section(container: &Container<'_>, section: &SectionDescriptor) -> Result<HppaUnwindTable>
{
    let header = container.header();
    let base = segment_base(container, section);
    let data = container.section_data(section)?;
    let mut entries = decode_entries(&data, header.order, base)?;

    for relocation in field_relocations(container, section, ENTRY_SIZE, FIELD_SIZE, entries.len()) {
        let entry = &mut entries[relocation.entry];
        match relocation.field {
            0 => relocation.apply(&mut entry.start),
            1 => relocation.apply(&mut entry.end),
            _ => container.warn(
                &section.name,
                Some(section.offset + relocation.entry as u64 * ENTRY_SIZE),
                "relocation targets a descriptor word",
            ),
        }
    }

    let symbols = container.primary_symbol_table();
    let distance = container.options().unwind_search_distance;
    for entry in &mut entries {
        entry.function = find_function(symbols.as_ref(), &entry.start, distance);
    }

    debug!(section = %section.name, entries = entries.len(), segment_base = base, "decoded PA-RISC unwind table");
    Ok(HppaUnwindTable {
        section: section.name.clone(),
        segment_base: base,
        entries,
    })
}

/// Decode every PA-RISC unwind section of `container`.
pub fn decode_unwind_table(container: &Container<'_>) -> Vec<HppaUnwindTable>
{
    if container.header().machine != EM_PARISC {
        return Vec::new();
    }
    container
        .sections()
        .iter()
        .filter(|section| is_unwind_section(section))
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
    fn test_bit_fields()
    {
        let first = (1 << 31) | (2 << 27) | (0x5 << 21) | (0x13 << 16) | (1 << 3) | 1;
        let second = (1 << 29) | 0x40;
        let flags = HppaUnwindFlags::from_words(first, second);
        assert!(flags.cannot_unwind);
        assert!(!flags.millicode);
        assert_eq!(flags.region_description, 2);
        assert_eq!(flags.entry_fr, 5);
        assert_eq!(flags.entry_gr, 0x13);
        assert!(flags.save_rp);
        assert!(flags.cleanup_defined);
        assert!(flags.large_frame);
        assert_eq!(flags.total_frame_size, 0x40);
    }

    #[test]
    fn test_big_endian_entries()
    {
        let mut data = Vec::new();
        for word in [0x100u32, 0x140, 1 << 3, 0x10] {
            data.extend_from_slice(&word.to_be_bytes());
        }
        data.extend_from_slice(&[0; 7]);
        let entries = decode_entries(&data, ByteOrder::Big, 0x1_0000).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start.address, 0x1_0100);
        assert_eq!(entries[0].end.address, 0x1_0140);
        assert!(entries[0].flags.save_rp);
        assert_eq!(entries[0].flags.total_frame_size, 0x10);
    }
}
