//! # Unwind Decoders
//!
//! Builders for the two fixed-size unwind-region tables readelf understands:
//! IA-64 (`SHT_IA_64_UNWIND`, three address words per entry) and PA-RISC
//! (`.PARISC.unwind`, sixteen bytes of packed bit-fields per entry).
//!
//! Both follow the same steps. The segment base is taken from the `PT_LOAD`
//! holding the unwind section and added to every address read from the
//! table. Segment-relative relocations aimed at the section then overwrite
//! the fields they target, and each start address is attributed to the
//! nearest preceding function symbol.

pub mod hppa;
pub mod ia64;

use tracing::trace;

use crate::arch::relocs::{is_segment_relative, relocation_type_name};
use crate::elf::{Container, SectionDescriptor, SectionIndex, SymbolRef, SymbolTable};

pub use hppa::{HppaUnwindEntry, HppaUnwindTable};
pub use ia64::{Ia64UnwindEntry, Ia64UnwindInfo, Ia64UnwindTable};

/// An address read from an unwind table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnwindAddress
{
    pub address: u64,
    /// Section the address is relative to; undefined unless a relocation said otherwise.
    pub section: SectionIndex,
}

impl UnwindAddress
{
    fn absolute(address: u64) -> Self
    {
        Self {
            address,
            section: SectionIndex::Undefined,
        }
    }
}

/// The function symbol an address was attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatch
{
    pub name: String,
    /// `address - st_value`
    pub distance: u64,
}

/// A relocation resolved against one field of one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldRelocation
{
    pub entry: usize,
    pub field: usize,
    pub symbol_value: u64,
    /// `None` for REL tables, where the addend is the field's own contents.
    pub addend: Option<i64>,
    pub section: SectionIndex,
}

impl FieldRelocation
{
    pub(crate) fn apply(&self, target: &mut UnwindAddress)
    {
        let addend = self.addend.unwrap_or(target.address as i64);
        target.address = self.symbol_value.wrapping_add_signed(addend);
        target.section = self.section;
    }
}

/// `p_vaddr` of the `PT_LOAD` segment whose memory image holds `section`.
pub(crate) fn segment_base(container: &Container<'_>, section: &SectionDescriptor) -> u64
{
    container
        .segments()
        .iter()
        .find(|segment| {
            segment.is_load() && section.addr >= segment.vaddr && section.addr - segment.vaddr < segment.memsz
        })
        .map(|segment| segment.vaddr)
        .unwrap_or(0)
}

/// Relocations aimed at `unwind`, mapped onto `(entry, field)` pairs.
///
/// The relocation section is the one whose `sh_info` names `unwind`. Only
/// segment-relative relocation types are used; anything else, or a record
/// offset past the table, is reported and skipped.
pub(crate) fn field_relocations(
    container: &Container<'_>,
    unwind: &SectionDescriptor,
    entry_size: u64,
    field_size: u64,
    entry_count: usize,
) -> Vec<FieldRelocation>
{
    let machine = container.header().machine;
    let mut out = Vec::new();

    for table in container.relocation_sections() {
        if table.target != Some(unwind.index) {
            continue;
        }
        for entry in &table.entries {
            let relocation = &entry.relocation;
            if !is_segment_relative(machine, relocation.r_type) {
                let name = relocation_type_name(machine, relocation.r_type)
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("0x{:x}", relocation.r_type));
                container.warn(
                    &table.name,
                    Some(relocation.offset),
                    format!("skipping unexpected relocation type {name} against {}", unwind.name),
                );
                continue;
            }
            let index = relocation.offset / entry_size;
            let Some(index) = usize::try_from(index).ok().filter(|&i| i < entry_count) else {
                container.warn(
                    &table.name,
                    Some(relocation.offset),
                    format!("relocation offset 0x{:x} is past the end of {}", relocation.offset, unwind.name),
                );
                continue;
            };
            let (symbol_value, section) = match &entry.symbol {
                SymbolRef::Symbol { value, shndx, .. } => (*value, *shndx),
                SymbolRef::None => (0, SectionIndex::Undefined),
                // already reported when the relocations were decoded
                SymbolRef::OutOfRange { .. } => continue,
            };
            out.push(FieldRelocation {
                entry: index,
                field: ((relocation.offset % entry_size) / field_size) as usize,
                symbol_value,
                addend: relocation.addend,
                section,
            });
        }
    }
    trace!(section = %unwind.name, count = out.len(), "unwind relocations");
    out
}

/// Attribute `address` to the nearest preceding function within `max_distance`.
pub(crate) fn find_function(symbols: Option<&SymbolTable>, address: &UnwindAddress, max_distance: u64) -> Option<SymbolMatch>
{
    let (symbol, distance) = symbols?.nearest_function(address.address, address.section, max_distance)?;
    Some(SymbolMatch {
        name: symbol.name.display_name().to_owned(),
        distance,
    })
}
