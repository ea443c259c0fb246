//! Relocation tables (`SHT_REL`, `SHT_RELA`) and dynamic relocations.
//!
//! A relocation's `r_info` packs a symbol index and a type with an
//! architecture-dependent layout. Symbol indices come straight from the file,
//! so each one is checked against the linked symbol table; an out-of-range
//! index degrades that single entry to [`SymbolRef::OutOfRange`].

use std::collections::HashMap;

use object::elf::{
    DT_JMPREL, DT_PLTREL, DT_PLTRELSZ, DT_REL, DT_RELA, DT_RELASZ, DT_RELSZ, EM_MIPS, SHT_DYNSYM, SHT_REL,
    SHT_RELA, SHT_SYMTAB, STT_SECTION,
};
use tracing::debug;

use super::container::Container;
use super::header::ElfClass;
use super::section::{SectionDescriptor, SectionIndex};
use super::symbol::SymbolTable;
use crate::arch::{guess_relocation_style, RelocationStyle};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// One relocation record, width-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation
{
    pub offset: u64,
    /// `r_info` as stored.
    pub info: u64,
    /// `None` for REL-style records.
    pub addend: Option<i64>,
    pub sym: u32,
    pub r_type: u32,
}

/// Split `r_info` into `(symbol index, type)`.
///
/// 64-bit MIPS stores `r_sym` as a 32-bit word followed by `r_ssym` and three
/// one-byte types; in little-endian files the whole word is byte-swapped
/// relative to the usual layout. Only the primary type is returned.
pub fn split_info(info: u64, class: ElfClass, order: ByteOrder, machine: u16) -> (u32, u32)
{
    match class {
        ElfClass::Elf32 => ((info >> 8) as u32, (info & 0xff) as u32),
        ElfClass::Elf64 if machine == EM_MIPS => {
            let info = if order == ByteOrder::Little {
                (info << 32)
                    | ((info >> 56) & 0xff)
                    | ((info >> 40) & 0xff00)
                    | ((info >> 24) & 0xff_0000)
                    | ((info >> 8) & 0xff00_0000)
            } else {
                info
            };
            ((info >> 32) as u32, (info & 0xff) as u32)
        }
        ElfClass::Elf64 => ((info >> 32) as u32, (info & 0xffff_ffff) as u32),
    }
}

/// Decode whole relocation records from `data`.
pub fn decode_relocations(
    data: &[u8],
    style: RelocationStyle,
    class: ElfClass,
    order: ByteOrder,
    machine: u16,
    base: u64,
) -> Result<Vec<Relocation>>
{
    let record = match style {
        RelocationStyle::Rela => class.rela_size(),
        RelocationStyle::Rel | RelocationStyle::Unknown => class.rel_size(),
    } as usize;
    let word = class.word_size();

    let mut relocations = Vec::with_capacity(data.len() / record);
    for (index, chunk) in data.chunks_exact(record).enumerate() {
        let mut cursor = Cursor::with_base(chunk, order, base + (index * record) as u64);
        let offset = cursor.uint(word)?;
        let info = cursor.uint(word)?;
        let addend = match style {
            RelocationStyle::Rela => Some(cursor.sint(word)?),
            _ => None,
        };
        let (sym, r_type) = split_info(info, class, order, machine);
        relocations.push(Relocation {
            offset,
            info,
            addend,
            sym,
            r_type,
        });
    }
    Ok(relocations)
}

/// The symbol a relocation refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef
{
    /// Symbol index 0, or the table has no linked symbols.
    None,
    Symbol
    {
        index: u32,
        /// Symbol name; section symbols take their section's name.
        name: String,
        value: u64,
        shndx: SectionIndex,
    },
    /// The index is past the end of the symbol table.
    OutOfRange
    {
        index: u32,
        limit: u32,
    },
}

/// A relocation paired with its resolved symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationEntry
{
    pub relocation: Relocation,
    pub symbol: SymbolRef,
}

/// One decoded relocation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationSection
{
    /// Name of the section, or `DT_RELA`/`DT_REL`/`DT_JMPREL` for dynamic relocations.
    pub name: String,
    /// File offset of the table.
    pub offset: u64,
    pub style: RelocationStyle,
    /// Section the relocations apply to (`sh_info`).
    pub target: Option<usize>,
    pub entries: Vec<RelocationEntry>,
}

/// Pair each relocation with its symbol, checking every index against `symbols`.
pub fn resolve_symbols(
    relocations: Vec<Relocation>,
    symbols: Option<&SymbolTable>,
    section_name: impl Fn(SectionIndex) -> Option<String>,
    what: &str,
    diags: &mut Diagnostics,
) -> Vec<RelocationEntry>
{
    relocations
        .into_iter()
        .map(|relocation| {
            let symbol = match symbols {
                _ if relocation.sym == 0 => SymbolRef::None,
                None => SymbolRef::None,
                Some(table) => match table.get(relocation.sym as usize) {
                    Some(symbol) => {
                        let name = if symbol.kind() == STT_SECTION && symbol.name.raw().is_empty() {
                            section_name(symbol.shndx).unwrap_or_default()
                        } else {
                            symbol.name.display_name().to_owned()
                        };
                        SymbolRef::Symbol {
                            index: relocation.sym,
                            name,
                            value: symbol.value,
                            shndx: symbol.shndx,
                        }
                    }
                    None => {
                        let limit = table.len() as u32;
                        diags.record_warning(
                            Some(what),
                            &ElfError::IndexOutOfRange {
                                what: "relocation symbol",
                                index: u64::from(relocation.sym),
                                limit: u64::from(limit),
                            },
                        );
                        SymbolRef::OutOfRange {
                            index: relocation.sym,
                            limit,
                        }
                    }
                },
            };
            RelocationEntry { relocation, symbol }
        })
        .collect()
}

impl Container<'_>
{
    /// Decode the relocation table held in `section`.
    pub fn parse_relocation_section(&self, section: &SectionDescriptor) -> Result<RelocationSection>
    {
        self.decode_relocation_section(section, &mut HashMap::new())
    }

    /// The symbol table `section` links to, decoded once per link index.
    ///
    /// A link to anything but `SHT_SYMTAB`/`SHT_DYNSYM` is reported and
    /// treated as no symbol table.
    fn linked_symbol_table<'t>(
        &self,
        section: &SectionDescriptor,
        symbol_tables: &'t mut HashMap<usize, SymbolTable>,
    ) -> Result<Option<&'t SymbolTable>>
    {
        if section.link == 0 {
            return Ok(None);
        }
        let index = section.link as usize;
        let Some(symtab) = self.section(index) else {
            self.record_warning(
                &section.name,
                &ElfError::IndexOutOfRange {
                    what: "symbol table link",
                    index: u64::from(section.link),
                    limit: self.sections().len() as u64,
                },
            );
            return Ok(None);
        };
        if !matches!(symtab.sh_type, SHT_SYMTAB | SHT_DYNSYM) {
            self.warn(
                &section.name,
                Some(section.offset),
                format!("linked section {} is not a symbol table", symtab.name),
            );
            return Ok(None);
        }
        if !symbol_tables.contains_key(&index) {
            let table = self.parse_symbol_table(symtab)?;
            symbol_tables.insert(index, table);
        }
        Ok(symbol_tables.get(&index))
    }

    fn decode_relocation_section(
        &self,
        section: &SectionDescriptor,
        symbol_tables: &mut HashMap<usize, SymbolTable>,
    ) -> Result<RelocationSection>
    {
        let header = self.header();
        let style = match section.sh_type {
            SHT_RELA => RelocationStyle::Rela,
            SHT_REL => RelocationStyle::Rel,
            _ => guess_relocation_style(header.machine),
        };
        let data = self.section_data(section)?;
        let relocations = decode_relocations(&data, style, header.class, header.order, header.machine, section.offset)?;

        let symbols = self.linked_symbol_table(section, symbol_tables)?;

        let entries = resolve_symbols(
            relocations,
            symbols,
            |index| self.section_at(index).map(|s| s.name.clone()),
            &section.name,
            &mut self.diagnostics(),
        );
        let target = (section.info != 0).then_some(section.info as usize);
        if let Some(target) = target {
            if self.section(target).is_none() {
                self.warn(
                    &section.name,
                    Some(section.offset),
                    format!("relocation target section {target} does not exist"),
                );
            }
        }
        debug!(section = %section.name, count = entries.len(), "decoded relocations");

        Ok(RelocationSection {
            name: section.name.clone(),
            offset: section.offset,
            style,
            target,
            entries,
        })
    }

    /// Every `SHT_REL`/`SHT_RELA` section; unreadable ones become fatal diagnostics.
    pub fn relocation_sections(&self) -> Vec<RelocationSection>
    {
        let mut symbol_tables = HashMap::new();
        self.sections()
            .iter()
            .filter(|section| matches!(section.sh_type, SHT_REL | SHT_RELA))
            .filter_map(|section| match self.decode_relocation_section(section, &mut symbol_tables) {
                Ok(table) => Some(table),
                Err(err) => {
                    self.record_error(&section.name, &err);
                    None
                }
            })
            .collect()
    }

    /// Relocations described by the dynamic table (`DT_RELA`, `DT_REL`, `DT_JMPREL`).
    ///
    /// `DT_PLTREL` names the layout of the PLT relocations; when it is missing
    /// the architecture default from [`guess_relocation_style`] is used.
    pub fn dynamic_relocations(&self) -> Vec<RelocationSection>
    {
        let Some(dynamic) = self.dynamic() else {
            return Vec::new();
        };
        let header = self.header();
        let plt_style = match dynamic.find(DT_PLTREL) {
            Some(value) if value == u64::from(DT_RELA) => RelocationStyle::Rela,
            Some(value) if value == u64::from(DT_REL) => RelocationStyle::Rel,
            _ => guess_relocation_style(header.machine),
        };
        let tables = [
            ("DT_RELA", DT_RELA, DT_RELASZ, RelocationStyle::Rela),
            ("DT_REL", DT_REL, DT_RELSZ, RelocationStyle::Rel),
            ("DT_JMPREL", DT_JMPREL, DT_PLTRELSZ, plt_style),
        ];

        let symbols = match self.locate_dynamic_symbols() {
            Ok(symbols) => symbols,
            Err(err) => {
                self.record_warning(".dynsym", &err);
                None
            }
        };

        let mut out = Vec::new();
        for (name, address_tag, size_tag, style) in tables {
            let (Some(address), Some(size)) = (dynamic.find(address_tag), dynamic.find(size_tag)) else {
                continue;
            };
            if size == 0 {
                continue;
            }
            let offset = self.map_address_to_offset(address, size);
            let data = match self.source().read_at(offset, size) {
                Ok(data) => data,
                Err(err) => {
                    self.record_error(name, &err);
                    continue;
                }
            };
            let relocations =
                match decode_relocations(&data, style, header.class, header.order, header.machine, offset) {
                    Ok(relocations) => relocations,
                    Err(err) => {
                        self.record_error(name, &err);
                        continue;
                    }
                };
            let entries = resolve_symbols(
                relocations,
                symbols.as_ref(),
                |index| self.section_at(index).map(|s| s.name.clone()),
                name,
                &mut self.diagnostics(),
            );
            out.push(RelocationSection {
                name: name.to_owned(),
                offset,
                style,
                target: None,
                entries,
            });
        }
        out
    }
}
