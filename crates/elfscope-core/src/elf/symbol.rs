//! Symbol tables (`SHT_SYMTAB`, `SHT_DYNSYM`) and extended section indices.

use object::elf::{SHN_XINDEX, SHT_DYNSYM, SHT_STRTAB, SHT_SYMTAB, SHT_SYMTAB_SHNDX, STT_FUNC};
use tracing::debug;

use super::container::Container;
use super::header::ElfClass;
use super::section::{SectionDescriptor, SectionIndex};
use super::strtab::{StringTable, CORRUPT_NAME};
use crate::demangle::{make_symbol_name, SymbolName};
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reader::{ByteOrder, Cursor};

/// One symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol
{
    /// Position in its table.
    pub index: usize,
    pub name_offset: u32,
    pub name: SymbolName,
    pub value: u64,
    pub size: u64,
    pub info: u8,
    pub other: u8,
    /// `st_shndx` exactly as stored.
    pub raw_shndx: u16,
    /// Classified section index, with `SHN_XINDEX` already resolved where possible.
    pub shndx: SectionIndex,
}

impl Symbol
{
    /// `STB_*` value.
    pub fn binding(&self) -> u8
    {
        self.info >> 4
    }

    /// `STT_*` value.
    pub fn kind(&self) -> u8
    {
        self.info & 0xf
    }

    /// `STV_*` value.
    pub fn visibility(&self) -> u8
    {
        self.other & 0x3
    }

    pub fn is_defined(&self) -> bool
    {
        !self.shndx.is_undefined()
    }

    pub fn is_function(&self) -> bool
    {
        self.kind() == STT_FUNC
    }
}

/// A decoded symbol table.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable
{
    /// Section the table came from; `None` when located through the dynamic table.
    pub section: Option<usize>,
    pub dynamic: bool,
    pub symbols: Vec<Symbol>,
}

impl SymbolTable
{
    pub fn len(&self) -> usize
    {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Symbol>
    {
        self.symbols.get(index)
    }

    /// Nearest `STT_FUNC` symbol at or before `address`, at most `max_distance` away.
    ///
    /// Only symbols in `section` are considered, unless `section` is
    /// undefined, in which case every section qualifies. Returns the symbol and
    /// the distance from its value to `address`.
    pub fn nearest_function(&self, address: u64, section: SectionIndex, max_distance: u64) -> Option<(&Symbol, u64)>
    {
        self.symbols
            .iter()
            .filter(|symbol| symbol.is_function())
            .filter(|symbol| section.is_undefined() || symbol.shndx == section)
            .filter(|symbol| symbol.value <= address)
            .map(|symbol| (symbol, address - symbol.value))
            .filter(|&(_, distance)| distance <= max_distance)
            .min_by_key(|&(symbol, distance)| (distance, symbol.name.raw().is_empty()))
    }
}

/// Inputs shared by every entry of one symbol table.
pub struct SymbolDecoder<'a>
{
    pub class: ElfClass,
    pub order: ByteOrder,
    pub strings: &'a StringTable,
    /// Contents of the matching `SHT_SYMTAB_SHNDX` section, if any.
    pub extended: Option<&'a [u32]>,
    pub demangle: bool,
}

impl SymbolDecoder<'_>
{
    /// Decode every whole record in `data`.
    pub fn decode_all(&self, data: &[u8], base: u64, diags: &mut Diagnostics, what: &str) -> Result<Vec<Symbol>>
    {
        let record = self.class.symbol_size() as usize;
        let mut symbols = Vec::with_capacity(data.len() / record);
        for (index, chunk) in data.chunks_exact(record).enumerate() {
            let mut cursor = Cursor::with_base(chunk, self.order, base + (index * record) as u64);
            symbols.push(self.decode_one(&mut cursor, index, diags, what)?);
        }
        if data.len() % record != 0 {
            diags.warn(
                Some(what),
                Some(base),
                format!("symbol table size {} is not a multiple of {record}", data.len()),
            );
        }
        Ok(symbols)
    }

    fn decode_one(&self, cursor: &mut Cursor<'_>, index: usize, diags: &mut Diagnostics, what: &str) -> Result<Symbol>
    {
        let (name_offset, value, size, info, other, raw_shndx) = match self.class {
            ElfClass::Elf32 => {
                let name = cursor.u32()?;
                let value = u64::from(cursor.u32()?);
                let size = u64::from(cursor.u32()?);
                (name, value, size, cursor.u8()?, cursor.u8()?, cursor.u16()?)
            }
            ElfClass::Elf64 => {
                let name = cursor.u32()?;
                let info = cursor.u8()?;
                let other = cursor.u8()?;
                let shndx = cursor.u16()?;
                (name, cursor.u64()?, cursor.u64()?, info, other, shndx)
            }
        };

        let shndx = if raw_shndx == SHN_XINDEX {
            match self.extended.and_then(|table| table.get(index)) {
                Some(&true_index) => SectionIndex::Regular(true_index as usize),
                None => {
                    diags.warn(
                        Some(what),
                        None,
                        format!("symbol {index} uses SHN_XINDEX but has no extended section index"),
                    );
                    SectionIndex::XIndex
                }
            }
        } else {
            SectionIndex::from_raw(u32::from(raw_shndx))
        };

        let raw_name = self
            .strings
            .get(u64::from(name_offset))
            .map_or_else(|| CORRUPT_NAME.to_owned(), |name| name.into_owned());
        let name = if self.demangle {
            make_symbol_name(raw_name)
        } else {
            SymbolName::plain(raw_name)
        };

        Ok(Symbol {
            index,
            name_offset,
            name,
            value,
            size,
            info,
            other,
            raw_shndx,
            shndx,
        })
    }
}

impl Container<'_>
{
    /// The string table a section links to, or an empty one (with a warning).
    pub fn linked_strings(&self, section: &SectionDescriptor) -> StringTable
    {
        let Some(strtab) = self.section(section.link as usize) else {
            self.warn(
                &section.name,
                Some(section.offset),
                format!("string table link {} is out of range", section.link),
            );
            return StringTable::default();
        };
        if strtab.sh_type != SHT_STRTAB {
            self.warn(
                &section.name,
                Some(section.offset),
                format!("linked section {} is not a string table", strtab.name),
            );
        }
        match self.section_data(strtab) {
            Ok(data) => StringTable::new(data),
            Err(err) => {
                self.record_warning(&strtab.name, &err);
                StringTable::default()
            }
        }
    }

    /// Contents of the `SHT_SYMTAB_SHNDX` section associated with `symtab`.
    fn extended_indices(&self, symtab: &SectionDescriptor) -> Option<Vec<u32>>
    {
        let shndx = self
            .sections_of_type(SHT_SYMTAB_SHNDX)
            .find(|section| section.link as usize == symtab.index)?;
        let data = match self.section_data(shndx) {
            Ok(data) => data,
            Err(err) => {
                self.record_warning(&shndx.name, &err);
                return None;
            }
        };
        let order = self.header().order;
        Some(data.chunks_exact(4).map(|chunk| order.u32_at(chunk, 0).unwrap_or(0)).collect())
    }

    /// Decode the symbol table held in `section`.
    pub fn parse_symbol_table(&self, section: &SectionDescriptor) -> Result<SymbolTable>
    {
        let data = self.section_data(section)?;
        let strings = self.linked_strings(section);
        let extended = self.extended_indices(section);
        let decoder = SymbolDecoder {
            class: self.header().class,
            order: self.header().order,
            strings: &strings,
            extended: extended.as_deref(),
            demangle: self.options().demangle,
        };
        let symbols = decoder.decode_all(&data, section.offset, &mut self.diagnostics(), &section.name)?;
        debug!(section = %section.name, count = symbols.len(), "decoded symbol table");
        Ok(SymbolTable {
            section: Some(section.index),
            dynamic: section.sh_type == SHT_DYNSYM,
            symbols,
        })
    }

    /// Every `SHT_SYMTAB` and `SHT_DYNSYM` table; unreadable tables become fatal diagnostics.
    pub fn symbol_tables(&self) -> Vec<SymbolTable>
    {
        self.sections()
            .iter()
            .filter(|section| matches!(section.sh_type, SHT_SYMTAB | SHT_DYNSYM))
            .filter_map(|section| match self.parse_symbol_table(section) {
                Ok(table) => Some(table),
                Err(err) => {
                    self.record_error(&section.name, &err);
                    None
                }
            })
            .collect()
    }

    /// The static symbol table, falling back to the dynamic one.
    pub fn primary_symbol_table(&self) -> Option<SymbolTable>
    {
        let section = self
            .sections_of_type(SHT_SYMTAB)
            .next()
            .or_else(|| self.sections_of_type(SHT_DYNSYM).next())?;
        match self.parse_symbol_table(section) {
            Ok(table) => Some(table),
            Err(err) => {
                self.record_error(&section.name, &err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use object::elf::{STB_GLOBAL, STT_OBJECT};

    use super::*;

    fn symbol(index: usize, value: u64, kind: u8, shndx: SectionIndex) -> Symbol
    {
        Symbol {
            index,
            name_offset: 0,
            name: SymbolName::plain(format!("sym{index}")),
            value,
            size: 0,
            info: (STB_GLOBAL << 4) | kind,
            other: 0,
            raw_shndx: 0,
            shndx,
        }
    }

    #[test]
    fn test_decode_elf64_symbol()
    {
        let mut strings = b"\0main\0".to_vec();
        strings.push(0);
        let strings = StringTable::new(strings);
        let mut data = vec![0u8; 24];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.push((STB_GLOBAL << 4) | STT_FUNC);
        data.push(0);
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&0x401000u64.to_le_bytes());
        data.extend_from_slice(&0x20u64.to_le_bytes());

        let decoder = SymbolDecoder {
            class: ElfClass::Elf64,
            order: ByteOrder::Little,
            strings: &strings,
            extended: None,
            demangle: true,
        };
        let mut diags = Diagnostics::new();
        let symbols = decoder.decode_all(&data, 0, &mut diags, ".symtab").unwrap();
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].shndx, SectionIndex::Undefined);
        let main = &symbols[1];
        assert_eq!(main.name.raw(), "main");
        assert_eq!(main.value, 0x401000);
        assert_eq!(main.size, 0x20);
        assert_eq!(main.binding(), STB_GLOBAL);
        assert!(main.is_function());
        assert_eq!(main.shndx, SectionIndex::Regular(1));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_extended_index_resolution()
    {
        let strings = StringTable::new(vec![0]);
        let mut data = vec![0u8; 12];
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&SHN_XINDEX.to_be_bytes());
        let mut record = vec![0u8; 16];
        record[14..16].copy_from_slice(&SHN_XINDEX.to_be_bytes());
        let mut table = record.clone();
        table.extend_from_slice(&record);

        let extended = [0x1_0005u32];
        let decoder = SymbolDecoder {
            class: ElfClass::Elf32,
            order: ByteOrder::Big,
            strings: &strings,
            extended: Some(&extended),
            demangle: false,
        };
        let mut diags = Diagnostics::new();
        let symbols = decoder.decode_all(&table, 0x40, &mut diags, ".symtab").unwrap();
        assert_eq!(symbols[0].shndx, SectionIndex::Regular(0x1_0005));
        assert_eq!(symbols[1].shndx, SectionIndex::XIndex);
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn test_bad_name_offset_is_corrupt()
    {
        let strings = StringTable::new(b"\0abc\0".to_vec());
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(&100u32.to_le_bytes());
        let decoder = SymbolDecoder {
            class: ElfClass::Elf32,
            order: ByteOrder::Little,
            strings: &strings,
            extended: None,
            demangle: false,
        };
        let symbols = decoder.decode_all(&data, 0, &mut Diagnostics::new(), ".symtab").unwrap();
        assert_eq!(symbols[0].name.raw(), CORRUPT_NAME);
    }

    #[test]
    fn test_nearest_function_respects_section_and_distance()
    {
        let table = SymbolTable {
            section: Some(2),
            dynamic: false,
            symbols: vec![
                symbol(0, 0x1000, STT_FUNC, SectionIndex::Regular(1)),
                symbol(1, 0x1100, STT_FUNC, SectionIndex::Regular(2)),
                symbol(2, 0x1180, STT_OBJECT, SectionIndex::Regular(1)),
                symbol(3, 0x1080, STT_FUNC, SectionIndex::Regular(1)),
            ],
        };
        let (found, distance) = table.nearest_function(0x1190, SectionIndex::Regular(1), 0x1000).unwrap();
        assert_eq!(found.index, 3);
        assert_eq!(distance, 0x110);

        let (found, _) = table.nearest_function(0x1190, SectionIndex::Undefined, 0x1000).unwrap();
        assert_eq!(found.index, 1);

        assert!(table.nearest_function(0x1190, SectionIndex::Regular(1), 0x100).is_none());
        assert!(table.nearest_function(0x0fff, SectionIndex::Undefined, 0x1000).is_none());
    }
}
