//! Dynamic table (`SHT_DYNAMIC` / `PT_DYNAMIC`) and the tables it points at.
//!
//! When a file has no section headers the dynamic segment is the only map of
//! the dynamic symbol and string tables, so this module also implements the
//! fallback lookups through `DT_SYMTAB` / `DT_STRTAB`.

use object::elf::{
    DT_NEEDED, DT_NULL, DT_RPATH, DT_RUNPATH, DT_SONAME, DT_STRSZ, DT_STRTAB, DT_SYMENT, DT_SYMTAB, PT_DYNAMIC,
    SHT_DYNAMIC, SHT_DYNSYM, SHT_NOBITS,
};
use tracing::{debug, warn};

use super::container::Container;
use super::header::ElfClass;
use super::strtab::StringTable;
use super::symbol::{SymbolDecoder, SymbolTable};
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

// Filter and audit tags also carry string-table offsets.
const DT_CONFIG: u32 = 0x6fff_fefa;
const DT_DEPAUDIT: u32 = 0x6fff_fefb;
const DT_AUDIT: u32 = 0x6fff_fefc;
const DT_AUXILIARY: u32 = 0x7fff_fffd;
const DT_FILTER: u32 = 0x7fff_ffff;

/// One `ElfN_Dyn` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicEntry
{
    /// `d_tag`, signed as in the ELF specification.
    pub tag: i64,
    /// `d_val` / `d_ptr`; which one depends on the tag.
    pub value: u64,
}

impl DynamicEntry
{
    pub fn is(&self, tag: u32) -> bool
    {
        self.tag == i64::from(tag)
    }

    /// Whether `value` is an offset into the dynamic string table.
    pub fn has_string_value(&self) -> bool
    {
        [
            DT_NEEDED,
            DT_SONAME,
            DT_RPATH,
            DT_RUNPATH,
            DT_AUXILIARY,
            DT_FILTER,
            DT_CONFIG,
            DT_DEPAUDIT,
            DT_AUDIT,
        ]
        .iter()
        .any(|&tag| self.is(tag))
    }
}

/// The decoded dynamic table, without its `DT_NULL` terminator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicTable
{
    /// File offset the table was read from.
    pub offset: u64,
    /// Section the table came from, or `None` when read through `PT_DYNAMIC`.
    pub section: Option<usize>,
    pub entries: Vec<DynamicEntry>,
    /// Whether a `DT_NULL` was found before the data ran out.
    pub terminated: bool,
}

impl DynamicTable
{
    /// Value of the first entry with `tag`.
    pub fn find(&self, tag: u32) -> Option<u64>
    {
        self.entries.iter().find(|entry| entry.is(tag)).map(|entry| entry.value)
    }

    /// Values of every entry with `tag`, in table order.
    pub fn values(&self, tag: u32) -> impl Iterator<Item = u64> + '_
    {
        self.entries
            .iter()
            .filter(move |entry| entry.is(tag))
            .map(|entry| entry.value)
    }

    /// `DT_NEEDED` names, resolved against `strings`.
    pub fn needed(&self, strings: &StringTable) -> Vec<String>
    {
        self.values(DT_NEEDED).map(|offset| strings.name(offset)).collect()
    }
}

/// Decode dynamic records until `DT_NULL` or the end of `data`.
pub fn decode_dynamic_entries(data: &[u8], class: ElfClass, order: ByteOrder) -> (Vec<DynamicEntry>, bool)
{
    let record = class.dyn_size() as usize;
    let word = class.word_size();
    let mut entries = Vec::with_capacity(data.len() / record);
    for chunk in data.chunks_exact(record) {
        let mut cursor = Cursor::new(chunk, order);
        // chunks_exact guarantees both words are present
        let (Ok(tag), Ok(value)) = (cursor.sint(word), cursor.uint(word)) else {
            break;
        };
        if tag == i64::from(DT_NULL) {
            return (entries, true);
        }
        entries.push(DynamicEntry { tag, value });
    }
    (entries, false)
}

/// Locate and decode the dynamic table.
///
/// The `SHT_DYNAMIC` section is preferred. Without one, `PT_DYNAMIC` is read
/// directly; its size is capped by the end of the source, and the `DT_NULL`
/// terminator bounds the table.
pub fn parse_dynamic_table(container: &Container<'_>) -> Result<Option<DynamicTable>>
{
    let header = container.header();
    let source = container.source();

    let (offset, size, section) = if let Some(section) = container.sections_of_type(SHT_DYNAMIC).next() {
        (section.offset, section.size, Some(section.index))
    } else if let Some(segment) = container.segments().iter().find(|segment| segment.p_type == PT_DYNAMIC) {
        if segment.offset >= source.size() {
            return Err(ElfError::TruncatedRead {
                offset: segment.offset,
                len: segment.filesz,
                available: 0,
            });
        }
        let available = source.size() - segment.offset;
        if segment.filesz > available {
            warn!(filesz = segment.filesz, available, "dynamic segment runs past end of file");
        }
        (segment.offset, segment.filesz.min(available), None)
    } else {
        return Ok(None);
    };

    if let Some(index) = section {
        if container.section(index).is_some_and(|s| s.sh_type == SHT_NOBITS) {
            container.warn(".dynamic", Some(offset), "dynamic section has no file data");
            return Ok(None);
        }
    }

    let data = source.read_at(offset, size)?;
    let (entries, terminated) = decode_dynamic_entries(&data, header.class, header.order);
    if !terminated {
        container.warn(".dynamic", Some(offset), "dynamic table is not terminated by DT_NULL");
    }
    debug!(offset, count = entries.len(), "decoded dynamic table");

    Ok(Some(DynamicTable {
        offset,
        section,
        entries,
        terminated,
    }))
}

impl Container<'_>
{
    /// The dynamic string table.
    ///
    /// Uses the section linked from `SHT_DYNAMIC` (or from `SHT_DYNSYM`) when
    /// section headers exist, else `DT_STRTAB`/`DT_STRSZ`. Without `DT_STRSZ`
    /// the table is assumed to run to the end of the file, which is only exact
    /// when it is the last thing in the file.
    pub fn locate_dynamic_strings(&self) -> StringTable
    {
        let linked = self
            .sections_of_type(SHT_DYNAMIC)
            .next()
            .or_else(|| self.sections_of_type(SHT_DYNSYM).next());
        if let Some(section) = linked {
            return self.linked_strings(section);
        }

        let Some(dynamic) = self.dynamic() else {
            return StringTable::default();
        };
        let Some(address) = dynamic.find(DT_STRTAB) else {
            return StringTable::default();
        };
        let size = dynamic.find(DT_STRSZ);
        let offset = self.map_address_to_offset(address, size.unwrap_or(0));
        let available = self.source().size().saturating_sub(offset);
        let length = match size {
            Some(size) if size <= available => size,
            Some(size) => {
                self.warn(
                    ".dynstr",
                    Some(offset),
                    format!("DT_STRSZ 0x{size:x} runs past end of file; truncating"),
                );
                available
            }
            None => {
                self.warn(
                    ".dynstr",
                    Some(offset),
                    "no DT_STRSZ; assuming the string table runs to end of file",
                );
                available
            }
        };
        match self.source().read_at(offset, length) {
            Ok(data) => StringTable::new(data),
            Err(err) => {
                self.record_warning(".dynstr", &err);
                StringTable::default()
            }
        }
    }

    /// The dynamic symbol table.
    ///
    /// Falls back to `DT_SYMTAB` when there is no `SHT_DYNSYM` section. The
    /// number of symbols is then unknown, so the table is assumed to extend to
    /// the end of the file; any result found this way is exact only if the
    /// table is the last thing in the file.
    pub fn locate_dynamic_symbols(&self) -> Result<Option<SymbolTable>>
    {
        if let Some(section) = self.sections_of_type(SHT_DYNSYM).next() {
            return self.parse_symbol_table(section).map(Some);
        }

        let Some(dynamic) = self.dynamic() else {
            return Ok(None);
        };
        let Some(address) = dynamic.find(DT_SYMTAB) else {
            return Ok(None);
        };

        let class = self.header().class;
        let expected = class.symbol_size();
        if let Some(entsize) = dynamic.find(DT_SYMENT) {
            if entsize != expected {
                self.warn(
                    ".dynsym",
                    None,
                    format!("<corrupt> DT_SYMENT {entsize} (expected {expected})"),
                );
            }
        }

        let offset = self.map_address_to_offset(address, 0);
        let available = self.source().size().saturating_sub(offset);
        let count = available / expected;
        self.warn(
            ".dynsym",
            Some(offset),
            format!("no section headers; assuming {count} dynamic symbols up to end of file"),
        );
        let data = self.source().read_at(offset, count * expected)?;
        let strings = self.locate_dynamic_strings();
        let decoder = SymbolDecoder {
            class,
            order: self.header().order,
            strings: &strings,
            extended: None,
            demangle: self.options().demangle,
        };
        let symbols = decoder.decode_all(&data, offset, &mut self.diagnostics(), ".dynsym")?;
        Ok(Some(SymbolTable {
            section: None,
            dynamic: true,
            symbols,
        }))
    }
}

/// Names of the bits set in a `DT_FLAGS` value.
pub fn dt_flags_names(value: u64) -> Vec<&'static str>
{
    const FLAGS: &[(u64, &str)] = &[
        (0x1, "ORIGIN"),
        (0x2, "SYMBOLIC"),
        (0x4, "TEXTREL"),
        (0x8, "BIND_NOW"),
        (0x10, "STATIC_TLS"),
    ];
    flag_names(value, FLAGS)
}

/// Names of the bits set in a `DT_FLAGS_1` value.
pub fn dt_flags_1_names(value: u64) -> Vec<&'static str>
{
    const FLAGS: &[(u64, &str)] = &[
        (0x1, "NOW"),
        (0x2, "GLOBAL"),
        (0x4, "GROUP"),
        (0x8, "NODELETE"),
        (0x10, "LOADFLTR"),
        (0x20, "INITFIRST"),
        (0x40, "NOOPEN"),
        (0x80, "ORIGIN"),
        (0x100, "DIRECT"),
        (0x200, "TRANS"),
        (0x400, "INTERPOSE"),
        (0x800, "NODEFLIB"),
        (0x1000, "NODUMP"),
        (0x2000, "CONFALT"),
        (0x4000, "ENDFILTEE"),
        (0x8000, "DISPRELDNE"),
        (0x1_0000, "DISPRELPND"),
        (0x2_0000, "NODIRECT"),
        (0x4_0000, "IGNMULDEF"),
        (0x8_0000, "NOKSYMS"),
        (0x10_0000, "NOHDR"),
        (0x20_0000, "EDITED"),
        (0x40_0000, "NORELOC"),
        (0x80_0000, "SYMINTPOSE"),
        (0x100_0000, "GLOBAUDIT"),
        (0x200_0000, "SINGLETON"),
        (0x400_0000, "STUB"),
        (0x800_0000, "PIE"),
    ];
    flag_names(value, FLAGS)
}

fn flag_names(value: u64, table: &[(u64, &'static str)]) -> Vec<&'static str>
{
    let mut names: Vec<&'static str> = table
        .iter()
        .filter(|&&(bit, _)| value & bit != 0)
        .map(|&(_, name)| name)
        .collect();
    let known = table.iter().fold(0u64, |acc, &(bit, _)| acc | bit);
    if value & !known != 0 {
        names.push("<unknown>");
    }
    names
}

#[cfg(test)]
mod tests
{
    use object::elf::{DT_HASH, DT_STRTAB};

    use super::*;

    fn encode(entries: &[(i64, u64)], class: ElfClass, order: ByteOrder) -> Vec<u8>
    {
        let mut out = Vec::new();
        for &(tag, value) in entries {
            match (class, order) {
                (ElfClass::Elf64, ByteOrder::Little) => {
                    out.extend_from_slice(&tag.to_le_bytes());
                    out.extend_from_slice(&value.to_le_bytes());
                }
                (ElfClass::Elf32, ByteOrder::Big) => {
                    out.extend_from_slice(&(tag as i32).to_be_bytes());
                    out.extend_from_slice(&(value as u32).to_be_bytes());
                }
                _ => unreachable!(),
            }
        }
        out
    }

    #[test]
    fn test_stops_at_null_tag()
    {
        let data = encode(
            &[(i64::from(DT_NEEDED), 1), (i64::from(DT_HASH), 0x400), (0, 0), (i64::from(DT_STRTAB), 9)],
            ElfClass::Elf64,
            ByteOrder::Little,
        );
        let (entries, terminated) = decode_dynamic_entries(&data, ElfClass::Elf64, ByteOrder::Little);
        assert!(terminated);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].has_string_value());
        assert!(!entries[1].has_string_value());
    }

    #[test]
    fn test_unterminated_table_on_short_data()
    {
        let mut data = encode(&[(i64::from(DT_NEEDED), 1)], ElfClass::Elf32, ByteOrder::Big);
        data.extend_from_slice(&[0, 0, 0]);
        let (entries, terminated) = decode_dynamic_entries(&data, ElfClass::Elf32, ByteOrder::Big);
        assert!(!terminated);
        assert_eq!(entries, vec![DynamicEntry {
            tag: i64::from(DT_NEEDED),
            value: 1,
        }]);
    }

    #[test]
    fn test_needed_names()
    {
        let table = DynamicTable {
            offset: 0,
            section: None,
            entries: vec![
                DynamicEntry {
                    tag: i64::from(DT_NEEDED),
                    value: 1,
                },
                DynamicEntry {
                    tag: i64::from(DT_NEEDED),
                    value: 11,
                },
            ],
            terminated: true,
        };
        let strings = StringTable::new(b"\0libc.so.6\0libm.so.6\0".to_vec());
        assert_eq!(table.needed(&strings), vec!["libc.so.6", "libm.so.6"]);
    }

    #[test]
    fn test_flag_names()
    {
        assert_eq!(dt_flags_names(0x8), vec!["BIND_NOW"]);
        assert_eq!(dt_flags_1_names(0x0800_0001), vec!["NOW", "PIE"]);
        assert_eq!(dt_flags_names(0x100), vec!["<unknown>"]);
    }
}
