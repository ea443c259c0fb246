//! Section headers, reserved section indices and the section-name index.

use object::elf::{
    SHF_ALLOC, SHF_COMPRESSED, SHF_EXCLUDE, SHF_EXECINSTR, SHF_GROUP, SHF_INFO_LINK, SHF_LINK_ORDER, SHF_MERGE,
    SHF_OS_NONCONFORMING, SHF_STRINGS, SHF_TLS, SHF_WRITE, SHN_ABS, SHN_COMMON, SHN_HIRESERVE, SHN_LORESERVE,
    SHN_UNDEF, SHN_XINDEX, SHT_DYNAMIC, SHT_DYNSYM, SHT_GNU_VERSYM, SHT_GROUP, SHT_NOBITS, SHT_REL, SHT_RELA,
    SHT_STRTAB, SHT_SYMTAB, SHT_SYMTAB_SHNDX,
};
use tracing::debug;

use super::header::{ElfClass, FileHeader};
use super::strtab::{StringTable, CORRUPT_NAME};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{bulk_read, Cursor};
use crate::source::ByteSource;

/// Number of indices in the reserved window `[SHN_LORESERVE, SHN_HIRESERVE]`.
pub const RESERVED_WINDOW: u32 = (SHN_HIRESERVE as u32) - (SHN_LORESERVE as u32) + 1;

/// A section header, width-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionDescriptor
{
    /// Position in the section header table.
    pub index: usize,
    /// Offset of the name in the section-header string table.
    pub name_offset: u32,
    /// Resolved name, or [`CORRUPT_NAME`] when the offset is invalid.
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl SectionDescriptor
{
    pub fn is_alloc(&self) -> bool
    {
        self.flags & u64::from(SHF_ALLOC) != 0
    }

    pub fn is_tls(&self) -> bool
    {
        self.flags & u64::from(SHF_TLS) != 0
    }

    /// Occupies no file space (`SHT_NOBITS`).
    pub fn is_nobits(&self) -> bool
    {
        self.sh_type == SHT_NOBITS
    }

    /// `[offset, offset + size)` in the file, or `None` for `SHT_NOBITS`.
    pub fn file_range(&self) -> Option<(u64, u64)>
    {
        if self.is_nobits() {
            None
        } else {
            Some((self.offset, self.offset.saturating_add(self.size)))
        }
    }

    /// Whether `address` falls inside this section's allocated range.
    pub fn contains_address(&self, address: u64) -> bool
    {
        self.is_alloc() && address >= self.addr && address < self.addr.saturating_add(self.size)
    }

    /// Number of fixed-size records in the section, if it has an entry size.
    pub fn entry_count(&self) -> u64
    {
        if self.entsize == 0 {
            0
        } else {
            self.size / self.entsize
        }
    }
}

/// Classification of a raw section index as stored in `st_shndx` and friends.
///
/// Indices inside the reserved window are never valid subscripts of the
/// section array; [`SectionIndex::array_index`] is the only way to get one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionIndex
{
    /// `SHN_UNDEF`
    Undefined,
    /// An ordinary section, already remapped to an array index.
    Regular(usize),
    /// `SHN_ABS`
    Absolute,
    /// `SHN_COMMON`
    Common,
    /// `SHN_XINDEX`: the true index lives in an `SHT_SYMTAB_SHNDX` table.
    XIndex,
    /// Another processor/OS-specific reserved value.
    Reserved(u32),
}

impl SectionIndex
{
    /// Classify a section number in the 16-bit `st_shndx` numbering.
    pub fn from_raw(number: u32) -> Self
    {
        if number == u32::from(SHN_UNDEF) {
            return SectionIndex::Undefined;
        }
        if let Some(index) = section_header_index(number) {
            return SectionIndex::Regular(index);
        }
        match number {
            n if n == u32::from(SHN_ABS) => SectionIndex::Absolute,
            n if n == u32::from(SHN_COMMON) => SectionIndex::Common,
            n if n == u32::from(SHN_XINDEX) => SectionIndex::XIndex,
            n => SectionIndex::Reserved(n),
        }
    }

    /// The array subscript this index denotes, if any.
    pub fn array_index(self) -> Option<usize>
    {
        match self {
            SectionIndex::Regular(index) => Some(index),
            _ => None,
        }
    }

    pub fn is_undefined(self) -> bool
    {
        self == SectionIndex::Undefined
    }

    /// Short label used when printing symbol tables (`UND`, `ABS`, `COM`, number).
    pub fn label(self) -> String
    {
        match self {
            SectionIndex::Undefined => "UND".to_owned(),
            SectionIndex::Regular(index) => index.to_string(),
            SectionIndex::Absolute => "ABS".to_owned(),
            SectionIndex::Common => "COM".to_owned(),
            SectionIndex::XIndex => "XINDEX".to_owned(),
            SectionIndex::Reserved(raw) => format!("RSV[0x{raw:04x}]"),
        }
    }
}

/// Map a section number to an index in the section array.
///
/// Numbers below `SHN_LORESERVE` map to themselves; numbers inside the
/// reserved window map to `None`; numbers above it denote array indices
/// shifted up by [`RESERVED_WINDOW`].
pub fn section_header_index(number: u32) -> Option<usize>
{
    if number < u32::from(SHN_LORESERVE) {
        Some(number as usize)
    } else if number <= u32::from(SHN_HIRESERVE) {
        None
    } else {
        Some((number - RESERVED_WINDOW) as usize)
    }
}

/// Inverse of [`section_header_index`] for array indices.
pub fn section_header_number(index: usize) -> u32
{
    let index = index as u32;
    if index < u32::from(SHN_LORESERVE) {
        index
    } else {
        index + RESERVED_WINDOW
    }
}

/// Result of reading the section header table.
#[derive(Debug, Clone, Default)]
pub struct SectionTable
{
    pub sections: Vec<SectionDescriptor>,
    /// Resolved index of the section-header string table.
    pub string_index: Option<usize>,
}

fn decode_section(cursor: &mut Cursor<'_>, class: ElfClass, index: usize) -> Result<SectionDescriptor>
{
    let word = class.word_size();
    let name_offset = cursor.u32()?;
    let sh_type = cursor.u32()?;
    let flags = cursor.uint(word)?;
    let addr = cursor.uint(word)?;
    let offset = cursor.uint(word)?;
    let size = cursor.uint(word)?;
    let link = cursor.u32()?;
    let info = cursor.u32()?;
    let addralign = cursor.uint(word)?;
    let entsize = cursor.uint(word)?;
    Ok(SectionDescriptor {
        index,
        name_offset,
        name: String::new(),
        sh_type,
        flags,
        addr,
        offset,
        size,
        link,
        info,
        addralign,
        entsize,
    })
}

fn read_section_headers(
    header: &FileHeader,
    source: &dyn ByteSource,
    stride: u64,
    count: u64,
) -> Result<Vec<SectionDescriptor>>
{
    let table = bulk_read(source, header.shoff, stride, count)?;
    let mut sections = Vec::with_capacity(count as usize);
    for index in 0..count as usize {
        let start = index * stride as usize;
        let mut cursor = Cursor::with_base(&table[start..start + stride as usize], header.order, header.shoff);
        sections.push(decode_section(&mut cursor, header.class, index)?);
    }
    Ok(sections)
}

/// Read and name every section header.
///
/// Handles the extended-count escapes: a stored count of zero means the true
/// count is in section 0's `sh_size`, and a string-table index of
/// `SHN_XINDEX` means the true index is in section 0's `sh_link`.
pub fn parse_sections(header: &FileHeader, source: &dyn ByteSource, diags: &mut Diagnostics) -> Result<SectionTable>
{
    if header.shoff == 0 {
        return Ok(SectionTable::default());
    }

    let expected = header.class.section_header_size();
    let mut stride = u64::from(header.shentsize);
    if stride != expected {
        diags.warn(
            Some("section headers"),
            Some(header.shoff),
            format!("section header entry size {stride} does not match expected {expected}"),
        );
        if stride < expected {
            stride = expected;
        }
    }

    let first = read_section_headers(header, source, stride, 1)?.remove(0);
    let count = if header.shnum == 0 { first.size } else { u64::from(header.shnum) };
    if count == 0 {
        return Ok(SectionTable::default());
    }

    let mut sections = read_section_headers(header, source, stride, count)?;
    debug!(count, shoff = header.shoff, "read section headers");

    let raw_string_index = if header.shstrndx == SHN_XINDEX {
        first.link
    } else {
        u32::from(header.shstrndx)
    };
    let string_index = match section_header_index(raw_string_index) {
        Some(index) if index < sections.len() => Some(index),
        _ if raw_string_index == u32::from(SHN_UNDEF) => None,
        _ => {
            diags.record_warning(
                Some("section headers"),
                &ElfError::IndexOutOfRange {
                    what: "section string table",
                    index: u64::from(raw_string_index),
                    limit: sections.len() as u64,
                },
            );
            None
        }
    };

    name_sections(&mut sections, string_index, header, source, diags);
    for section in &mut sections {
        validate_entry_size(section, header.class, diags);
    }

    Ok(SectionTable { sections, string_index })
}

fn name_sections(
    sections: &mut [SectionDescriptor],
    string_index: Option<usize>,
    header: &FileHeader,
    source: &dyn ByteSource,
    diags: &mut Diagnostics,
)
{
    let strings = match string_index {
        Some(index) => {
            let strtab = &sections[index];
            if strtab.sh_type != SHT_STRTAB {
                diags.warn(
                    Some(".shstrtab"),
                    Some(strtab.offset),
                    format!("section string table has type {:#x}, not SHT_STRTAB", strtab.sh_type),
                );
            }
            match source.read_at(strtab.offset, strtab.size) {
                Ok(data) => StringTable::new(data),
                Err(err) => {
                    diags.record_warning(Some(".shstrtab"), &err);
                    StringTable::default()
                }
            }
        }
        None => StringTable::default(),
    };

    for section in sections.iter_mut() {
        section.name = if strings.is_empty() {
            String::new()
        } else {
            strings.get(u64::from(section.name_offset)).map_or_else(
                || {
                    diags.warn(
                        Some("section headers"),
                        Some(header.shoff),
                        format!("section {} name offset {:#x} is out of range", section.index, section.name_offset),
                    );
                    CORRUPT_NAME.to_owned()
                },
                |name| name.into_owned(),
            )
        };
    }
}

/// Fixed record size a section of this type must have, if any.
pub fn expected_entry_size(sh_type: u32, class: ElfClass) -> Option<u64>
{
    match sh_type {
        SHT_SYMTAB | SHT_DYNSYM => Some(class.symbol_size()),
        SHT_REL => Some(class.rel_size()),
        SHT_RELA => Some(class.rela_size()),
        SHT_DYNAMIC => Some(class.dyn_size()),
        SHT_GROUP | SHT_SYMTAB_SHNDX => Some(4),
        SHT_GNU_VERSYM => Some(2),
        _ => None,
    }
}

/// Check `sh_entsize` against the fixed record size; on mismatch warn and use the fixed size.
pub fn validate_entry_size(section: &mut SectionDescriptor, class: ElfClass, diags: &mut Diagnostics)
{
    let Some(expected) = expected_entry_size(section.sh_type, class) else {
        return;
    };
    if section.entsize != expected {
        diags.warn(
            Some(&section.name),
            Some(section.offset),
            format!("<corrupt> entry size {} (expected {expected})", section.entsize),
        );
        section.entsize = expected;
    }
}

/// readelf-style flag letters for `sh_flags`.
pub fn section_flag_letters(flags: u64) -> String
{
    const LETTERS: &[(u32, char)] = &[
        (SHF_WRITE, 'W'),
        (SHF_ALLOC, 'A'),
        (SHF_EXECINSTR, 'X'),
        (SHF_MERGE, 'M'),
        (SHF_STRINGS, 'S'),
        (SHF_INFO_LINK, 'I'),
        (SHF_LINK_ORDER, 'L'),
        (SHF_OS_NONCONFORMING, 'O'),
        (SHF_GROUP, 'G'),
        (SHF_TLS, 'T'),
        (SHF_COMPRESSED, 'C'),
        (SHF_EXCLUDE, 'E'),
    ];

    let mut known = 0u64;
    let mut out = String::new();
    for &(bit, letter) in LETTERS {
        known |= u64::from(bit);
        if flags & u64::from(bit) != 0 {
            out.push(letter);
        }
    }
    let unknown = flags & !known;
    if unknown & 0x0ff0_0000 != 0 {
        out.push('o');
    }
    if unknown & 0xf000_0000 != 0 {
        out.push('p');
    }
    if unknown & !0xfff0_0000 != 0 {
        out.push('x');
    }
    out
}
