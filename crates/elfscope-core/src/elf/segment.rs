//! Program headers and the section-to-segment mapping.

use object::elf::{PF_R, PF_W, PF_X, PN_XNUM, PT_GNU_RELRO, PT_LOAD, PT_TLS};
use tracing::debug;

use super::header::{ElfClass, FileHeader};
use super::section::SectionDescriptor;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reader::{bulk_read, Cursor};
use crate::source::ByteSource;

/// A program header, width-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentDescriptor
{
    pub p_type: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

impl SegmentDescriptor
{
    pub fn is_load(&self) -> bool
    {
        self.p_type == PT_LOAD
    }

    /// `vaddr` rounded down to the segment alignment.
    ///
    /// Alignments that are zero or not a power of two are treated as 1.
    pub fn aligned_vaddr(&self) -> u64
    {
        if self.align.is_power_of_two() {
            self.vaddr & !(self.align - 1)
        } else {
            self.vaddr
        }
    }

    /// Whether the file-backed part of this segment covers `[vma, vma + size)`.
    pub fn covers(&self, vma: u64, size: u64) -> bool
    {
        let Some(end) = vma.checked_add(size) else {
            return false;
        };
        vma >= self.aligned_vaddr() && end <= self.vaddr.saturating_add(self.filesz)
    }

    /// `R`, `W`, `E` flag letters, blank-padded like readelf.
    pub fn flag_letters(&self) -> String
    {
        let mut out = String::with_capacity(3);
        out.push(if self.flags & PF_R != 0 { 'R' } else { ' ' });
        out.push(if self.flags & PF_W != 0 { 'W' } else { ' ' });
        out.push(if self.flags & PF_X != 0 { 'E' } else { ' ' });
        out
    }
}

fn decode_segment(cursor: &mut Cursor<'_>, class: ElfClass) -> Result<SegmentDescriptor>
{
    match class {
        ElfClass::Elf32 => {
            let p_type = cursor.u32()?;
            let offset = u64::from(cursor.u32()?);
            let vaddr = u64::from(cursor.u32()?);
            let paddr = u64::from(cursor.u32()?);
            let filesz = u64::from(cursor.u32()?);
            let memsz = u64::from(cursor.u32()?);
            let flags = cursor.u32()?;
            let align = u64::from(cursor.u32()?);
            Ok(SegmentDescriptor {
                p_type,
                flags,
                offset,
                vaddr,
                paddr,
                filesz,
                memsz,
                align,
            })
        }
        ElfClass::Elf64 => {
            let p_type = cursor.u32()?;
            let flags = cursor.u32()?;
            Ok(SegmentDescriptor {
                p_type,
                flags,
                offset: cursor.u64()?,
                vaddr: cursor.u64()?,
                paddr: cursor.u64()?,
                filesz: cursor.u64()?,
                memsz: cursor.u64()?,
                align: cursor.u64()?,
            })
        }
    }
}

/// Read the program header table.
///
/// `first_section` is section 0, which holds the true count in `sh_info`
/// when `e_phnum` is `PN_XNUM`.
pub fn parse_segments(
    header: &FileHeader,
    source: &dyn ByteSource,
    first_section: Option<&SectionDescriptor>,
    diags: &mut Diagnostics,
) -> Result<Vec<SegmentDescriptor>>
{
    if header.phoff == 0 || header.phnum == 0 {
        return Ok(Vec::new());
    }

    let count = if header.phnum == PN_XNUM {
        match first_section {
            Some(section) => u64::from(section.info),
            None => {
                diags.warn(
                    Some("program headers"),
                    Some(header.phoff),
                    "e_phnum is PN_XNUM but there is no section 0 to hold the count",
                );
                u64::from(PN_XNUM)
            }
        }
    } else {
        u64::from(header.phnum)
    };

    let expected = header.class.program_header_size();
    let mut stride = u64::from(header.phentsize);
    if stride != expected {
        diags.warn(
            Some("program headers"),
            Some(header.phoff),
            format!("program header entry size {stride} does not match expected {expected}"),
        );
        if stride < expected {
            stride = expected;
        }
    }

    let table = bulk_read(source, header.phoff, stride, count)?;
    let mut segments = Vec::with_capacity(count as usize);
    for chunk in table.chunks_exact(stride as usize) {
        let mut cursor = Cursor::new(chunk, header.order);
        segments.push(decode_segment(&mut cursor, header.class)?);
    }
    debug!(count = segments.len(), phoff = header.phoff, "read program headers");
    Ok(segments)
}

/// Translate a virtual address to a file offset through the first `PT_LOAD`
/// whose file-backed range contains `[vma, vma + size)`.
pub fn map_address_to_offset(segments: &[SegmentDescriptor], vma: u64, size: u64) -> Option<u64>
{
    segments
        .iter()
        .filter(|segment| segment.is_load())
        .find(|segment| segment.covers(vma, size))
        .map(|segment| vma.wrapping_sub(segment.vaddr).wrapping_add(segment.offset))
}

/// Whether `section` belongs to `segment`.
///
/// Allocated sections are matched by address, everything else by file offset.
/// Thread-local `SHT_NOBITS` sections only belong to `PT_TLS`.
pub fn section_in_segment(section: &SectionDescriptor, segment: &SegmentDescriptor) -> bool
{
    let tls = section.is_tls();
    if tls && !matches!(segment.p_type, PT_TLS | PT_LOAD | PT_GNU_RELRO) {
        return false;
    }
    if !tls && segment.p_type == PT_TLS {
        return false;
    }
    if tls && section.is_nobits() && segment.p_type != PT_TLS {
        return false;
    }

    if section.is_alloc() {
        let seg_end = segment.vaddr.saturating_add(segment.memsz);
        let sec_end = section.addr.saturating_add(section.size);
        let in_memory = section.addr >= segment.vaddr
            && sec_end <= seg_end
            && (section.size > 0 || section.addr < seg_end || segment.memsz == 0);
        if !in_memory {
            return false;
        }
        if section.is_nobits() {
            return true;
        }
        return section.offset >= segment.offset
            && section.offset.saturating_add(section.size) <= segment.offset.saturating_add(segment.filesz);
    }

    if section.is_nobits() {
        return false;
    }
    let seg_end = segment.offset.saturating_add(segment.filesz);
    section.offset >= segment.offset
        && section.offset.saturating_add(section.size) <= seg_end
        && (section.size > 0 || section.offset < seg_end)
}

/// Sections contained in one segment, by section index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMapping
{
    pub segment: usize,
    pub sections: Vec<usize>,
}

/// For every segment, the sections it contains, in section-table order.
pub fn segments_to_sections(segments: &[SegmentDescriptor], sections: &[SectionDescriptor]) -> Vec<SegmentMapping>
{
    segments
        .iter()
        .enumerate()
        .map(|(segment_index, segment)| SegmentMapping {
            segment: segment_index,
            sections: sections
                .iter()
                .skip(1)
                .filter(|section| section_in_segment(section, segment))
                .map(|section| section.index)
                .collect(),
        })
        .collect()
}
