//! # Container
//!
//! The per-file decode session.
//!
//! A [`Container`] owns everything learned about one ELF image: the file
//! header, the section table, and lazily computed caches such as the program
//! headers and the dynamic table. It is created once per file (or archive
//! member, through a [`SubSource`](crate::source::SubSource) window) and
//! dropped afterwards, so nothing leaks between inputs.
//!
//! Passes borrow the container immutably. Caches use
//! `once_cell::unsync::OnceCell` and the diagnostic stream sits behind a
//! `RefCell`, which keeps the container single-threaded.

use std::cell::{RefCell, RefMut};

use once_cell::unsync::OnceCell;
use tracing::{debug, info};

use super::dynamic::{parse_dynamic_table, DynamicTable};
use super::header::{parse_header, ElfClass, FileHeader, ELF32_HEADER_SIZE, ELF64_HEADER_SIZE, MAX_HEADER_SIZE};
use super::section::{parse_sections, SectionDescriptor, SectionIndex};
use super::segment::{self, parse_segments, SegmentDescriptor, SegmentMapping};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::options::DecodeOptions;
use crate::source::ByteSource;

pub struct Container<'s>
{
    source: &'s dyn ByteSource,
    header: FileHeader,
    sections: Vec<SectionDescriptor>,
    string_index: Option<usize>,
    segments: OnceCell<Vec<SegmentDescriptor>>,
    dynamic: OnceCell<Option<DynamicTable>>,
    diagnostics: RefCell<Diagnostics>,
    options: DecodeOptions,
}

impl<'s> Container<'s>
{
    /// Read the file header and section table of `source`.
    ///
    /// ## Errors
    ///
    /// Fails only when the file header itself is unusable (bad magic,
    /// unsupported class, truncated header). A broken section table is
    /// recorded as a fatal diagnostic and leaves the container without sections.
    pub fn open(source: &'s dyn ByteSource, options: DecodeOptions) -> Result<Self>
    {
        let available = source.size().min(MAX_HEADER_SIZE as u64);
        let bytes = source.read_at(0, available)?;
        let header = parse_header(&bytes)?;
        info!(
            class = ?header.class,
            order = ?header.order,
            machine = header.machine,
            shnum = header.shnum,
            phnum = header.phnum,
            "opened ELF image"
        );

        let mut diagnostics = Diagnostics::new();
        let expected_ehsize = match header.class {
            ElfClass::Elf32 => ELF32_HEADER_SIZE,
            ElfClass::Elf64 => ELF64_HEADER_SIZE,
        };
        if usize::from(header.ehsize) != expected_ehsize {
            diagnostics.warn(
                Some("file header"),
                Some(0),
                format!("e_ehsize {} does not match expected {expected_ehsize}", header.ehsize),
            );
        }
        let table = match parse_sections(&header, source, &mut diagnostics) {
            Ok(table) => table,
            Err(err) => {
                diagnostics.record_error(Some("section headers"), &err);
                Default::default()
            }
        };

        Ok(Self {
            source,
            header,
            sections: table.sections,
            string_index: table.string_index,
            segments: OnceCell::new(),
            dynamic: OnceCell::new(),
            diagnostics: RefCell::new(diagnostics),
            options,
        })
    }

    pub fn header(&self) -> &FileHeader
    {
        &self.header
    }

    pub fn source(&self) -> &'s dyn ByteSource
    {
        self.source
    }

    pub fn options(&self) -> &DecodeOptions
    {
        &self.options
    }

    pub fn sections(&self) -> &[SectionDescriptor]
    {
        &self.sections
    }

    /// Index of the section-header string table, if one was found.
    pub fn section_string_index(&self) -> Option<usize>
    {
        self.string_index
    }

    pub fn section(&self, index: usize) -> Option<&SectionDescriptor>
    {
        self.sections.get(index)
    }

    /// Look up a section through a classified index; reserved values never resolve.
    pub fn section_at(&self, index: SectionIndex) -> Option<&SectionDescriptor>
    {
        index.array_index().and_then(|i| self.sections.get(i))
    }

    /// First section with the given name.
    pub fn section_by_name(&self, name: &str) -> Option<&SectionDescriptor>
    {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn sections_of_type(&self, sh_type: u32) -> impl Iterator<Item = &SectionDescriptor>
    {
        self.sections.iter().filter(move |section| section.sh_type == sh_type)
    }

    /// Name of the section at `index`, or a placeholder when it does not exist.
    pub fn section_name(&self, index: usize) -> &str
    {
        self.sections.get(index).map_or("<no-name>", |section| section.name.as_str())
    }

    /// Raw contents of a section; `SHT_NOBITS` sections read as empty.
    pub fn section_data(&self, section: &SectionDescriptor) -> Result<Vec<u8>>
    {
        if section.is_nobits() {
            return Ok(Vec::new());
        }
        self.source.read_at(section.offset, section.size)
    }

    /// Contents of the named section, if present and readable; read errors become warnings.
    pub fn section_data_by_name(&self, name: &str) -> Option<Vec<u8>>
    {
        let section = self.section_by_name(name)?;
        match self.section_data(section) {
            Ok(data) => Some(data),
            Err(err) => {
                self.diagnostics().record_warning(Some(name), &err);
                None
            }
        }
    }

    /// Program headers, parsed on first use.
    pub fn segments(&self) -> &[SegmentDescriptor]
    {
        self.segments.get_or_init(|| {
            let mut diags = self.diagnostics.borrow_mut();
            match parse_segments(&self.header, self.source, self.sections.first(), &mut diags) {
                Ok(segments) => segments,
                Err(err) => {
                    diags.record_error(Some("program headers"), &err);
                    Vec::new()
                }
            }
        })
    }

    /// File offset for `[vma, vma + size)`.
    ///
    /// Without program headers, or when no `PT_LOAD` covers the range, the
    /// address itself is returned and a warning is recorded.
    pub fn map_address_to_offset(&self, vma: u64, size: u64) -> u64
    {
        let segments = self.segments();
        if segments.is_empty() {
            self.warn(
                "program headers",
                None,
                format!("no program headers to translate address 0x{vma:x}; using it as a file offset"),
            );
            return vma;
        }
        match segment::map_address_to_offset(segments, vma, size) {
            Some(offset) => offset,
            None => {
                self.warn(
                    "program headers",
                    None,
                    format!("virtual address 0x{vma:x} (size 0x{size:x}) is not in any loadable segment"),
                );
                vma
            }
        }
    }

    /// The `PT_LOAD` segment whose file range holds `section`, if any.
    pub fn load_segment_of(&self, section: &SectionDescriptor) -> Option<&SegmentDescriptor>
    {
        self.segments()
            .iter()
            .find(|segment| segment.is_load() && segment::section_in_segment(section, segment))
    }

    pub fn segments_to_sections(&self) -> Vec<SegmentMapping>
    {
        segment::segments_to_sections(self.segments(), &self.sections)
    }

    /// Dynamic table, parsed on first use.
    pub fn dynamic(&self) -> Option<&DynamicTable>
    {
        self.dynamic
            .get_or_init(|| match parse_dynamic_table(self) {
                Ok(table) => table,
                Err(err) => {
                    self.record_error("dynamic section", &err);
                    None
                }
            })
            .as_ref()
    }

    pub fn diagnostics(&self) -> RefMut<'_, Diagnostics>
    {
        self.diagnostics.borrow_mut()
    }

    pub fn warn(&self, section: &str, offset: Option<u64>, message: impl Into<String>)
    {
        self.diagnostics().warn(Some(section), offset, message);
    }

    pub fn record_warning(&self, section: &str, err: &ElfError)
    {
        self.diagnostics().record_warning(Some(section), err);
    }

    pub fn record_error(&self, section: &str, err: &ElfError)
    {
        self.diagnostics().record_error(Some(section), err);
    }

    /// Drain the diagnostics gathered so far.
    pub fn take_diagnostics(&self) -> Diagnostics
    {
        let taken = std::mem::take(&mut *self.diagnostics.borrow_mut());
        debug!(count = taken.len(), "drained diagnostics");
        taken
    }
}
