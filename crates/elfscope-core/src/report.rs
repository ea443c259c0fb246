//! # Decode Report
//!
//! The single entry point a front end needs: [`decode`] opens a
//! [`Container`] over a byte source, runs the passes a [`DumpRequest`] asks
//! for and hands back typed results with every diagnostic raised on the way.
//!
//! Passes are independent. A pass that fails records a fatal diagnostic and
//! leaves its field empty; the remaining passes still run.

use tracing::{debug, info};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::dwarf::{
    self, build_abbrev_table, parse_frame_section, AbbrevTable, ArangeSet, DwarfSections, FrameFlavor,
    FrameRecord, InfoDump, LineProgram, ListKind, MacroList, PubNameSet, ResolvedList,
};
use crate::elf::{
    Container, DynamicTable, FileHeader, Note, RelocationSection, SectionDescriptor, SectionGroup,
    SegmentDescriptor, SegmentMapping, StringTable, SymbolTable, VersionInfo,
};
use crate::error::Result;
use crate::options::DecodeOptions;
use crate::source::ByteSource;
use crate::unwind::{hppa, ia64, HppaUnwindTable, Ia64UnwindTable};

/// Which DWARF sections to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugDump
{
    pub info: bool,
    pub abbrev: bool,
    pub lines: bool,
    /// `.debug_frame` and `.eh_frame`
    pub frames: bool,
    pub aranges: bool,
    pub pubnames: bool,
    pub pubtypes: bool,
    pub str: bool,
    pub loc: bool,
    pub ranges: bool,
    pub macinfo: bool,
}

impl DebugDump
{
    pub fn all() -> Self
    {
        Self {
            info: true,
            abbrev: true,
            lines: true,
            frames: true,
            aranges: true,
            pubnames: true,
            pubtypes: true,
            str: true,
            loc: true,
            ranges: true,
            macinfo: true,
        }
    }

    pub fn any(&self) -> bool
    {
        *self != Self::default()
    }

    /// Whether the DIE walk has to run, either for its own output or to
    /// collect list references.
    fn needs_walk(&self) -> bool
    {
        self.info || self.loc || self.ranges
    }
}

/// Which passes [`decode`] runs. The file header is always decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpRequest
{
    pub section_headers: bool,
    pub program_headers: bool,
    pub section_groups: bool,
    pub dynamic: bool,
    pub relocations: bool,
    pub symbols: bool,
    pub dyn_syms: bool,
    pub version_info: bool,
    pub notes: bool,
    pub unwind: bool,
    pub debug: DebugDump,
}

impl DumpRequest
{
    pub fn all() -> Self
    {
        Self {
            section_headers: true,
            program_headers: true,
            section_groups: true,
            dynamic: true,
            relocations: true,
            symbols: true,
            dyn_syms: true,
            version_info: true,
            notes: true,
            unwind: true,
            debug: DebugDump::all(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UnwindReport
{
    pub ia64: Vec<Ia64UnwindTable>,
    pub hppa: Vec<HppaUnwindTable>,
}

#[derive(Debug, Clone, Default)]
pub struct DebugReport
{
    /// Kept only when `.debug_info` itself was asked for.
    pub info: Option<InfoDump>,
    /// Each abbreviation table with its `.debug_abbrev` offset.
    pub abbreviations: Vec<(u64, AbbrevTable)>,
    pub lines: Vec<LineProgram>,
    pub debug_frame: Vec<FrameRecord>,
    pub eh_frame: Vec<FrameRecord>,
    pub aranges: Vec<ArangeSet>,
    pub pubnames: Vec<PubNameSet>,
    pub pubtypes: Vec<PubNameSet>,
    pub strings: Vec<(u64, String)>,
    pub locations: Vec<ResolvedList>,
    pub ranges: Vec<ResolvedList>,
    pub macros: Vec<MacroList>,
}

#[derive(Debug, Clone)]
pub struct DecodeReport
{
    pub header: FileHeader,
    pub sections: Vec<SectionDescriptor>,
    pub segments: Vec<SegmentDescriptor>,
    pub segment_sections: Vec<SegmentMapping>,
    pub groups: Vec<SectionGroup>,
    pub dynamic: Option<DynamicTable>,
    pub dynamic_strings: StringTable,
    pub relocations: Vec<RelocationSection>,
    pub symbols: Vec<SymbolTable>,
    pub versions: Option<VersionInfo>,
    /// Notes per `SHT_NOTE` section or `PT_NOTE` segment.
    pub notes: Vec<(String, Vec<Note>)>,
    pub unwind: Option<UnwindReport>,
    pub debug: Option<DebugReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DecodeReport
{
    fn new(header: FileHeader) -> Self
    {
        Self {
            header,
            sections: Vec::new(),
            segments: Vec::new(),
            segment_sections: Vec::new(),
            groups: Vec::new(),
            dynamic: None,
            dynamic_strings: StringTable::default(),
            relocations: Vec::new(),
            symbols: Vec::new(),
            versions: None,
            notes: Vec::new(),
            unwind: None,
            debug: None,
            diagnostics: Vec::new(),
        }
    }
}

/// Decode `source` as one ELF image.
///
/// ## Errors
///
/// Only for an unusable file header (bad magic, unsupported class, truncated
/// header). Everything else ends up in [`DecodeReport::diagnostics`].
pub fn decode(source: &dyn ByteSource, request: &DumpRequest, options: &DecodeOptions) -> Result<DecodeReport>
{
    let container = Container::open(source, options.clone())?;
    let mut report = DecodeReport::new(container.header().clone());

    // always kept: every other table refers to sections by index
    report.sections = container.sections().to_vec();
    if request.program_headers {
        report.segments = container.segments().to_vec();
        report.segment_sections = container.segments_to_sections();
    }
    if request.section_groups {
        report.groups = container.section_groups();
    }
    if request.dynamic {
        report.dynamic = container.dynamic().cloned();
        if report.dynamic.is_some() {
            report.dynamic_strings = container.locate_dynamic_strings();
        }
    }
    if request.relocations {
        report.relocations = container.relocation_sections();
        report.relocations.extend(container.dynamic_relocations());
    }
    if request.symbols || request.dyn_syms {
        report.symbols = symbol_tables(&container, request);
    }
    if request.version_info {
        report.versions = container.version_info();
    }
    if request.notes {
        report.notes = container.notes();
    }
    if request.unwind {
        report.unwind = Some(UnwindReport {
            ia64: ia64::decode_unwind_table(&container),
            hppa: hppa::decode_unwind_table(&container),
        });
    }
    if request.debug.any() {
        let sections = DwarfSections::load(&container);
        let mut diags = Diagnostics::new();
        report.debug = Some(decode_debug(&sections, &request.debug, options, &mut diags));
        container.diagnostics().extend(diags);
    }

    report.diagnostics = container.take_diagnostics().into_vec();
    info!(diagnostics = report.diagnostics.len(), "decode finished");
    Ok(report)
}

fn symbol_tables(container: &Container<'_>, request: &DumpRequest) -> Vec<SymbolTable>
{
    let mut tables: Vec<_> = container
        .symbol_tables()
        .into_iter()
        .filter(|table| if table.dynamic { request.dyn_syms } else { request.symbols })
        .collect();
    if request.dyn_syms && !tables.iter().any(|table| table.dynamic) {
        match container.locate_dynamic_symbols() {
            Ok(Some(table)) => tables.push(table),
            Ok(None) => {}
            Err(err) => container.record_warning(".dynsym", &err),
        }
    }
    tables
}

/// Every abbreviation table in `.debug_abbrev`, back to back.
fn abbreviation_tables(section: &dwarf::DebugSection, diags: &mut Diagnostics) -> Vec<(u64, AbbrevTable)>
{
    let mut tables = Vec::new();
    let mut start = 0usize;
    while start < section.data.len() {
        match build_abbrev_table(&section.data[start..], start as u64) {
            Ok((table, consumed)) if consumed > 0 => {
                tables.push((start as u64, table));
                start += consumed;
            }
            Ok(_) => break,
            Err(err) => {
                diags.record_warning(Some(&section.name), &err);
                break;
            }
        }
    }
    tables
}

fn decode_debug(sections: &DwarfSections, dump: &DebugDump, options: &DecodeOptions, diags: &mut Diagnostics) -> DebugReport
{
    let order = sections.order;
    let mut report = DebugReport::default();

    if dump.needs_walk() {
        let info = dwarf::decode_info(sections, options, diags);
        if dump.loc {
            if let Some(loc) = &sections.loc {
                report.locations = dwarf::resolve_lists(&info.lists, ListKind::Location, loc, order, diags);
            }
        }
        if dump.ranges {
            if let Some(ranges) = &sections.ranges {
                report.ranges = dwarf::resolve_lists(&info.lists, ListKind::Range, ranges, order, diags);
            }
        }
        if dump.info {
            report.info = Some(info);
        }
    }
    if dump.abbrev {
        if let Some(abbrev) = &sections.abbrev {
            report.abbreviations = abbreviation_tables(abbrev, diags);
        }
    }
    if dump.lines {
        if let Some(line) = &sections.line {
            report.lines = dwarf::parse_line_programs(line, order, diags);
        }
    }
    if dump.frames {
        let interpret = options.interpret_frames;
        if let Some(frame) = &sections.frame {
            report.debug_frame = parse_frame_section(frame, FrameFlavor::DebugFrame, order, sections.address_size, interpret, diags);
        }
        if let Some(eh_frame) = &sections.eh_frame {
            report.eh_frame = parse_frame_section(eh_frame, FrameFlavor::EhFrame, order, sections.address_size, interpret, diags);
        }
    }
    if dump.aranges {
        if let Some(aranges) = &sections.aranges {
            report.aranges = dwarf::parse_aranges(aranges, order, diags);
        }
    }
    if dump.pubnames {
        if let Some(pubnames) = &sections.pubnames {
            report.pubnames = dwarf::parse_pubnames(pubnames, order, diags);
        }
    }
    if dump.pubtypes {
        if let Some(pubtypes) = &sections.pubtypes {
            report.pubtypes = dwarf::parse_pubnames(pubtypes, order, diags);
        }
    }
    if dump.str {
        if let Some(data) = sections.str_data() {
            report.strings = dwarf::enumerate_strings(data)
                .into_iter()
                .map(|(offset, text)| (offset, text.into_owned()))
                .collect();
        }
    }
    if dump.macinfo {
        if let Some(macinfo) = &sections.macinfo {
            report.macros = dwarf::parse_macinfo(macinfo, order, diags);
        }
    }

    debug!(
        units = report.info.as_ref().map_or(0, |info| info.units.len()),
        line_programs = report.lines.len(),
        frames = report.debug_frame.len() + report.eh_frame.len(),
        "decoded debug information"
    );
    report
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_default_request_is_empty()
    {
        let request = DumpRequest::default();
        assert!(!request.debug.any());
        assert!(!request.symbols);
    }

    #[test]
    fn test_all_requests_everything()
    {
        let request = DumpRequest::all();
        assert!(request.debug.any());
        assert!(request.debug.needs_walk());
        assert!(request.unwind && request.notes && request.dyn_syms);
    }

    #[test]
    fn test_lists_need_the_walk()
    {
        let dump = DebugDump {
            ranges: true,
            ..DebugDump::default()
        };
        assert!(dump.needs_walk());
        assert!(!DebugDump {
            lines: true,
            ..DebugDump::default()
        }
        .needs_walk());
    }

    #[test]
    fn test_bad_magic_is_an_error()
    {
        let data = b"\x7fELX\x02\x01\x01".to_vec();
        let err = decode(&data, &DumpRequest::all(), &DecodeOptions::default()).unwrap_err();
        assert!(err.is_fatal());
    }
}
