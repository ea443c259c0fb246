//! # DWARF Decoder
//!
//! Decoders for the DWARF 2 and 3 debug sections.
//!
//! All sections are loaded into memory once through [`DwarfSections::load`]
//! and decoded with a [`Cursor`](crate::reader::Cursor). Constants are named
//! through `gimli::constants`; gimli's own readers are not used because the
//! decoders here must keep going over corrupt input and attribute every
//! anomaly to a section offset.
//!
//! Location and range lists are handled in two separate steps: the DIE walk
//! in [`info`] only *collects* list references, and [`lists::resolve_lists`]
//! decodes them after every unit has been seen.

pub mod abbrev;
pub mod aranges;
pub mod expr;
pub mod form;
pub mod frame;
pub mod info;
pub mod line;
pub mod lists;
pub mod macinfo;
pub mod pubnames;
pub mod strings;
pub mod unit;

use gimli::Format;
use object::elf::SHT_NOBITS;
use tracing::debug;

pub use abbrev::{build_abbrev_table, AbbrevTable, Abbreviation, AttributeSpec};
pub use aranges::{parse_aranges, ArangeSet};
pub use expr::{decode_expression, DecodedExpression, ExprContext, LocationOp, Operand};
pub use form::{read_attribute_value, AttributeValue, UnitContext};
pub use frame::{parse_frame_section, CfaInstruction, CfaRule, Cie, Fde, FrameFlavor, FrameRecord, FrameState, RegisterRule};
pub use info::{decode_info, walk_units, Attribute, DieEntry, DieVisitor, InfoDump, UnitDump};
pub use line::{parse_line_programs, LineInstruction, LineProgram, LineProgramHeader, LineRegisters, LineRow};
pub use lists::{resolve_lists, ListCollector, ListEntry, ListKind, ListRef, LocationList, RangeList, ResolvedList};
pub use macinfo::{parse_macinfo, MacroEntry, MacroList};
pub use pubnames::{parse_pubnames, PubName, PubNameSet};
pub use strings::{enumerate_strings, string_at};
pub use unit::{read_initial_length, UnitHeader};

use crate::elf::Container;
use crate::error::Result;
use crate::reader::{ByteOrder, Cursor};

/// One debug section loaded into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection
{
    pub name: String,
    /// File offset of the section contents.
    pub offset: u64,
    /// `sh_addr`, needed for PC-relative pointers in `.eh_frame`.
    pub address: u64,
    pub data: Vec<u8>,
}

impl DebugSection
{
    pub fn cursor(&self, order: ByteOrder) -> Cursor<'_>
    {
        Cursor::new(&self.data, order)
    }
}

/// Every DWARF section a decode may need.
#[derive(Debug, Clone)]
pub struct DwarfSections
{
    pub order: ByteOrder,
    /// Address size of the ELF class, used where DWARF does not carry one.
    pub address_size: u8,
    pub info: Option<DebugSection>,
    pub abbrev: Option<DebugSection>,
    pub str: Option<DebugSection>,
    pub line: Option<DebugSection>,
    pub loc: Option<DebugSection>,
    pub ranges: Option<DebugSection>,
    pub frame: Option<DebugSection>,
    pub eh_frame: Option<DebugSection>,
    pub aranges: Option<DebugSection>,
    pub pubnames: Option<DebugSection>,
    pub pubtypes: Option<DebugSection>,
    pub macinfo: Option<DebugSection>,
}

impl DwarfSections
{
    /// Sections with no data of their own for tests that build streams by hand.
    pub fn empty(order: ByteOrder, address_size: u8) -> Self
    {
        Self {
            order,
            address_size,
            info: None,
            abbrev: None,
            str: None,
            line: None,
            loc: None,
            ranges: None,
            frame: None,
            eh_frame: None,
            aranges: None,
            pubnames: None,
            pubtypes: None,
            macinfo: None,
        }
    }

    /// Load every debug section present in `container`.
    ///
    /// A section whose contents cannot be read is recorded as a diagnostic and
    /// treated as absent.
    pub fn load(container: &Container<'_>) -> Self
    {
        let header = container.header();
        let load = |name: &str| {
            let section = container.section_by_name(name)?;
            if section.sh_type == SHT_NOBITS {
                return None;
            }
            match container.section_data(section) {
                Ok(data) => Some(DebugSection {
                    name: section.name.clone(),
                    offset: section.offset,
                    address: section.addr,
                    data,
                }),
                Err(err) => {
                    container.record_error(name, &err);
                    None
                }
            }
        };

        let sections = Self {
            order: header.order,
            address_size: header.address_size(),
            info: load(".debug_info"),
            abbrev: load(".debug_abbrev"),
            str: load(".debug_str"),
            line: load(".debug_line"),
            loc: load(".debug_loc"),
            ranges: load(".debug_ranges"),
            frame: load(".debug_frame"),
            eh_frame: load(".eh_frame"),
            aranges: load(".debug_aranges"),
            pubnames: load(".debug_pubnames"),
            pubtypes: load(".debug_pubtypes"),
            macinfo: load(".debug_macinfo"),
        };
        debug!(
            info = sections.info.is_some(),
            line = sections.line.is_some(),
            frame = sections.frame.is_some(),
            eh_frame = sections.eh_frame.is_some(),
            "loaded debug sections"
        );
        sections
    }

    pub fn str_data(&self) -> Option<&[u8]>
    {
        self.str.as_ref().map(|s| s.data.as_slice())
    }
}

/// Read a section offset whose width depends on the DWARF format.
pub(crate) fn read_offset(cursor: &mut Cursor<'_>, format: Format) -> Result<u64>
{
    cursor.uint(usize::from(format.word_size()))
}

/// The all-ones value for an address of `size` bytes.
pub(crate) fn max_address(size: u8) -> u64
{
    if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (u32::from(size) * 8)) - 1
    }
}
