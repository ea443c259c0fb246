//! The `.debug_info` DIE walk.
//!
//! [`walk_units`] streams every DIE of every unit to a [`DieVisitor`] in
//! depth-first order. Along the way it disassembles inline location
//! expressions, tracks which DIEs have a frame base in scope, and records
//! list-valued attributes in a [`ListCollector`] for later resolution.

use gimli::{
    DwAt, DwForm, DwTag, DW_AT_frame_base, DW_AT_location, DW_AT_low_pc, DW_AT_name, DW_AT_ranges,
    DW_AT_return_addr, DW_AT_segment, DW_AT_static_link, DW_AT_string_length, DW_AT_use_location,
    DW_AT_vtable_elem_location, DW_AT_data_member_location, DW_FORM_data4, DW_FORM_data8,
};
use tracing::{debug, trace};

use super::abbrev::{build_abbrev_table, AbbrevTable};
use super::expr::{decode_expression, DecodedExpression, ExprContext};
use super::form::{read_attribute_value, AttributeValue, UnitContext};
use super::lists::{ListCollector, ListKind, ListRef};
use super::unit::{split_record, UnitHeader};
use super::{DebugSection, DwarfSections};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::options::DecodeOptions;
use crate::reader::Cursor;

/// Attributes whose value is a location description.
const LOCATION_ATTRIBUTES: &[DwAt] = &[
    DW_AT_location,
    DW_AT_frame_base,
    DW_AT_string_length,
    DW_AT_return_addr,
    DW_AT_static_link,
    DW_AT_use_location,
    DW_AT_vtable_elem_location,
    DW_AT_segment,
    DW_AT_data_member_location,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute
{
    /// Offset of the value in `.debug_info`.
    pub offset: u64,
    pub name: DwAt,
    pub form: DwForm,
    pub value: AttributeValue,
    /// The disassembled value of block-valued location attributes.
    pub expression: Option<DecodedExpression>,
}

/// One debugging information entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DieEntry
{
    pub offset: u64,
    /// Nesting depth; the unit DIE is at depth 0.
    pub depth: usize,
    pub code: u64,
    pub tag: DwTag,
    pub has_children: bool,
    pub attributes: Vec<Attribute>,
}

impl DieEntry
{
    pub fn attr(&self, name: DwAt) -> Option<&AttributeValue>
    {
        self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn name(&self) -> Option<&str>
    {
        self.attr(DW_AT_name).and_then(AttributeValue::as_str)
    }
}

/// Receives the DIE stream of [`walk_units`].
pub trait DieVisitor
{
    fn begin_unit(&mut self, _unit: &UnitHeader) {}

    fn entry(&mut self, unit: &UnitHeader, entry: &DieEntry);

    fn end_unit(&mut self, _unit: &UnitHeader) {}
}

/// Every decoded unit with its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDump
{
    pub header: UnitHeader,
    pub entries: Vec<DieEntry>,
}

/// The result of [`decode_info`].
#[derive(Debug, Clone, Default)]
pub struct InfoDump
{
    pub units: Vec<UnitDump>,
    pub lists: ListCollector,
}

#[derive(Default)]
struct UnitCollector
{
    units: Vec<UnitDump>,
}

impl DieVisitor for UnitCollector
{
    fn begin_unit(&mut self, unit: &UnitHeader)
    {
        self.units.push(UnitDump {
            header: *unit,
            entries: Vec::new(),
        });
    }

    fn entry(&mut self, _unit: &UnitHeader, entry: &DieEntry)
    {
        if let Some(current) = self.units.last_mut() {
            current.entries.push(entry.clone());
        }
    }
}

/// Walk `.debug_info` and keep every entry in memory.
pub fn decode_info(sections: &DwarfSections, options: &DecodeOptions, diags: &mut Diagnostics) -> InfoDump
{
    let mut collector = UnitCollector::default();
    let mut lists = ListCollector::default();
    walk_units(sections, options, &mut lists, diags, &mut collector);
    InfoDump {
        units: collector.units,
        lists,
    }
}

/// Stream every unit of `.debug_info` to `visitor`.
///
/// A unit with an unsupported version or a corrupt body is reported and
/// skipped; the walk resumes at the next unit. Only an unreadable initial
/// length stops the walk, since the next unit cannot be found. Returns the
/// number of units visited.
pub fn walk_units<V>(
    sections: &DwarfSections,
    options: &DecodeOptions,
    lists: &mut ListCollector,
    diags: &mut Diagnostics,
    visitor: &mut V,
) -> usize
where
    V: DieVisitor + ?Sized,
{
    let Some(info) = sections.info.as_ref() else {
        return 0;
    };
    let Some(abbrev) = sections.abbrev.as_ref() else {
        diags.fatal(Some(info.name.as_str()), None, "no .debug_abbrev section to decode units with");
        return 0;
    };

    let what = info.name.as_str();
    let mut cursor = info.cursor(sections.order);
    let mut visited = 0;

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let (unit_length, format, body) = match split_record(&mut cursor) {
            Ok(record) => record,
            Err(err) => {
                diags.record_error(Some(what), &err);
                break;
            }
        };
        let (header, body) = match UnitHeader::parse_body(offset, unit_length, format, body) {
            Ok(unit) => unit,
            Err(err) => {
                diags.record_warning(Some(what), &err);
                continue;
            }
        };

        let table = match abbrev_table_for(abbrev, &header) {
            Ok(table) => table,
            Err(err) => {
                diags.record_warning(Some(abbrev.name.as_str()), &err);
                continue;
            }
        };

        visitor.begin_unit(&header);
        let mut walker = UnitWalker {
            header: &header,
            table: &table,
            ctx: UnitContext {
                format: header.format,
                version: header.version,
                address_size: header.address_size,
                order: sections.order,
                strings: sections.str_data(),
            },
            options,
            what,
            base_address: 0,
            frame_base: Vec::new(),
        };
        if let Err(err) = walker.walk(body, lists, diags, visitor) {
            diags.record_warning(Some(what), &err);
        }
        visitor.end_unit(&header);
        visited += 1;
        trace!(unit = header.offset, version = header.version, "walked unit");
    }

    debug!(units = visited, lists = lists.len(), "walked .debug_info");
    visited
}

fn abbrev_table_for(abbrev: &DebugSection, header: &UnitHeader) -> Result<AbbrevTable>
{
    let start = usize::try_from(header.abbrev_offset)
        .ok()
        .filter(|&start| start < abbrev.data.len())
        .ok_or(ElfError::IndexOutOfRange {
            what: "abbreviation offset",
            index: header.abbrev_offset,
            limit: abbrev.data.len() as u64,
        })?;
    let (table, _) = build_abbrev_table(&abbrev.data[start..], header.abbrev_offset)?;
    Ok(table)
}

struct UnitWalker<'u>
{
    header: &'u UnitHeader,
    table: &'u AbbrevTable,
    ctx: UnitContext<'u>,
    options: &'u DecodeOptions,
    what: &'u str,
    base_address: u64,
    /// Per open children list, whether a frame base is in scope there.
    frame_base: Vec<bool>,
}

impl UnitWalker<'_>
{
    fn walk<V>(&mut self, mut body: Cursor<'_>, lists: &mut ListCollector, diags: &mut Diagnostics, visitor: &mut V) -> Result<()>
    where
        V: DieVisitor + ?Sized,
    {
        while !body.is_empty() {
            let offset = body.offset();
            let code = body.uleb()?;
            if code == 0 {
                // padding after the unit DIE closes nothing
                self.frame_base.pop();
                continue;
            }

            let abbrev = self
                .table
                .get(code)
                .ok_or_else(|| ElfError::corrupt("DIE", offset, format!("unknown abbreviation code {code}")))?;

            let mut attributes = Vec::with_capacity(abbrev.attributes.len());
            for spec in &abbrev.attributes {
                let value_offset = body.offset();
                let value = read_attribute_value(&mut body, spec.form, &self.ctx)?;
                attributes.push(Attribute {
                    offset: value_offset,
                    name: spec.name,
                    form: spec.form,
                    value,
                    expression: None,
                });
            }

            let depth = self.frame_base.len();
            let mut entry = DieEntry {
                offset,
                depth,
                code,
                tag: abbrev.tag,
                has_children: abbrev.has_children,
                attributes,
            };
            if depth == 0 {
                if let Some(low_pc) = entry.attr(DW_AT_low_pc).and_then(AttributeValue::udata) {
                    self.base_address = low_pc;
                }
            }
            let has_frame_base =
                self.frame_base.last().copied().unwrap_or(false) || entry.attr(DW_AT_frame_base).is_some();
            self.inspect_locations(&mut entry, has_frame_base, lists, diags);

            visitor.entry(self.header, &entry);

            if entry.has_children {
                if self.frame_base.len() >= self.options.max_die_depth {
                    return Err(ElfError::corrupt(
                        "DIE",
                        offset,
                        format!("nesting deeper than {} levels", self.options.max_die_depth),
                    ));
                }
                self.frame_base.push(has_frame_base);
            }
        }
        Ok(())
    }

    /// Disassemble inline location expressions and collect list references.
    fn inspect_locations(
        &self,
        entry: &mut DieEntry,
        has_frame_base: bool,
        lists: &mut ListCollector,
        diags: &mut Diagnostics,
    )
    {
        let die_offset = entry.offset;
        for attribute in &mut entry.attributes {
            let is_location = LOCATION_ATTRIBUTES.contains(&attribute.name);
            let is_list_form = matches!(attribute.form, DW_FORM_data4 | DW_FORM_data8);

            if is_location {
                if let Some(bytes) = attribute.value.block() {
                    let ctx = ExprContext {
                        order: self.ctx.order,
                        address_size: self.header.address_size,
                        format: self.header.format,
                        has_frame_base,
                    };
                    match decode_expression(bytes, &ctx) {
                        Ok(expr) => {
                            if expr.missing_frame_base {
                                diags.warn(
                                    Some(self.what),
                                    Some(attribute.offset),
                                    format!("DW_OP_fbreg used without a frame base in DIE at 0x{die_offset:x}"),
                                );
                            }
                            attribute.expression = Some(expr);
                        }
                        Err(err) => diags.record_warning(Some(self.what), &err),
                    }
                }
            }

            let kind = match attribute.name {
                DW_AT_ranges => ListKind::Range,
                DW_AT_data_member_location => continue,
                _ if is_location => ListKind::Location,
                _ => continue,
            };
            if !is_list_form {
                continue;
            }
            if let Some(offset) = attribute.value.udata() {
                lists.collect(ListRef {
                    kind,
                    unit_offset: self.header.offset,
                    die_offset,
                    attribute: attribute.name,
                    offset,
                    base_address: self.base_address,
                    address_size: self.header.address_size,
                    format: self.header.format,
                    has_frame_base,
                });
            }
        }
    }
}
