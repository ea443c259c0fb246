//! Deferred location and range lists (`.debug_loc`, `.debug_ranges`).
//!
//! The DIE walk records every list-valued attribute in a [`ListCollector`];
//! [`resolve_lists`] decodes the recorded offsets once all units have been
//! walked, so each list is decoded with its unit's base address.

use std::collections::{HashMap, HashSet};

use gimli::{DwAt, Format};
use tracing::trace;

use super::expr::{decode_expression, DecodedExpression, ExprContext};
use super::{max_address, DebugSection};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind
{
    Location,
    Range,
}

/// A list offset found during the DIE walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRef
{
    pub kind: ListKind,
    pub unit_offset: u64,
    pub die_offset: u64,
    pub attribute: DwAt,
    /// Offset of the list in its section.
    pub offset: u64,
    /// The unit's `DW_AT_low_pc`, the initial base address.
    pub base_address: u64,
    pub address_size: u8,
    pub format: Format,
    pub has_frame_base: bool,
}

/// List references in the order the DIE walk met them.
#[derive(Debug, Clone, Default)]
pub struct ListCollector
{
    refs: Vec<ListRef>,
}

impl ListCollector
{
    pub fn collect(&mut self, reference: ListRef)
    {
        self.refs.push(reference);
    }

    pub fn refs(&self) -> &[ListRef]
    {
        &self.refs
    }

    pub fn of_kind(&self, kind: ListKind) -> impl Iterator<Item = &ListRef>
    {
        self.refs.iter().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize
    {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.refs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry
{
    Location
    {
        offset: u64,
        begin: u64,
        end: u64,
        /// Raw expression bytes.
        bytes: Vec<u8>,
        /// The disassembled expression, `None` if it could not be decoded.
        expression: Option<DecodedExpression>,
    },
    Range
    {
        offset: u64,
        begin: u64,
        end: u64,
    },
    BaseAddress
    {
        offset: u64,
        address: u64,
    },
}

/// One decoded list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedList
{
    pub reference: ListRef,
    pub entries: Vec<ListEntry>,
    /// Offset just past the list's terminator, or where decoding stopped.
    pub end: u64,
    /// Whether the end-of-list entry was reached.
    pub terminated: bool,
}

pub type LocationList = ResolvedList;
pub type RangeList = ResolvedList;

fn decode_list(
    data: &[u8],
    reference: &ListRef,
    order: ByteOrder,
    what: &str,
    diags: &mut Diagnostics,
) -> Result<ResolvedList>
{
    let start = usize::try_from(reference.offset)
        .ok()
        .filter(|&start| start < data.len())
        .ok_or(ElfError::IndexOutOfRange {
            what: "list offset",
            index: reference.offset,
            limit: data.len() as u64,
        })?;

    let mut cursor = Cursor::with_base(&data[start..], order, reference.offset);
    let mut list = ResolvedList {
        reference: *reference,
        entries: Vec::new(),
        end: reference.offset,
        terminated: false,
    };
    let mut base = reference.base_address;
    let size = reference.address_size;

    let outcome: Result<()> = (|| {
        loop {
            let offset = cursor.offset();
            let begin = cursor.address(size)?;
            let end = cursor.address(size)?;
            if begin == 0 && end == 0 {
                list.terminated = true;
                return Ok(());
            }
            if begin == max_address(size) {
                base = end;
                list.entries.push(ListEntry::BaseAddress { offset, address: end });
                continue;
            }
            if begin > end {
                diags.warn(
                    Some(what),
                    Some(offset),
                    format!("list entry start 0x{begin:x} is greater than end 0x{end:x}"),
                );
            }
            let (begin, end) = (begin.wrapping_add(base), end.wrapping_add(base));

            match reference.kind {
                ListKind::Range => list.entries.push(ListEntry::Range { offset, begin, end }),
                ListKind::Location => {
                    let len = cursor.u16()?;
                    let bytes = cursor.bytes(usize::from(len))?.to_vec();
                    let ctx = ExprContext {
                        order,
                        address_size: size,
                        format: reference.format,
                        has_frame_base: reference.has_frame_base,
                    };
                    let expression = match decode_expression(&bytes, &ctx) {
                        Ok(expr) => {
                            if expr.missing_frame_base {
                                diags.warn(
                                    Some(what),
                                    Some(offset),
                                    "DW_OP_fbreg used without a frame base",
                                );
                            }
                            Some(expr)
                        }
                        Err(err) => {
                            diags.record_warning(Some(what), &err);
                            None
                        }
                    };
                    list.entries.push(ListEntry::Location {
                        offset,
                        begin,
                        end,
                        bytes,
                        expression,
                    });
                }
            }
        }
    })();

    list.end = cursor.offset();
    if let Err(err) = outcome {
        diags.record_warning(Some(what), &err);
    }
    Ok(list)
}

/// Decode every collected list of `kind` from `section`.
///
/// Offsets referenced by one unit must be ascending; a decrease is reported as
/// [`ElfError::InconsistentOrdering`] and the lists are still decoded in the
/// order they were found. Between consecutive lists a hole or an overlap is a
/// warning. An offset referenced twice is decoded once.
pub fn resolve_lists(
    collector: &ListCollector,
    kind: ListKind,
    section: &DebugSection,
    order: ByteOrder,
    diags: &mut Diagnostics,
) -> Vec<ResolvedList>
{
    let what = section.name.as_str();
    let mut last_in_unit: HashMap<u64, u64> = HashMap::new();
    let mut misordered_units = HashSet::new();
    let mut seen = HashSet::new();
    let mut previous_end: Option<u64> = None;
    let mut out = Vec::new();

    for reference in collector.of_kind(kind) {
        if let Some(&last) = last_in_unit.get(&reference.unit_offset) {
            if reference.offset < last && misordered_units.insert(reference.unit_offset) {
                diags.record_warning(
                    Some(what),
                    &ElfError::InconsistentOrdering(format!(
                        "offsets of unit at 0x{:x} are not ascending (0x{:x} after 0x{last:x})",
                        reference.unit_offset, reference.offset
                    )),
                );
            }
        }
        last_in_unit.insert(reference.unit_offset, reference.offset);

        if !seen.insert(reference.offset) {
            continue;
        }

        if let Some(end) = previous_end {
            if reference.offset > end {
                diags.warn(
                    Some(what),
                    Some(end),
                    format!("hole of 0x{:x} bytes before list at 0x{:x}", reference.offset - end, reference.offset),
                );
            } else if reference.offset < end {
                diags.warn(
                    Some(what),
                    Some(reference.offset),
                    format!("list at 0x{:x} overlaps the previous list ending at 0x{end:x}", reference.offset),
                );
            }
        }

        match decode_list(&section.data, reference, order, what, diags) {
            Ok(list) => {
                previous_end = Some(list.end);
                out.push(list);
            }
            Err(err) => diags.record_warning(Some(what), &err),
        }
    }

    trace!(section = what, lists = out.len(), "resolved lists");
    out
}
