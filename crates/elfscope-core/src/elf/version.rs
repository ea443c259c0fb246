//! GNU symbol versioning: `.gnu.version`, `.gnu.version_d` and `.gnu.version_r`.
//!
//! Version definitions and requirements are singly linked lists threaded
//! through their sections by relative `next` offsets. Corrupt files can make
//! those offsets cycle, so every walk is bounded twice: by the number of
//! records that fit in the section and by a visited-offset set.

use std::collections::HashSet;

use object::elf::{SHT_GNU_VERDEF, SHT_GNU_VERNEED, SHT_GNU_VERSYM};
use tracing::debug;

use super::container::Container;
use super::strtab::StringTable;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::reader::{ByteOrder, Cursor};

/// Size of `ElfN_Verdef`.
pub const VERDEF_SIZE: usize = 20;
/// Size of `ElfN_Verdaux`.
pub const VERDAUX_SIZE: usize = 8;
/// Size of `ElfN_Verneed`.
pub const VERNEED_SIZE: usize = 16;
/// Size of `ElfN_Vernaux`.
pub const VERNAUX_SIZE: usize = 16;

/// Hidden bit of a `.gnu.version` entry.
pub const VERSYM_HIDDEN: u16 = 0x8000;
/// `VER_FLG_BASE`
pub const VER_FLG_BASE: u16 = 0x1;
/// `VER_FLG_WEAK`
pub const VER_FLG_WEAK: u16 = 0x2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDefAux
{
    /// Offset within the section.
    pub offset: u64,
    pub name: String,
}

/// One `Verdef` record and its auxiliary names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDef
{
    pub offset: u64,
    pub version: u16,
    pub flags: u16,
    /// `vd_ndx`, the value symbols carry in `.gnu.version`.
    pub index: u16,
    pub count: u16,
    pub hash: u32,
    /// First entry is the version name, the rest are parents.
    pub aux: Vec<VersionDefAux>,
}

impl VersionDef
{
    pub fn name(&self) -> Option<&str>
    {
        self.aux.first().map(|aux| aux.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNeedAux
{
    pub offset: u64,
    pub hash: u32,
    pub flags: u16,
    /// `vna_other`, the value symbols carry in `.gnu.version`.
    pub index: u16,
    pub name: String,
}

/// One `Verneed` record: a needed file and the versions required from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNeed
{
    pub offset: u64,
    pub version: u16,
    pub count: u16,
    pub file: String,
    pub aux: Vec<VersionNeedAux>,
}

/// The decoded version label of one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionLabel
{
    /// `VER_NDX_LOCAL` (0)
    Local,
    /// `VER_NDX_GLOBAL` (1)
    Global,
    /// A named version.
    Named
    {
        name: String,
        /// High bit of the `.gnu.version` entry was set.
        hidden: bool,
        /// File the version is required from, for versions found in `.gnu.version_r`.
        file: Option<String>,
    },
    /// An index that names no definition or requirement.
    Unknown(u16),
}

impl VersionLabel
{
    /// readelf-style suffix: `@VER`, `@@VER` (default definition), or empty.
    pub fn suffix(&self, defined: bool) -> String
    {
        match self {
            VersionLabel::Named { name, hidden, .. } if defined && !hidden => format!("@@{name}"),
            VersionLabel::Named { name, .. } => format!("@{name}"),
            VersionLabel::Unknown(index) => format!("@<corrupt:{index}>"),
            VersionLabel::Local | VersionLabel::Global => String::new(),
        }
    }
}

/// All versioning tables of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo
{
    /// `.gnu.version`, one entry per dynamic symbol.
    pub versym: Vec<u16>,
    pub definitions: Vec<VersionDef>,
    pub requirements: Vec<VersionNeed>,
}

impl VersionInfo
{
    pub fn is_empty(&self) -> bool
    {
        self.versym.is_empty() && self.definitions.is_empty() && self.requirements.is_empty()
    }

    /// Label for the dynamic symbol at `symbol_index`, or `None` without a `.gnu.version` entry.
    pub fn label(&self, symbol_index: usize, defined: bool) -> Option<VersionLabel>
    {
        let versym = *self.versym.get(symbol_index)?;
        Some(resolve_symbol_version(versym, defined, &self.definitions, &self.requirements))
    }
}

/// Resolve one `.gnu.version` entry.
///
/// Index 0 is local and 1 global. Higher indices are looked up among the
/// requirements for undefined symbols and among the definitions for defined
/// ones, falling back to the other list when the first has no match.
pub fn resolve_symbol_version(
    versym: u16,
    defined: bool,
    definitions: &[VersionDef],
    requirements: &[VersionNeed],
) -> VersionLabel
{
    let hidden = versym & VERSYM_HIDDEN != 0;
    let index = versym & !VERSYM_HIDDEN;
    match index {
        0 => return VersionLabel::Local,
        1 => return VersionLabel::Global,
        _ => {}
    }

    let from_need = || {
        requirements.iter().find_map(|need| {
            need.aux
                .iter()
                .find(|aux| aux.index == index)
                .map(|aux| VersionLabel::Named {
                    name: aux.name.clone(),
                    hidden,
                    file: Some(need.file.clone()),
                })
        })
    };
    let from_def = || {
        definitions
            .iter()
            .find(|def| def.index == index)
            .and_then(|def| def.name())
            .map(|name| VersionLabel::Named {
                name: name.to_owned(),
                hidden,
                file: None,
            })
    };

    let found = if defined {
        from_def().or_else(from_need)
    } else {
        from_need().or_else(from_def)
    };
    found.unwrap_or(VersionLabel::Unknown(index))
}

/// Tracks a linked-list walk through one section.
struct ChainGuard
{
    visited: HashSet<u64>,
    budget: usize,
}

impl ChainGuard
{
    fn new(section_size: usize, record_size: usize) -> Self
    {
        Self {
            visited: HashSet::new(),
            budget: section_size / record_size,
        }
    }

    /// Whether `offset` may be visited; false on a revisit or once the budget is spent.
    fn admit(&mut self, offset: u64) -> bool
    {
        if self.budget == 0 || !self.visited.insert(offset) {
            return false;
        }
        self.budget -= 1;
        true
    }
}

/// Decode `.gnu.version_d`.
///
/// `count` is the section's `sh_info`; the walk also stops at a zero
/// `vd_next`, at the end of the data, or when a record is revisited.
pub fn parse_verdef(
    data: &[u8],
    order: ByteOrder,
    strings: &StringTable,
    count: u32,
    diags: &mut Diagnostics,
) -> Vec<VersionDef>
{
    const WHAT: &str = ".gnu.version_d";
    let mut definitions = Vec::new();
    let mut chain = ChainGuard::new(data.len(), VERDEF_SIZE);
    let mut offset = 0u64;

    for _ in 0..count {
        if !chain.admit(offset) {
            diags.warn(Some(WHAT), Some(offset), "version definition chain loops or overruns section");
            break;
        }
        let Some(record) = slice_at(data, offset, VERDEF_SIZE) else {
            diags.warn(Some(WHAT), Some(offset), "version definition extends past end of section");
            break;
        };
        let mut cursor = Cursor::with_base(record, order, offset);
        let parsed: Result<_> = (|| {
            Ok((
                cursor.u16()?,
                cursor.u16()?,
                cursor.u16()?,
                cursor.u16()?,
                cursor.u32()?,
                cursor.u32()?,
                cursor.u32()?,
            ))
        })();
        let Ok((version, flags, index, aux_count, hash, aux_offset, next)) = parsed else {
            break;
        };

        let mut aux = Vec::new();
        let mut aux_chain = ChainGuard::new(data.len(), VERDAUX_SIZE);
        let mut aux_at = offset.saturating_add(u64::from(aux_offset));
        for _ in 0..aux_count {
            if !aux_chain.admit(aux_at) {
                diags.warn(Some(WHAT), Some(aux_at), "version definition aux chain loops");
                break;
            }
            let Some(record) = slice_at(data, aux_at, VERDAUX_SIZE) else {
                diags.warn(Some(WHAT), Some(aux_at), "version definition aux extends past end of section");
                break;
            };
            let name_offset = order.u32_at(record, 0).unwrap_or(0);
            let aux_next = order.u32_at(record, 4).unwrap_or(0);
            aux.push(VersionDefAux {
                offset: aux_at,
                name: strings.name(u64::from(name_offset)),
            });
            if aux_next == 0 {
                break;
            }
            aux_at = aux_at.saturating_add(u64::from(aux_next));
        }

        definitions.push(VersionDef {
            offset,
            version,
            flags,
            index,
            count: aux_count,
            hash,
            aux,
        });
        if next == 0 {
            break;
        }
        offset = offset.saturating_add(u64::from(next));
    }
    definitions
}

/// Decode `.gnu.version_r`, with the same bounds as [`parse_verdef`].
pub fn parse_verneed(
    data: &[u8],
    order: ByteOrder,
    strings: &StringTable,
    count: u32,
    diags: &mut Diagnostics,
) -> Vec<VersionNeed>
{
    const WHAT: &str = ".gnu.version_r";
    let mut requirements = Vec::new();
    let mut chain = ChainGuard::new(data.len(), VERNEED_SIZE);
    let mut offset = 0u64;

    for _ in 0..count {
        if !chain.admit(offset) {
            diags.warn(Some(WHAT), Some(offset), "version need chain loops or overruns section");
            break;
        }
        let Some(record) = slice_at(data, offset, VERNEED_SIZE) else {
            diags.warn(Some(WHAT), Some(offset), "version need extends past end of section");
            break;
        };
        let mut cursor = Cursor::with_base(record, order, offset);
        let parsed: Result<_> = (|| Ok((cursor.u16()?, cursor.u16()?, cursor.u32()?, cursor.u32()?, cursor.u32()?)))();
        let Ok((version, aux_count, file, aux_offset, next)) = parsed else {
            break;
        };

        let mut aux = Vec::new();
        let mut aux_chain = ChainGuard::new(data.len(), VERNAUX_SIZE);
        let mut aux_at = offset.saturating_add(u64::from(aux_offset));
        for _ in 0..aux_count {
            if !aux_chain.admit(aux_at) {
                diags.warn(Some(WHAT), Some(aux_at), "version need aux chain loops");
                break;
            }
            let Some(record) = slice_at(data, aux_at, VERNAUX_SIZE) else {
                diags.warn(Some(WHAT), Some(aux_at), "version need aux extends past end of section");
                break;
            };
            let mut cursor = Cursor::with_base(record, order, aux_at);
            let parsed: Result<_> =
                (|| Ok((cursor.u32()?, cursor.u16()?, cursor.u16()?, cursor.u32()?, cursor.u32()?)))();
            let Ok((hash, flags, index, name, aux_next)) = parsed else {
                break;
            };
            aux.push(VersionNeedAux {
                offset: aux_at,
                hash,
                flags,
                index,
                name: strings.name(u64::from(name)),
            });
            if aux_next == 0 {
                break;
            }
            aux_at = aux_at.saturating_add(u64::from(aux_next));
        }

        requirements.push(VersionNeed {
            offset,
            version,
            count: aux_count,
            file: strings.name(u64::from(file)),
            aux,
        });
        if next == 0 {
            break;
        }
        offset = offset.saturating_add(u64::from(next));
    }
    requirements
}

fn slice_at(data: &[u8], offset: u64, len: usize) -> Option<&[u8]>
{
    let start = usize::try_from(offset).ok()?;
    data.get(start..start.checked_add(len)?)
}

impl Container<'_>
{
    /// Decode every versioning section present; `None` when there are none.
    pub fn version_info(&self) -> Option<VersionInfo>
    {
        let order = self.header().order;
        let mut info = VersionInfo::default();

        if let Some(section) = self.sections_of_type(SHT_GNU_VERSYM).next() {
            match self.section_data(section) {
                Ok(data) => {
                    info.versym = data
                        .chunks_exact(2)
                        .map(|chunk| order.u16_at(chunk, 0).unwrap_or(0))
                        .collect();
                }
                Err(err) => self.record_warning(&section.name, &err),
            }
        }

        if let Some(section) = self.sections_of_type(SHT_GNU_VERDEF).next() {
            match self.section_data(section) {
                Ok(data) => {
                    let strings = self.linked_strings(section);
                    info.definitions = parse_verdef(&data, order, &strings, section.info, &mut self.diagnostics());
                }
                Err(err) => self.record_warning(&section.name, &err),
            }
        }

        if let Some(section) = self.sections_of_type(SHT_GNU_VERNEED).next() {
            match self.section_data(section) {
                Ok(data) => {
                    let strings = self.linked_strings(section);
                    info.requirements = parse_verneed(&data, order, &strings, section.info, &mut self.diagnostics());
                }
                Err(err) => self.record_warning(&section.name, &err),
            }
        }

        debug!(
            versym = info.versym.len(),
            definitions = info.definitions.len(),
            requirements = info.requirements.len(),
            "decoded version info"
        );
        (!info.is_empty()).then_some(info)
    }
}
