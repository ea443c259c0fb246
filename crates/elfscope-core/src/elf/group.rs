//! Section groups (`SHT_GROUP`), e.g. COMDAT groups.

use std::collections::HashMap;

use object::elf::{GRP_COMDAT, SHT_GROUP};
use tracing::debug;

use super::container::Container;
use super::section::SectionDescriptor;
use super::strtab::CORRUPT_NAME;
use crate::error::{ElfError, Result};

/// One section group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionGroup
{
    /// Index of the `SHT_GROUP` section.
    pub section: usize,
    /// Name of the signature symbol (`sh_info` in the linked symbol table).
    pub signature: String,
    /// The flag word, `GRP_COMDAT` and friends.
    pub flags: u32,
    /// Member section indices, validated against the section table.
    pub members: Vec<usize>,
}

impl SectionGroup
{
    pub fn is_comdat(&self) -> bool
    {
        self.flags & GRP_COMDAT != 0
    }
}

impl Container<'_>
{
    fn parse_group(&self, section: &SectionDescriptor, owner: &mut HashMap<usize, usize>) -> Result<SectionGroup>
    {
        let data = self.section_data(section)?;
        let order = self.header().order;
        let mut words = data.chunks_exact(4).map(|chunk| order.u32_at(chunk, 0).unwrap_or(0));
        let flags = words.next().ok_or_else(|| ElfError::corrupt("section group", section.offset, "empty group"))?;

        let signature = match self.section(section.link as usize) {
            Some(symtab) => match self.parse_symbol_table(symtab) {
                Ok(table) => match table.get(section.info as usize) {
                    Some(symbol) => symbol.name.display_name().to_owned(),
                    None => {
                        self.record_warning(
                            &section.name,
                            &ElfError::IndexOutOfRange {
                                what: "group signature symbol",
                                index: u64::from(section.info),
                                limit: table.len() as u64,
                            },
                        );
                        CORRUPT_NAME.to_owned()
                    }
                },
                Err(err) => {
                    self.record_warning(&section.name, &err);
                    CORRUPT_NAME.to_owned()
                }
            },
            None => {
                self.record_warning(
                    &section.name,
                    &ElfError::IndexOutOfRange {
                        what: "group symbol table link",
                        index: u64::from(section.link),
                        limit: self.sections().len() as u64,
                    },
                );
                CORRUPT_NAME.to_owned()
            }
        };

        let mut members = Vec::new();
        for member in words {
            let member = member as usize;
            if member >= self.sections().len() {
                self.record_warning(
                    &section.name,
                    &ElfError::IndexOutOfRange {
                        what: "group member section",
                        index: member as u64,
                        limit: self.sections().len() as u64,
                    },
                );
                continue;
            }
            if let Some(&previous) = owner.get(&member) {
                self.warn(
                    &section.name,
                    Some(section.offset),
                    format!(
                        "section {member} is already in group {}",
                        self.section_name(previous)
                    ),
                );
                continue;
            }
            owner.insert(member, section.index);
            members.push(member);
        }

        Ok(SectionGroup {
            section: section.index,
            signature,
            flags,
            members,
        })
    }

    /// Every section group; a section claimed by two groups stays with the first.
    pub fn section_groups(&self) -> Vec<SectionGroup>
    {
        let mut owner = HashMap::new();
        let groups: Vec<SectionGroup> = self
            .sections_of_type(SHT_GROUP)
            .filter_map(|section| match self.parse_group(section, &mut owner) {
                Ok(group) => Some(group),
                Err(err) => {
                    self.record_error(&section.name, &err);
                    None
                }
            })
            .collect();
        debug!(count = groups.len(), "decoded section groups");
        groups
    }
}
