//! `.debug_macinfo` (DWARF 2-4 macro information).

use tracing::debug;

use super::DebugSection;
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

const DW_MACINFO_END: u8 = 0x00;
const DW_MACINFO_DEFINE: u8 = 0x01;
const DW_MACINFO_UNDEF: u8 = 0x02;
const DW_MACINFO_START_FILE: u8 = 0x03;
const DW_MACINFO_END_FILE: u8 = 0x04;
const DW_MACINFO_VENDOR_EXT: u8 = 0xff;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroEntry
{
    Define
    {
        line: u64,
        text: String,
    },
    Undef
    {
        line: u64,
        text: String,
    },
    StartFile
    {
        line: u64,
        file: u64,
    },
    EndFile,
    VendorExt
    {
        constant: u64,
        text: String,
    },
}

/// Entries of one compilation unit's macro list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroList
{
    pub offset: u64,
    pub entries: Vec<(u64, MacroEntry)>,
}

fn parse_list(cursor: &mut Cursor<'_>) -> Result<Vec<(u64, MacroEntry)>>
{
    let mut entries = Vec::new();
    while !cursor.is_empty() {
        let offset = cursor.offset();
        let entry = match cursor.u8()? {
            DW_MACINFO_END => break,
            DW_MACINFO_DEFINE => MacroEntry::Define {
                line: cursor.uleb()?,
                text: cursor.cstr()?.into_owned(),
            },
            DW_MACINFO_UNDEF => MacroEntry::Undef {
                line: cursor.uleb()?,
                text: cursor.cstr()?.into_owned(),
            },
            DW_MACINFO_START_FILE => MacroEntry::StartFile {
                line: cursor.uleb()?,
                file: cursor.uleb()?,
            },
            DW_MACINFO_END_FILE => MacroEntry::EndFile,
            DW_MACINFO_VENDOR_EXT => MacroEntry::VendorExt {
                constant: cursor.uleb()?,
                text: cursor.cstr()?.into_owned(),
            },
            other => {
                return Err(ElfError::corrupt(
                    "macro entry",
                    offset,
                    format!("unknown macinfo type 0x{other:02x}"),
                ));
            }
        };
        entries.push((offset, entry));
    }
    Ok(entries)
}

/// Decode each zero-terminated macro list in `section`.
///
/// An unknown entry type ends decoding, since its length is unknown.
pub fn parse_macinfo(section: &DebugSection, order: ByteOrder, diags: &mut Diagnostics) -> Vec<MacroList>
{
    let mut cursor = section.cursor(order);
    let mut lists = Vec::new();
    while !cursor.is_empty() {
        let offset = cursor.offset();
        match parse_list(&mut cursor) {
            Ok(entries) => lists.push(MacroList { offset, entries }),
            Err(err) => {
                diags.record_warning(Some(&section.name), &err);
                break;
            }
        }
    }
    debug!(lists = lists.len(), "decoded macro information");
    lists
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_define_in_file()
    {
        let mut data = vec![DW_MACINFO_START_FILE, 0, 1];
        data.push(DW_MACINFO_DEFINE);
        data.push(3);
        data.extend_from_slice(b"DEBUG 1\0");
        data.extend_from_slice(&[DW_MACINFO_UNDEF, 9]);
        data.extend_from_slice(b"DEBUG\0");
        data.extend_from_slice(&[DW_MACINFO_END_FILE, DW_MACINFO_END]);
        let section = DebugSection {
            name: ".debug_macinfo".into(),
            offset: 0,
            address: 0,
            data,
        };
        let mut diags = Diagnostics::new();
        let lists = parse_macinfo(&section, ByteOrder::Little, &mut diags);
        assert!(diags.is_empty());
        assert_eq!(lists.len(), 1);
        let entries: Vec<_> = lists[0].entries.iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(
            entries,
            vec![
                MacroEntry::StartFile { line: 0, file: 1 },
                MacroEntry::Define {
                    line: 3,
                    text: "DEBUG 1".into()
                },
                MacroEntry::Undef {
                    line: 9,
                    text: "DEBUG".into()
                },
                MacroEntry::EndFile,
            ]
        );
    }

    #[test]
    fn test_unknown_type_stops()
    {
        let section = DebugSection {
            name: ".debug_macinfo".into(),
            offset: 0,
            address: 0,
            data: vec![0x07, 0x00],
        };
        let mut diags = Diagnostics::new();
        assert!(parse_macinfo(&section, ByteOrder::Little, &mut diags).is_empty());
        assert!(diags.mentions("unknown macinfo type 0x07"));
    }
}
