//! `.debug_abbrev` tables.

use std::collections::HashMap;

use gimli::{DwAt, DwForm, DwTag};
use smallvec::SmallVec;

use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// One `(attribute, form)` pair of an abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec
{
    pub name: DwAt,
    pub form: DwForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation
{
    pub code: u64,
    pub tag: DwTag,
    pub has_children: bool,
    pub attributes: SmallVec<[AttributeSpec; 8]>,
}

/// The abbreviations of one unit, looked up by code while walking DIEs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbrevTable
{
    entries: Vec<Abbreviation>,
    by_code: HashMap<u64, usize>,
}

impl AbbrevTable
{
    pub fn get(&self, code: u64) -> Option<&Abbreviation>
    {
        self.by_code.get(&code).map(|&slot| &self.entries[slot])
    }

    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Abbreviation>
    {
        self.entries.iter()
    }
}

fn narrow(value: u64, what: &'static str, offset: u64) -> Result<u16>
{
    u16::try_from(value).map_err(|_| ElfError::corrupt(what, offset, format!("value 0x{value:x} does not fit")))
}

/// Build the abbreviation table that starts at `bytes[0]`.
///
/// `base` is the offset of `bytes` inside `.debug_abbrev`, used for error
/// reporting. Returns the table and the number of bytes consumed, which
/// includes the terminating zero code but nothing after it. Running out of
/// data before the zero code ends the table as well.
///
/// ## Errors
///
/// Fails on a truncated abbreviation or a tag, attribute or form that does not
/// fit its 16-bit constant.
pub fn build_abbrev_table(bytes: &[u8], base: u64) -> Result<(AbbrevTable, usize)>
{
    let mut cursor = Cursor::with_base(bytes, ByteOrder::Little, base);
    let mut table = AbbrevTable::default();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let code = cursor.uleb()?;
        if code == 0 {
            break;
        }
        let tag = DwTag(narrow(cursor.uleb()?, "abbreviation tag", offset)?);
        let has_children = cursor.u8()? != 0;

        let mut attributes = SmallVec::new();
        loop {
            let at_offset = cursor.offset();
            let name = cursor.uleb()?;
            let form = cursor.uleb()?;
            if name == 0 && form == 0 {
                break;
            }
            attributes.push(AttributeSpec {
                name: DwAt(narrow(name, "abbreviation attribute", at_offset)?),
                form: DwForm(narrow(form, "abbreviation form", at_offset)?),
            });
        }

        // a repeated code keeps its first definition
        table.by_code.entry(code).or_insert(table.entries.len());
        table.entries.push(Abbreviation {
            code,
            tag,
            has_children,
            attributes,
        });
    }

    Ok((table, cursor.position()))
}

#[cfg(test)]
mod tests
{
    use gimli::{DW_AT_byte_size, DW_AT_name, DW_FORM_data1, DW_FORM_string, DW_TAG_base_type, DW_TAG_compile_unit};

    use super::*;

    fn two_codes() -> Vec<u8>
    {
        vec![
            // code 1: base_type, no children, byte_size/data1
            0x01, 0x24, 0x00, 0x0b, 0x0b, 0x00, 0x00,
            // code 2: compile_unit, children, no attributes
            0x02, 0x11, 0x01, 0x00, 0x00,
            // end of table
            0x00,
        ]
    }

    #[test]
    fn test_two_abbreviations()
    {
        let mut bytes = two_codes();
        let table_len = bytes.len();
        // start of the next unit's table
        bytes.extend_from_slice(&[0x01, 0x11, 0x01, 0x03, 0x08, 0x00, 0x00, 0x00]);

        let (table, consumed) = build_abbrev_table(&bytes, 0).unwrap();
        assert_eq!(consumed, table_len);
        assert_eq!(table.len(), 2);

        let first = table.get(1).unwrap();
        assert_eq!(first.tag, DW_TAG_base_type);
        assert!(!first.has_children);
        assert_eq!(first.attributes.len(), 1);
        assert_eq!(first.attributes[0].name, DW_AT_byte_size);
        assert_eq!(first.attributes[0].form, DW_FORM_data1);

        let second = table.get(2).unwrap();
        assert_eq!(second.tag, DW_TAG_compile_unit);
        assert!(second.has_children);
        assert!(second.attributes.is_empty());

        let (next, _) = build_abbrev_table(&bytes[consumed..], consumed as u64).unwrap();
        assert_eq!(next.get(1).unwrap().attributes[0].name, DW_AT_name);
        assert_eq!(next.get(1).unwrap().attributes[0].form, DW_FORM_string);
    }

    #[test]
    fn test_truncated_abbreviation()
    {
        let bytes = [0x01, 0x24, 0x00, 0x0b];
        assert!(matches!(build_abbrev_table(&bytes, 0x40), Err(ElfError::TruncatedRead { .. })));
    }

    #[test]
    fn test_missing_terminator_ends_table()
    {
        let bytes = &two_codes()[..12];
        let (table, consumed) = build_abbrev_table(bytes, 0).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(consumed, 12);
    }
}
