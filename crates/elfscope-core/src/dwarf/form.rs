//! Attribute values, decoded by form.

use std::fmt;

use gimli::{
    DwAt, DwAte, DwForm, DwLang, Format, DW_AT_encoding, DW_AT_language, DW_FORM_addr, DW_FORM_block,
    DW_FORM_block1, DW_FORM_block2, DW_FORM_block4, DW_FORM_data1, DW_FORM_data2, DW_FORM_data4, DW_FORM_data8,
    DW_FORM_flag, DW_FORM_indirect, DW_FORM_ref1, DW_FORM_ref2, DW_FORM_ref4, DW_FORM_ref8, DW_FORM_ref_addr,
    DW_FORM_ref_udata, DW_FORM_sdata, DW_FORM_string, DW_FORM_strp, DW_FORM_udata,
};

use super::read_offset;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// What a form decoder needs to know about the enclosing unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a>
{
    pub format: Format,
    pub version: u16,
    pub address_size: u8,
    pub order: ByteOrder,
    /// `.debug_str`, for `DW_FORM_strp`.
    pub strings: Option<&'a [u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue
{
    Address(u64),
    /// `DW_FORM_data*` and `DW_FORM_udata`.
    Data(u64),
    Sdata(i64),
    Flag(bool),
    String(String),
    /// `DW_FORM_strp`: the offset and, when resolvable, the string.
    StrOffset
    {
        offset: u64,
        value: Option<String>,
    },
    /// Any `DW_FORM_block*`; the length is the vector's.
    Block(Vec<u8>),
    /// Unit-relative reference (`DW_FORM_ref1` .. `DW_FORM_ref_udata`).
    Reference(u64),
    /// `.debug_info`-relative reference.
    RefAddr(u64),
}

impl AttributeValue
{
    /// The value as an unsigned constant, if it is one.
    pub fn udata(&self) -> Option<u64>
    {
        match *self {
            AttributeValue::Data(v) | AttributeValue::Address(v) => Some(v),
            AttributeValue::Sdata(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::StrOffset { value, .. } => value.as_deref(),
            _ => None,
        }
    }

    pub fn block(&self) -> Option<&[u8]>
    {
        match self {
            AttributeValue::Block(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Render the value, naming enumerated constants of `attribute`.
    pub fn describe(&self, attribute: DwAt) -> String
    {
        let named = self.udata().and_then(|v| match attribute {
            DW_AT_language => u16::try_from(v).ok().and_then(|v| DwLang(v).static_string()),
            DW_AT_encoding => u8::try_from(v).ok().and_then(|v| DwAte(v).static_string()),
            _ => None,
        });
        match named {
            Some(name) => format!("{} ({name})", self),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for AttributeValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            AttributeValue::Address(v) => write!(f, "0x{v:x}"),
            AttributeValue::Data(v) => write!(f, "{v}"),
            AttributeValue::Sdata(v) => write!(f, "{v}"),
            AttributeValue::Flag(v) => write!(f, "{}", u8::from(*v)),
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::StrOffset { offset, value: Some(s) } => {
                write!(f, "(indirect string, offset: 0x{offset:x}): {s}")
            }
            AttributeValue::StrOffset { offset, value: None } => {
                write!(f, "(indirect string, offset: 0x{offset:x}): <corrupt>")
            }
            AttributeValue::Block(bytes) => {
                write!(f, "{} byte block:", bytes.len())?;
                for b in bytes {
                    write!(f, " {b:x}")?;
                }
                Ok(())
            }
            AttributeValue::Reference(v) => write!(f, "<0x{v:x}>"),
            AttributeValue::RefAddr(v) => write!(f, "<0x{v:x}>"),
        }
    }
}

fn block(cursor: &mut Cursor<'_>, len: u64) -> Result<AttributeValue>
{
    let offset = cursor.offset();
    let len = usize::try_from(len).map_err(|_| ElfError::corrupt("block", offset, "block length too large"))?;
    Ok(AttributeValue::Block(cursor.bytes(len)?.to_vec()))
}

/// Decode one attribute value of `form`.
///
/// `DW_FORM_indirect` reads the real form inline and recurses once; a second
/// level of indirection is rejected.
///
/// ## Errors
///
/// Fails on truncation and on forms outside DWARF 2 and 3, since the size of
/// an unknown form is unknown and the rest of the DIE cannot be located.
pub fn read_attribute_value(cursor: &mut Cursor<'_>, form: DwForm, ctx: &UnitContext<'_>) -> Result<AttributeValue>
{
    read_value(cursor, form, ctx, true)
}

fn read_value(cursor: &mut Cursor<'_>, form: DwForm, ctx: &UnitContext<'_>, allow_indirect: bool) -> Result<AttributeValue>
{
    let offset = cursor.offset();
    let value = match form {
        DW_FORM_addr => AttributeValue::Address(cursor.address(ctx.address_size)?),
        DW_FORM_data1 => AttributeValue::Data(cursor.uint(1)?),
        DW_FORM_data2 => AttributeValue::Data(cursor.uint(2)?),
        DW_FORM_data4 => AttributeValue::Data(cursor.uint(4)?),
        DW_FORM_data8 => AttributeValue::Data(cursor.uint(8)?),
        DW_FORM_udata => AttributeValue::Data(cursor.uleb()?),
        DW_FORM_sdata => AttributeValue::Sdata(cursor.sleb()?),
        DW_FORM_flag => AttributeValue::Flag(cursor.u8()? != 0),
        DW_FORM_string => AttributeValue::String(cursor.cstr()?.into_owned()),
        DW_FORM_strp => {
            let offset = read_offset(cursor, ctx.format)?;
            let value = ctx.strings.and_then(|data| {
                let rest = data.get(usize::try_from(offset).ok()?..)?;
                let end = rest.iter().position(|&b| b == 0)?;
                Some(String::from_utf8_lossy(&rest[..end]).into_owned())
            });
            AttributeValue::StrOffset { offset, value }
        }
        DW_FORM_block1 => {
            let len = cursor.uint(1)?;
            block(cursor, len)?
        }
        DW_FORM_block2 => {
            let len = cursor.uint(2)?;
            block(cursor, len)?
        }
        DW_FORM_block4 => {
            let len = cursor.uint(4)?;
            block(cursor, len)?
        }
        DW_FORM_block => {
            let len = cursor.uleb()?;
            block(cursor, len)?
        }
        DW_FORM_ref1 => AttributeValue::Reference(cursor.uint(1)?),
        DW_FORM_ref2 => AttributeValue::Reference(cursor.uint(2)?),
        DW_FORM_ref4 => AttributeValue::Reference(cursor.uint(4)?),
        DW_FORM_ref8 => AttributeValue::Reference(cursor.uint(8)?),
        DW_FORM_ref_udata => AttributeValue::Reference(cursor.uleb()?),
        // address-sized in DWARF 2, offset-sized from DWARF 3 on
        DW_FORM_ref_addr if ctx.version <= 2 => AttributeValue::RefAddr(cursor.address(ctx.address_size)?),
        DW_FORM_ref_addr => AttributeValue::RefAddr(read_offset(cursor, ctx.format)?),
        DW_FORM_indirect if allow_indirect => {
            let raw = cursor.uleb()?;
            let inner = u16::try_from(raw)
                .map_err(|_| ElfError::corrupt("indirect form", offset, format!("form 0x{raw:x} does not fit")))?;
            read_value(cursor, DwForm(inner), ctx, false)?
        }
        DW_FORM_indirect => {
            return Err(ElfError::corrupt("indirect form", offset, "nested DW_FORM_indirect"));
        }
        other => {
            return Err(ElfError::corrupt("attribute form", offset, format!("unsupported form {other}")));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests
{
    use gimli::{DW_AT_name, DW_LANG_C99};

    use super::*;

    fn ctx(version: u16, strings: Option<&[u8]>) -> UnitContext<'_>
    {
        UnitContext {
            format: Format::Dwarf32,
            version,
            address_size: 8,
            order: ByteOrder::Little,
            strings,
        }
    }

    #[test]
    fn test_fixed_and_leb_forms()
    {
        let data = [0x2a, 0x34, 0x12, 0x7f, 0x80, 0x01];
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        let c = ctx(3, None);
        assert_eq!(read_attribute_value(&mut cursor, DW_FORM_data1, &c).unwrap(), AttributeValue::Data(0x2a));
        assert_eq!(read_attribute_value(&mut cursor, DW_FORM_data2, &c).unwrap(), AttributeValue::Data(0x1234));
        assert_eq!(read_attribute_value(&mut cursor, DW_FORM_sdata, &c).unwrap(), AttributeValue::Sdata(-1));
        assert_eq!(read_attribute_value(&mut cursor, DW_FORM_udata, &c).unwrap(), AttributeValue::Data(128));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_block_keeps_bytes_and_length()
    {
        let data = [0x03, 0x91, 0x78, 0x00, 0xff];
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        let value = read_attribute_value(&mut cursor, DW_FORM_block1, &ctx(2, None)).unwrap();
        assert_eq!(value.block(), Some(&[0x91, 0x78, 0x00][..]));
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_strp_resolves_through_debug_str()
    {
        let strings = b"\0main\0";
        let data = 1u32.to_le_bytes();
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        let value = read_attribute_value(&mut cursor, DW_FORM_strp, &ctx(3, Some(strings))).unwrap();
        assert_eq!(value.as_str(), Some("main"));
        assert_eq!(
            value.describe(DW_AT_name),
            "(indirect string, offset: 0x1): main"
        );
    }

    #[test]
    fn test_ref_addr_width_depends_on_version()
    {
        let data = [1, 0, 0, 0, 0, 0, 0, 0];
        let mut v2 = Cursor::new(&data, ByteOrder::Little);
        read_attribute_value(&mut v2, DW_FORM_ref_addr, &ctx(2, None)).unwrap();
        assert!(v2.is_empty());

        let mut v3 = Cursor::new(&data, ByteOrder::Little);
        read_attribute_value(&mut v3, DW_FORM_ref_addr, &ctx(3, None)).unwrap();
        assert_eq!(v3.remaining(), 4);
    }

    #[test]
    fn test_indirect_recurses_once()
    {
        // indirect -> data1 0x05
        let data = [0x0b, 0x05];
        let mut cursor = Cursor::new(&data, ByteOrder::Little);
        assert_eq!(
            read_attribute_value(&mut cursor, DW_FORM_indirect, &ctx(3, None)).unwrap(),
            AttributeValue::Data(5)
        );

        let nested = [0x16, 0x0b, 0x05];
        let mut cursor = Cursor::new(&nested, ByteOrder::Little);
        assert!(read_attribute_value(&mut cursor, DW_FORM_indirect, &ctx(3, None)).is_err());
    }

    #[test]
    fn test_language_is_named()
    {
        let value = AttributeValue::Data(u64::from(DW_LANG_C99.0));
        assert_eq!(value.describe(DW_AT_language), "12 (DW_LANG_C99)");
    }
}
