//! Location expression disassembly.
//!
//! Expressions are decoded into a list of operations for display; nothing is
//! ever evaluated.

use std::fmt;

use gimli::{
    DwOp, Format, DW_OP_addr, DW_OP_bit_piece, DW_OP_bra, DW_OP_breg0, DW_OP_breg31, DW_OP_bregx, DW_OP_call2,
    DW_OP_call4, DW_OP_call_ref, DW_OP_const1s, DW_OP_const1u, DW_OP_const2s, DW_OP_const2u, DW_OP_const4s,
    DW_OP_const4u, DW_OP_const8s, DW_OP_const8u, DW_OP_consts, DW_OP_constu, DW_OP_deref_size, DW_OP_fbreg,
    DW_OP_lit0, DW_OP_lit31, DW_OP_pick, DW_OP_piece, DW_OP_plus_uconst, DW_OP_reg0, DW_OP_reg31, DW_OP_regx,
    DW_OP_skip, DW_OP_xderef_size,
};
use smallvec::SmallVec;

use super::read_offset;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// Operations that take no operand.
const NO_OPERAND: &[u8] = &[
    0x06, // deref
    0x12, // dup
    0x13, // drop
    0x14, // over
    0x16, // swap
    0x17, // rot
    0x18, // xderef
    0x19, // abs
    0x1a, // and
    0x1b, // div
    0x1c, // minus
    0x1d, // mod
    0x1e, // mul
    0x1f, // neg
    0x20, // not
    0x21, // or
    0x22, // plus
    0x24, // shl
    0x25, // shr
    0x26, // shra
    0x27, // xor
    0x29, // eq
    0x2a, // ge
    0x2b, // gt
    0x2c, // le
    0x2d, // lt
    0x2e, // ne
    0x96, // nop
    0x97, // push_object_address
    0x9b, // form_tls_address
    0x9c, // call_frame_cfa
    0xe0, // GNU_push_tls_address
    0xf0, // GNU_uninit
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand
{
    Unsigned(u64),
    Signed(i64),
    Address(u64),
}

impl fmt::Display for Operand
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Operand::Unsigned(v) => write!(f, "{v}"),
            Operand::Signed(v) => write!(f, "{v}"),
            Operand::Address(v) => write!(f, "0x{v:x}"),
        }
    }
}

/// One disassembled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOp
{
    /// Offset of the opcode within the expression.
    pub offset: usize,
    pub opcode: DwOp,
    pub operands: SmallVec<[Operand; 2]>,
}

impl fmt::Display for LocationOp
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.opcode)?;
        for (i, operand) in self.operands.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { " " })?;
            write!(f, "{operand}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedExpression
{
    pub ops: Vec<LocationOp>,
    /// Set when `DW_OP_fbreg` appears and no enclosing DIE has a frame base.
    pub missing_frame_base: bool,
}

impl DecodedExpression
{
    pub fn uses_frame_base(&self) -> bool
    {
        self.ops.iter().any(|op| op.opcode == DW_OP_fbreg)
    }
}

impl fmt::Display for DecodedExpression
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{op}")?;
        }
        Ok(())
    }
}

/// Parameters an expression's operands depend on.
#[derive(Debug, Clone, Copy)]
pub struct ExprContext
{
    pub order: ByteOrder,
    pub address_size: u8,
    pub format: Format,
    /// Whether an enclosing DIE supplied `DW_AT_frame_base`.
    pub has_frame_base: bool,
}

/// Disassemble the expression in `bytes`.
///
/// ## Errors
///
/// Fails on a truncated operand or an opcode outside DWARF 2 and 3 and the GNU
/// extensions listed above, since its operand size is unknown.
pub fn decode_expression(bytes: &[u8], ctx: &ExprContext) -> Result<DecodedExpression>
{
    let mut cursor = Cursor::new(bytes, ctx.order);
    let mut out = DecodedExpression::default();

    while !cursor.is_empty() {
        let offset = cursor.position();
        let opcode = DwOp(cursor.u8()?);
        let mut operands = SmallVec::new();

        match opcode {
            DW_OP_addr => operands.push(Operand::Address(cursor.address(ctx.address_size)?)),
            DW_OP_const1u => operands.push(Operand::Unsigned(cursor.uint(1)?)),
            DW_OP_const1s => operands.push(Operand::Signed(cursor.sint(1)?)),
            DW_OP_const2u => operands.push(Operand::Unsigned(cursor.uint(2)?)),
            DW_OP_const2s => operands.push(Operand::Signed(cursor.sint(2)?)),
            DW_OP_const4u => operands.push(Operand::Unsigned(cursor.uint(4)?)),
            DW_OP_const4s => operands.push(Operand::Signed(cursor.sint(4)?)),
            DW_OP_const8u => operands.push(Operand::Unsigned(cursor.uint(8)?)),
            DW_OP_const8s => operands.push(Operand::Signed(cursor.sint(8)?)),
            DW_OP_constu | DW_OP_plus_uconst | DW_OP_regx | DW_OP_piece => {
                operands.push(Operand::Unsigned(cursor.uleb()?));
            }
            DW_OP_consts => operands.push(Operand::Signed(cursor.sleb()?)),
            DW_OP_pick | DW_OP_deref_size | DW_OP_xderef_size => operands.push(Operand::Unsigned(cursor.uint(1)?)),
            DW_OP_skip | DW_OP_bra => operands.push(Operand::Signed(cursor.sint(2)?)),
            DW_OP_fbreg => {
                operands.push(Operand::Signed(cursor.sleb()?));
                if !ctx.has_frame_base {
                    out.missing_frame_base = true;
                }
            }
            DW_OP_bregx => {
                operands.push(Operand::Unsigned(cursor.uleb()?));
                operands.push(Operand::Signed(cursor.sleb()?));
            }
            DW_OP_bit_piece => {
                operands.push(Operand::Unsigned(cursor.uleb()?));
                operands.push(Operand::Unsigned(cursor.uleb()?));
            }
            DW_OP_call2 => operands.push(Operand::Unsigned(cursor.uint(2)?)),
            DW_OP_call4 => operands.push(Operand::Unsigned(cursor.uint(4)?)),
            DW_OP_call_ref => operands.push(Operand::Unsigned(read_offset(&mut cursor, ctx.format)?)),
            _ if (DW_OP_breg0.0..=DW_OP_breg31.0).contains(&opcode.0) => {
                operands.push(Operand::Signed(cursor.sleb()?));
            }
            _ if (DW_OP_lit0.0..=DW_OP_lit31.0).contains(&opcode.0)
                || (DW_OP_reg0.0..=DW_OP_reg31.0).contains(&opcode.0)
                || NO_OPERAND.contains(&opcode.0) => {}
            _ => {
                return Err(ElfError::corrupt(
                    "location expression",
                    offset as u64,
                    format!("unknown opcode 0x{:02x}", opcode.0),
                ));
            }
        }

        out.ops.push(LocationOp {
            offset,
            opcode,
            operands,
        });
    }
    Ok(out)
}
