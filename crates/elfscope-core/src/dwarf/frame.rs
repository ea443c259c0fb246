//! Call frame information (`.debug_frame` and `.eh_frame`).
//!
//! Each FDE is processed in two passes. The first decodes its instructions,
//! together with those of its CIE, and finds the highest register column they
//! mention; the second runs the instructions over a state with that many
//! columns. In interpreted mode a row is produced at every location advance,
//! otherwise only the terminal row.

use std::collections::HashMap;
use std::fmt;

use gimli::{
    DwCfa, DwEhPe, Format, DW_CFA_GNU_args_size, DW_CFA_GNU_negative_offset_extended, DW_CFA_GNU_window_save,
    DW_CFA_advance_loc, DW_CFA_advance_loc1, DW_CFA_advance_loc2, DW_CFA_advance_loc4, DW_CFA_def_cfa,
    DW_CFA_def_cfa_expression, DW_CFA_def_cfa_offset, DW_CFA_def_cfa_offset_sf, DW_CFA_def_cfa_register,
    DW_CFA_def_cfa_sf, DW_CFA_expression, DW_CFA_nop, DW_CFA_offset, DW_CFA_offset_extended,
    DW_CFA_offset_extended_sf, DW_CFA_register, DW_CFA_remember_state, DW_CFA_restore, DW_CFA_restore_extended,
    DW_CFA_restore_state, DW_CFA_same_value, DW_CFA_set_loc, DW_CFA_undefined, DW_CFA_val_expression,
    DW_CFA_val_offset, DW_CFA_val_offset_sf, DW_EH_PE_absptr, DW_EH_PE_omit, DW_EH_PE_pcrel, DW_EH_PE_sdata2,
    DW_EH_PE_sdata4, DW_EH_PE_sdata8, DW_EH_PE_sleb128, DW_EH_PE_udata2, DW_EH_PE_udata4, DW_EH_PE_udata8,
    DW_EH_PE_uleb128,
};
use tracing::{debug, trace};

use super::unit::read_initial_length;
use super::{read_offset, DebugSection};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// Register columns beyond this are treated as corruption.
const MAX_COLUMNS: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFlavor
{
    /// `.debug_frame`: CIE id is all ones, CIE pointers are section offsets.
    DebugFrame,
    /// `.eh_frame`: CIE id is 0, CIE pointers are relative to the field.
    EhFrame,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfaRule
{
    RegisterOffset
    {
        register: u64,
        offset: i64,
    },
    Expression(Vec<u8>),
    Undefined,
}

impl fmt::Display for CfaRule
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            CfaRule::RegisterOffset { register, offset } => write!(f, "r{register}{offset:+}"),
            CfaRule::Expression(_) => f.write_str("exp"),
            CfaRule::Undefined => f.write_str("u"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegisterRule
{
    /// Never mentioned by the program.
    #[default]
    Unspecified,
    Undefined,
    SameValue,
    /// Saved at CFA + offset.
    Offset(i64),
    /// Value is CFA + offset.
    ValOffset(i64),
    Register(u64),
    Expression(Vec<u8>),
    ValExpression(Vec<u8>),
}

impl fmt::Display for RegisterRule
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            RegisterRule::Unspecified => Ok(()),
            RegisterRule::Undefined => f.write_str("u"),
            RegisterRule::SameValue => f.write_str("s"),
            RegisterRule::Offset(offset) => write!(f, "c{offset:+}"),
            RegisterRule::ValOffset(offset) => write!(f, "v{offset:+}"),
            RegisterRule::Register(register) => write!(f, "r{register}"),
            RegisterRule::Expression(_) => f.write_str("exp"),
            RegisterRule::ValExpression(_) => f.write_str("vexp"),
        }
    }
}

/// One row of the unwind table: the rules in effect from `location` on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState
{
    pub location: u64,
    pub cfa: CfaRule,
    /// Indexed by register column.
    pub registers: Vec<RegisterRule>,
}

impl FrameState
{
    fn new(location: u64, columns: usize) -> Self
    {
        Self {
            location,
            cfa: CfaRule::Undefined,
            registers: vec![RegisterRule::default(); columns],
        }
    }

    pub fn register(&self, column: u64) -> &RegisterRule
    {
        const UNSPECIFIED: RegisterRule = RegisterRule::Unspecified;
        usize::try_from(column)
            .ok()
            .and_then(|c| self.registers.get(c))
            .unwrap_or(&UNSPECIFIED)
    }

    fn set(&mut self, column: u64, rule: RegisterRule)
    {
        let Ok(column) = usize::try_from(column) else {
            return;
        };
        if column >= self.registers.len() {
            self.registers.resize(column + 1, RegisterRule::default());
        }
        self.registers[column] = rule;
    }
}

/// A decoded call frame instruction. Factored operands are already scaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CfaInstruction
{
    Nop,
    AdvanceLoc(u64),
    SetLoc(u64),
    Offset
    {
        register: u64,
        offset: i64,
    },
    ValOffset
    {
        register: u64,
        offset: i64,
    },
    Restore(u64),
    Undefined(u64),
    SameValue(u64),
    Register
    {
        register: u64,
        from: u64,
    },
    RememberState,
    RestoreState,
    DefCfa
    {
        register: u64,
        offset: i64,
    },
    DefCfaRegister(u64),
    DefCfaOffset(i64),
    DefCfaExpression(Vec<u8>),
    Expression
    {
        register: u64,
        expression: Vec<u8>,
    },
    ValExpression
    {
        register: u64,
        expression: Vec<u8>,
    },
    ArgsSize(u64),
    WindowSave,
}

impl CfaInstruction
{
    /// The register column the instruction writes or reads, if any.
    fn register(&self) -> Option<u64>
    {
        match *self {
            CfaInstruction::Offset { register, .. }
            | CfaInstruction::ValOffset { register, .. }
            | CfaInstruction::Expression { register, .. }
            | CfaInstruction::ValExpression { register, .. }
            | CfaInstruction::Restore(register)
            | CfaInstruction::Undefined(register)
            | CfaInstruction::SameValue(register) => Some(register),
            CfaInstruction::Register { register, from } => Some(register.max(from)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cie
{
    pub offset: u64,
    pub length: u64,
    pub format: Format,
    pub version: u8,
    pub augmentation: String,
    pub address_size: u8,
    pub code_alignment: u64,
    pub data_alignment: i64,
    pub return_address_register: u64,
    pub augmentation_data: Vec<u8>,
    pub fde_encoding: DwEhPe,
    pub lsda_encoding: Option<DwEhPe>,
    pub personality: Option<u64>,
    pub signal_frame: bool,
    pub instructions: Vec<(u64, CfaInstruction)>,
}

impl Cie
{
    fn has_augmentation_data(&self) -> bool
    {
        self.augmentation.starts_with('z')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fde
{
    pub offset: u64,
    pub length: u64,
    pub format: Format,
    /// Section offset of the owning CIE.
    pub cie_offset: u64,
    pub initial_location: u64,
    pub address_range: u64,
    pub augmentation_data: Vec<u8>,
    pub lsda: Option<u64>,
    pub instructions: Vec<(u64, CfaInstruction)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameRecord
{
    Cie(Cie),
    Fde
    {
        fde: Fde,
        rows: Vec<FrameState>,
    },
    /// A zero length entry.
    Terminator
    {
        offset: u64,
    },
}

struct EncodedPointers
{
    address_size: u8,
    /// `sh_addr` of the section, the base of `DW_EH_PE_pcrel`.
    section_address: u64,
}

impl EncodedPointers
{
    fn for_cie(cie: &Cie, section_address: u64) -> Self
    {
        Self {
            address_size: cie.address_size,
            section_address,
        }
    }

    /// Read a pointer with `encoding`, or `None` for `DW_EH_PE_omit`.
    ///
    /// Only PC-relative application is resolved; text, data and function
    /// relative values are returned unapplied.
    fn read(&self, cursor: &mut Cursor<'_>, encoding: DwEhPe, apply: bool) -> Result<Option<u64>>
    {
        if encoding == DW_EH_PE_omit {
            return Ok(None);
        }
        let field = cursor.offset();
        let value = match DwEhPe(encoding.0 & 0x0f) {
            DW_EH_PE_absptr => cursor.address(self.address_size)?,
            DW_EH_PE_uleb128 => cursor.uleb()?,
            DW_EH_PE_udata2 => cursor.uint(2)?,
            DW_EH_PE_udata4 => cursor.uint(4)?,
            DW_EH_PE_udata8 => cursor.uint(8)?,
            DW_EH_PE_sleb128 => cursor.sleb()? as u64,
            DW_EH_PE_sdata2 => cursor.sint(2)? as u64,
            DW_EH_PE_sdata4 => cursor.sint(4)? as u64,
            DW_EH_PE_sdata8 => cursor.sint(8)? as u64,
            other => {
                return Err(ElfError::corrupt(
                    "pointer encoding",
                    field,
                    format!("unknown value format 0x{:x}", other.0),
                ));
            }
        };
        if apply && DwEhPe(encoding.0 & 0x70) == DW_EH_PE_pcrel {
            return Ok(Some(value.wrapping_add(self.section_address).wrapping_add(field)));
        }
        Ok(Some(value))
    }
}

fn register_operand(cursor: &mut Cursor<'_>) -> Result<u64>
{
    cursor.uleb()
}

/// Pass 1: decode `bytes` into instructions.
///
/// `DW_CFA_set_loc` operands are read with the CIE's address size.
fn decode_instructions(
    bytes: &[u8],
    base: u64,
    cie: &Cie,
    order: ByteOrder,
    section_address: u64,
) -> Result<Vec<(u64, CfaInstruction)>>
{
    let pointers = EncodedPointers::for_cie(cie, section_address);
    let mut cursor = Cursor::with_base(bytes, order, base);
    let code = cie.code_alignment;
    let data = cie.data_alignment;
    let mut out = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let byte = cursor.u8()?;
        let low = u64::from(byte & 0x3f);
        let instruction = match DwCfa(byte & 0xc0) {
            DW_CFA_advance_loc => CfaInstruction::AdvanceLoc(low.wrapping_mul(code)),
            DW_CFA_offset => CfaInstruction::Offset {
                register: low,
                offset: (cursor.uleb()? as i64).wrapping_mul(data),
            },
            DW_CFA_restore => CfaInstruction::Restore(low),
            _ => match DwCfa(byte) {
                DW_CFA_nop => CfaInstruction::Nop,
                DW_CFA_set_loc => {
                    let address = pointers
                        .read(&mut cursor, cie.fde_encoding, true)?
                        .unwrap_or_default();
                    CfaInstruction::SetLoc(address)
                }
                DW_CFA_advance_loc1 => CfaInstruction::AdvanceLoc(cursor.uint(1)?.wrapping_mul(code)),
                DW_CFA_advance_loc2 => CfaInstruction::AdvanceLoc(cursor.uint(2)?.wrapping_mul(code)),
                DW_CFA_advance_loc4 => CfaInstruction::AdvanceLoc(cursor.uint(4)?.wrapping_mul(code)),
                DW_CFA_offset_extended => CfaInstruction::Offset {
                    register: register_operand(&mut cursor)?,
                    offset: (cursor.uleb()? as i64).wrapping_mul(data),
                },
                DW_CFA_offset_extended_sf => CfaInstruction::Offset {
                    register: register_operand(&mut cursor)?,
                    offset: cursor.sleb()?.wrapping_mul(data),
                },
                DW_CFA_GNU_negative_offset_extended => CfaInstruction::Offset {
                    register: register_operand(&mut cursor)?,
                    offset: (cursor.uleb()? as i64).wrapping_mul(data).wrapping_neg(),
                },
                DW_CFA_val_offset => CfaInstruction::ValOffset {
                    register: register_operand(&mut cursor)?,
                    offset: (cursor.uleb()? as i64).wrapping_mul(data),
                },
                DW_CFA_val_offset_sf => CfaInstruction::ValOffset {
                    register: register_operand(&mut cursor)?,
                    offset: cursor.sleb()?.wrapping_mul(data),
                },
                DW_CFA_restore_extended => CfaInstruction::Restore(register_operand(&mut cursor)?),
                DW_CFA_undefined => CfaInstruction::Undefined(register_operand(&mut cursor)?),
                DW_CFA_same_value => CfaInstruction::SameValue(register_operand(&mut cursor)?),
                DW_CFA_register => CfaInstruction::Register {
                    register: register_operand(&mut cursor)?,
                    from: register_operand(&mut cursor)?,
                },
                DW_CFA_remember_state => CfaInstruction::RememberState,
                DW_CFA_restore_state => CfaInstruction::RestoreState,
                DW_CFA_def_cfa => CfaInstruction::DefCfa {
                    register: register_operand(&mut cursor)?,
                    offset: cursor.uleb()? as i64,
                },
                DW_CFA_def_cfa_sf => CfaInstruction::DefCfa {
                    register: register_operand(&mut cursor)?,
                    offset: cursor.sleb()?.wrapping_mul(data),
                },
                DW_CFA_def_cfa_register => CfaInstruction::DefCfaRegister(register_operand(&mut cursor)?),
                DW_CFA_def_cfa_offset => CfaInstruction::DefCfaOffset(cursor.uleb()? as i64),
                DW_CFA_def_cfa_offset_sf => CfaInstruction::DefCfaOffset(cursor.sleb()?.wrapping_mul(data)),
                DW_CFA_def_cfa_expression => {
                    let len = block_len(&mut cursor)?;
                    CfaInstruction::DefCfaExpression(cursor.bytes(len)?.to_vec())
                }
                DW_CFA_expression => {
                    let register = register_operand(&mut cursor)?;
                    let len = block_len(&mut cursor)?;
                    CfaInstruction::Expression {
                        register,
                        expression: cursor.bytes(len)?.to_vec(),
                    }
                }
                DW_CFA_val_expression => {
                    let register = register_operand(&mut cursor)?;
                    let len = block_len(&mut cursor)?;
                    CfaInstruction::ValExpression {
                        register,
                        expression: cursor.bytes(len)?.to_vec(),
                    }
                }
                DW_CFA_GNU_args_size => CfaInstruction::ArgsSize(cursor.uleb()?),
                DW_CFA_GNU_window_save => CfaInstruction::WindowSave,
                other => {
                    return Err(ElfError::corrupt(
                        "call frame instruction",
                        offset,
                        format!("unknown opcode 0x{:02x}", other.0),
                    ));
                }
            },
        };
        if let Some(register) = instruction.register() {
            if register >= MAX_COLUMNS {
                return Err(ElfError::corrupt(
                    "call frame instruction",
                    offset,
                    format!("register {register} out of range"),
                ));
            }
        }
        out.push((offset, instruction));
    }
    Ok(out)
}

fn block_len(cursor: &mut Cursor<'_>) -> Result<usize>
{
    let offset = cursor.offset();
    let len = cursor.uleb()?;
    usize::try_from(len).map_err(|_| ElfError::corrupt("expression block", offset, "length too large"))
}

fn max_column(cie: &Cie, instructions: &[(u64, CfaInstruction)]) -> u64
{
    cie.instructions
        .iter()
        .chain(instructions)
        .filter_map(|(_, i)| i.register())
        .chain(std::iter::once(cie.return_address_register))
        .max()
        .unwrap_or(0)
}

/// Pass 2: run `instructions` from `state`, collecting rows.
///
/// `initial` holds the CIE's rules for `DW_CFA_restore`.
fn execute(
    instructions: &[(u64, CfaInstruction)],
    mut state: FrameState,
    initial: Option<&FrameState>,
    interpret: bool,
    what: &str,
    diags: &mut Diagnostics,
) -> (FrameState, Vec<FrameState>)
{
    let mut rows = Vec::new();
    let mut stack: Vec<(CfaRule, Vec<RegisterRule>)> = Vec::new();

    for (offset, instruction) in instructions {
        match instruction {
            CfaInstruction::Nop | CfaInstruction::ArgsSize(_) | CfaInstruction::WindowSave => {}
            CfaInstruction::AdvanceLoc(delta) => {
                if interpret {
                    rows.push(state.clone());
                }
                state.location = state.location.wrapping_add(*delta);
            }
            CfaInstruction::SetLoc(address) => {
                if interpret {
                    rows.push(state.clone());
                }
                state.location = *address;
            }
            CfaInstruction::Offset { register, offset } => state.set(*register, RegisterRule::Offset(*offset)),
            CfaInstruction::ValOffset { register, offset } => state.set(*register, RegisterRule::ValOffset(*offset)),
            CfaInstruction::Restore(register) => {
                let rule = initial.map(|i| i.register(*register).clone()).unwrap_or_default();
                state.set(*register, rule);
            }
            CfaInstruction::Undefined(register) => state.set(*register, RegisterRule::Undefined),
            CfaInstruction::SameValue(register) => state.set(*register, RegisterRule::SameValue),
            CfaInstruction::Register { register, from } => state.set(*register, RegisterRule::Register(*from)),
            CfaInstruction::RememberState => stack.push((state.cfa.clone(), state.registers.clone())),
            CfaInstruction::RestoreState => match stack.pop() {
                Some((cfa, registers)) => {
                    state.cfa = cfa;
                    state.registers = registers;
                }
                None => diags.warn(Some(what), Some(*offset), "DW_CFA_restore_state with an empty state stack"),
            },
            CfaInstruction::DefCfa { register, offset } => {
                state.cfa = CfaRule::RegisterOffset {
                    register: *register,
                    offset: *offset,
                };
            }
            CfaInstruction::DefCfaRegister(register) => {
                let offset = match state.cfa {
                    CfaRule::RegisterOffset { offset, .. } => offset,
                    _ => 0,
                };
                state.cfa = CfaRule::RegisterOffset {
                    register: *register,
                    offset,
                };
            }
            CfaInstruction::DefCfaOffset(new_offset) => match &mut state.cfa {
                CfaRule::RegisterOffset { offset, .. } => *offset = *new_offset,
                _ => diags.warn(Some(what), Some(*offset), "DW_CFA_def_cfa_offset without a CFA register"),
            },
            CfaInstruction::DefCfaExpression(expression) => state.cfa = CfaRule::Expression(expression.clone()),
            CfaInstruction::Expression { register, expression } => {
                state.set(*register, RegisterRule::Expression(expression.clone()));
            }
            CfaInstruction::ValExpression { register, expression } => {
                state.set(*register, RegisterRule::ValExpression(expression.clone()));
            }
        }
    }
    (state, rows)
}

struct FrameParser<'a>
{
    section: &'a DebugSection,
    flavor: FrameFlavor,
    order: ByteOrder,
    pointers: EncodedPointers,
    cies: HashMap<u64, Cie>,
}

impl FrameParser<'_>
{
    fn is_cie_id(&self, id: u64, format: Format) -> bool
    {
        match self.flavor {
            FrameFlavor::EhFrame => id == 0,
            FrameFlavor::DebugFrame => match format {
                Format::Dwarf32 => id == 0xffff_ffff,
                Format::Dwarf64 => id == u64::MAX,
            },
        }
    }

    fn parse_cie(&self, offset: u64, length: u64, format: Format, mut body: Cursor<'_>) -> Result<Cie>
    {
        let version = body.u8()?;
        if !matches!(version, 1 | 3 | 4) {
            return Err(ElfError::corrupt("CIE", offset, format!("unsupported CIE version {version}")));
        }
        let augmentation = body.cstr()?.into_owned();
        let mut address_size = self.pointers.address_size;
        if augmentation.contains("eh") {
            body.address(address_size)?;
        }
        if version >= 4 {
            address_size = body.u8()?;
            body.u8()?;
        }
        let code_alignment = body.uleb()?;
        let data_alignment = body.sleb()?;
        let return_address_register = if version == 1 { u64::from(body.u8()?) } else { body.uleb()? };
        if return_address_register >= MAX_COLUMNS {
            return Err(ElfError::corrupt(
                "CIE",
                offset,
                format!("return address column {return_address_register} out of range"),
            ));
        }

        let mut cie = Cie {
            offset,
            length,
            format,
            version,
            augmentation,
            address_size,
            code_alignment,
            data_alignment,
            return_address_register,
            augmentation_data: Vec::new(),
            fde_encoding: DW_EH_PE_absptr,
            lsda_encoding: None,
            personality: None,
            signal_frame: false,
            instructions: Vec::new(),
        };

        if cie.has_augmentation_data() {
            let len = block_len(&mut body)?;
            let data = body.split(len)?;
            cie.augmentation_data = data.rest().to_vec();
            self.parse_augmentation(&mut cie, data)?;
        } else if !cie.augmentation.is_empty() && cie.augmentation != "eh" {
            return Err(ElfError::corrupt(
                "CIE",
                offset,
                format!("unknown augmentation \"{}\"", cie.augmentation),
            ));
        }

        let base = body.offset();
        cie.instructions = decode_instructions(body.rest(), base, &cie, self.order, self.pointers.section_address)?;
        Ok(cie)
    }

    fn parse_augmentation(&self, cie: &mut Cie, mut data: Cursor<'_>) -> Result<()>
    {
        let pointers = EncodedPointers::for_cie(cie, self.pointers.section_address);
        for letter in cie.augmentation.clone().chars().skip(1) {
            match letter {
                'R' => cie.fde_encoding = DwEhPe(data.u8()?),
                'L' => cie.lsda_encoding = Some(DwEhPe(data.u8()?)),
                'P' => {
                    let encoding = DwEhPe(data.u8()?);
                    cie.personality = pointers.read(&mut data, encoding, true)?;
                }
                'S' => cie.signal_frame = true,
                _ => break,
            }
        }
        Ok(())
    }

    /// The CIE at `offset`, parsing it on first use.
    fn cie_at(&mut self, offset: u64) -> Result<Cie>
    {
        if let Some(cie) = self.cies.get(&offset) {
            return Ok(cie.clone());
        }
        let start = usize::try_from(offset)
            .ok()
            .filter(|&start| start < self.section.data.len())
            .ok_or(ElfError::IndexOutOfRange {
                what: "CIE pointer",
                index: offset,
                limit: self.section.data.len() as u64,
            })?;
        let mut cursor = Cursor::with_base(&self.section.data[start..], self.order, offset);
        let (length, format) = read_initial_length(&mut cursor)?;
        let mut body = cursor.split(usize::try_from(length).unwrap_or(usize::MAX))?;
        let id = read_offset(&mut body, format)?;
        if !self.is_cie_id(id, format) {
            return Err(ElfError::corrupt("FDE", offset, "CIE pointer does not point at a CIE"));
        }
        let cie = self.parse_cie(offset, length, format, body)?;
        self.cies.insert(offset, cie.clone());
        Ok(cie)
    }

    fn parse_fde(&mut self, offset: u64, length: u64, format: Format, id_field: u64, id: u64, mut body: Cursor<'_>) -> Result<Fde>
    {
        let cie_offset = match self.flavor {
            FrameFlavor::DebugFrame => id,
            FrameFlavor::EhFrame => id_field.checked_sub(id).ok_or_else(|| {
                ElfError::corrupt("FDE", offset, format!("CIE pointer 0x{id:x} points before the section"))
            })?,
        };
        let cie = self.cie_at(cie_offset)?;
        let pointers = EncodedPointers::for_cie(&cie, self.pointers.section_address);

        let (initial_location, address_range) = match self.flavor {
            FrameFlavor::EhFrame => {
                let begin = pointers.read(&mut body, cie.fde_encoding, true)?.unwrap_or_default();
                let range = pointers.read(&mut body, cie.fde_encoding, false)?.unwrap_or_default();
                (begin, range)
            }
            FrameFlavor::DebugFrame => (body.address(cie.address_size)?, body.address(cie.address_size)?),
        };

        let mut augmentation_data = Vec::new();
        let mut lsda = None;
        if cie.has_augmentation_data() {
            let len = block_len(&mut body)?;
            let mut data = body.split(len)?;
            augmentation_data = data.rest().to_vec();
            if let Some(encoding) = cie.lsda_encoding {
                lsda = pointers.read(&mut data, encoding, true)?;
            }
        }

        let base = body.offset();
        let instructions = decode_instructions(body.rest(), base, &cie, self.order, self.pointers.section_address)?;
        Ok(Fde {
            offset,
            length,
            format,
            cie_offset,
            initial_location,
            address_range,
            augmentation_data,
            lsda,
            instructions,
        })
    }
}

/// Decode every CIE and FDE in `section`.
///
/// With `interpret` each FDE yields one row per location advance plus the
/// final row; without it only the final row. A corrupt record is reported and
/// skipped, as long as its length allows finding the next one.
pub fn parse_frame_section(
    section: &DebugSection,
    flavor: FrameFlavor,
    order: ByteOrder,
    address_size: u8,
    interpret: bool,
    diags: &mut Diagnostics,
) -> Vec<FrameRecord>
{
    let what = section.name.as_str();
    let mut parser = FrameParser {
        section,
        flavor,
        order,
        pointers: EncodedPointers {
            address_size,
            section_address: section.address,
        },
        cies: HashMap::new(),
    };
    let mut cursor = section.cursor(order);
    let mut records = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let (length, format) = match read_initial_length(&mut cursor) {
            Ok(header) => header,
            Err(err) => {
                diags.record_error(Some(what), &err);
                break;
            }
        };
        if length == 0 {
            records.push(FrameRecord::Terminator { offset });
            continue;
        }
        let mut body = match usize::try_from(length).ok().map(|len| cursor.split(len)) {
            Some(Ok(body)) => body,
            _ => {
                diags.record_error(
                    Some(what),
                    &ElfError::corrupt("frame entry", offset, format!("length 0x{length:x} runs past the section")),
                );
                break;
            }
        };

        let id_field = body.offset();
        let id = match read_offset(&mut body, format) {
            Ok(id) => id,
            Err(err) => {
                diags.record_warning(Some(what), &err);
                continue;
            }
        };

        if parser.is_cie_id(id, format) {
            match parser.cie_at(offset) {
                Ok(cie) => records.push(FrameRecord::Cie(cie)),
                Err(err) => diags.record_warning(Some(what), &err),
            }
            continue;
        }

        let fde = match parser.parse_fde(offset, length, format, id_field, id, body) {
            Ok(fde) => fde,
            Err(err) => {
                diags.record_warning(Some(what), &err);
                continue;
            }
        };
        let Some(cie) = parser.cies.get(&fde.cie_offset) else {
            continue;
        };

        // pass 2, sized by pass 1
        let Some(columns) = usize::try_from(max_column(cie, &fde.instructions))
            .ok()
            .and_then(|column| column.checked_add(1))
        else {
            diags.record_warning(
                Some(what),
                &ElfError::corrupt("FDE", offset, "register column count overflows"),
            );
            continue;
        };
        let (initial, _) = execute(
            &cie.instructions,
            FrameState::new(fde.initial_location, columns),
            None,
            false,
            what,
            diags,
        );
        let (last, mut rows) = execute(&fde.instructions, initial.clone(), Some(&initial), interpret, what, diags);
        rows.push(last);
        trace!(fde = offset, rows = rows.len(), "executed frame program");
        records.push(FrameRecord::Fde { fde, rows });
    }

    debug!(section = what, records = records.len(), "decoded call frame information");
    records
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn section(name: &str, address: u64, data: Vec<u8>) -> DebugSection
    {
        DebugSection {
            name: name.to_owned(),
            offset: 0,
            address,
            data,
        }
    }

    fn record(id: &[u8], body: &[u8]) -> Vec<u8>
    {
        let mut payload = id.to_vec();
        payload.extend_from_slice(body);
        while (payload.len() + 4) % 4 != 0 {
            payload.push(0);
        }
        let mut out = (payload.len() as u32).to_le_bytes().to_vec();
        out.extend(payload);
        out
    }

    /// CIE: code_factor=1, data_factor=-4, return column 16, CFA = r7+8,
    /// r16 at cfa-4.
    fn debug_frame_cie() -> Vec<u8>
    {
        record(&[0xff; 4], &[0x01, 0x00, 0x01, 0x7c, 0x10, 0x0c, 0x07, 0x08, 0x90, 0x01])
    }

    fn debug_frame(fde_program: &[u8]) -> Vec<u8>
    {
        let mut data = debug_frame_cie();
        let mut body = 0x40_1000u64.to_le_bytes().to_vec();
        body.extend_from_slice(&0x20u64.to_le_bytes());
        body.extend_from_slice(fde_program);
        data.extend(record(&0u32.to_le_bytes(), &body));
        data
    }

    fn rows(records: &[FrameRecord]) -> &[FrameState]
    {
        records
            .iter()
            .find_map(|r| match r {
                FrameRecord::Fde { rows, .. } => Some(rows.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_advance_then_offset()
    {
        // advance_loc(4); offset(r6, 8)
        let data = debug_frame(&[0x44, 0x86, 0x08]);
        let mut diags = Diagnostics::new();
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, true, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags.iter().collect::<Vec<_>>());

        let FrameRecord::Cie(cie) = &records[0] else {
            panic!("expected a CIE first");
        };
        assert_eq!(cie.code_alignment, 1);
        assert_eq!(cie.data_alignment, -4);
        assert_eq!(cie.return_address_register, 16);

        let rows = rows(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location, 0x40_1000);
        assert_eq!(rows[0].register(6), &RegisterRule::Unspecified);
        let last = &rows[1];
        assert_eq!(last.location, 0x40_1004);
        assert_eq!(last.register(6), &RegisterRule::Offset(-32));
        assert_eq!(last.register(16), &RegisterRule::Offset(-4));
        assert_eq!(last.cfa, CfaRule::RegisterOffset { register: 7, offset: 8 });
        assert_eq!(last.registers.len(), 17);
    }

    #[test]
    fn test_raw_mode_keeps_terminal_row()
    {
        let data = debug_frame(&[0x44, 0x86, 0x08]);
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, false, &mut Diagnostics::new());
        let rows = rows(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, 0x40_1004);
        assert_eq!(rows[0].register(6), &RegisterRule::Offset(-32));
    }

    #[test]
    fn test_remember_restore_and_empty_stack()
    {
        // remember; def_cfa_offset 16; advance 1; restore; restore (empty)
        let data = debug_frame(&[0x0a, 0x0e, 0x10, 0x41, 0x0b, 0x0b]);
        let mut diags = Diagnostics::new();
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, true, &mut diags);
        let rows = rows(&records);
        assert_eq!(rows[0].cfa, CfaRule::RegisterOffset { register: 7, offset: 16 });
        assert_eq!(rows[1].cfa, CfaRule::RegisterOffset { register: 7, offset: 8 });
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.mentions("empty state stack"));
    }

    #[test]
    fn test_restore_uses_cie_rule()
    {
        // offset(r16, 2) then restore(r16)
        let data = debug_frame(&[0x90, 0x02, 0xd0]);
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, false, &mut Diagnostics::new());
        assert_eq!(rows(&records)[0].register(16), &RegisterRule::Offset(-4));
    }

    #[test]
    fn test_eh_frame_pcrel_and_relative_cie_pointer()
    {
        // CIE "zR", fde encoding pcrel|sdata4
        let cie = record(&0u32.to_le_bytes(), &[0x01, b'z', b'R', 0x00, 0x01, 0x78, 0x10, 0x01, 0x1b, 0x0c, 0x07, 0x08]);
        let fde_start = cie.len();
        let mut body = Vec::new();
        // pc_begin relative to the field at fde_start + 8
        body.extend_from_slice(&0x100i32.to_le_bytes());
        body.extend_from_slice(&0x10u32.to_le_bytes());
        body.push(0x00);
        body.push(0x44);
        let pointer = (fde_start + 4) as u32;
        let mut data = cie;
        data.extend(record(&pointer.to_le_bytes(), &body));
        data.extend_from_slice(&0u32.to_le_bytes());

        let mut diags = Diagnostics::new();
        let records = parse_frame_section(&section(".eh_frame", 0x2000, data), FrameFlavor::EhFrame, ByteOrder::Little, 8, true, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags.iter().collect::<Vec<_>>());
        assert!(matches!(records.last(), Some(FrameRecord::Terminator { .. })));

        let fde = records
            .iter()
            .find_map(|r| match r {
                FrameRecord::Fde { fde, .. } => Some(fde),
                _ => None,
            })
            .unwrap();
        assert_eq!(fde.cie_offset, 0);
        assert_eq!(fde.initial_location, 0x2000 + (fde_start as u64 + 8) + 0x100);
        assert_eq!(fde.address_range, 0x10);
    }

    #[test]
    fn test_unknown_opcode_skips_fde()
    {
        let data = debug_frame(&[0x3f]);
        let mut diags = Diagnostics::new();
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, true, &mut diags);
        assert_eq!(records.len(), 1);
        assert!(diags.mentions("unknown opcode 0x3f"));
    }

    /// A `.debug_frame` FDE covering `[0x40_1000, 0x40_1020)` that refers to the CIE at `cie`.
    fn fde_for(cie: u32, program: &[u8]) -> Vec<u8>
    {
        let mut body = 0x40_1000u64.to_le_bytes().to_vec();
        body.extend_from_slice(&0x20u64.to_le_bytes());
        body.extend_from_slice(program);
        record(&cie.to_le_bytes(), &body)
    }

    #[test]
    fn test_huge_return_column_skips_cie()
    {
        for column in [vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01], vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x40]] {
            // version 3 CIE whose return column is the ULEB `column`
            let mut cie = vec![0x03, 0x00, 0x01, 0x7c];
            cie.extend_from_slice(&column);
            cie.extend_from_slice(&[0x0c, 0x07, 0x08]);
            let mut data = record(&[0xff; 4], &cie);
            data.extend(fde_for(0, &[0x44]));
            let good = data.len() as u32;
            data.extend(debug_frame_cie());
            data.extend(fde_for(good, &[0x44, 0x86, 0x08]));

            let mut diags = Diagnostics::new();
            let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, true, &mut diags);
            assert!(diags.mentions("return address column"));
            assert!(!diags.has_fatal());
            assert_eq!(records.len(), 2);
            assert!(matches!(&records[0], FrameRecord::Cie(cie) if cie.offset == u64::from(good)));
            assert_eq!(rows(&records).last().unwrap().register(6), &RegisterRule::Offset(-32));
        }
    }

    #[test]
    fn test_set_loc_uses_cie_address_size()
    {
        // version 4 CIE with 4-byte addresses, parsed with an 8-byte default
        let mut data = record(&[0xff; 4], &[0x04, 0x00, 0x04, 0x00, 0x01, 0x7c, 0x10, 0x0c, 0x07, 0x08]);
        let mut body = 0x40_1000u32.to_le_bytes().to_vec();
        body.extend_from_slice(&0x20u32.to_le_bytes());
        // set_loc(0x40_1010); def_cfa_offset(16)
        body.push(0x01);
        body.extend_from_slice(&0x40_1010u32.to_le_bytes());
        body.extend_from_slice(&[0x0e, 0x10]);
        data.extend(record(&0u32.to_le_bytes(), &body));

        let mut diags = Diagnostics::new();
        let records = parse_frame_section(&section(".debug_frame", 0, data), FrameFlavor::DebugFrame, ByteOrder::Little, 8, true, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags.iter().collect::<Vec<_>>());
        let FrameRecord::Cie(cie) = &records[0] else {
            panic!("expected a CIE first");
        };
        assert_eq!(cie.address_size, 4);
        let last = rows(&records).last().unwrap();
        assert_eq!(last.location, 0x40_1010);
        assert_eq!(last.cfa, CfaRule::RegisterOffset { register: 7, offset: 16 });
    }
}
