//! `.debug_line` programs.

use gimli::{
    DwLne, DwLns, Format, DW_LNE_define_file, DW_LNE_end_sequence, DW_LNE_set_address, DW_LNS_advance_line,
    DW_LNS_advance_pc, DW_LNS_const_add_pc, DW_LNS_copy, DW_LNS_fixed_advance_pc, DW_LNS_negate_stmt,
    DW_LNS_set_basic_block, DW_LNS_set_column, DW_LNS_set_epilogue_begin, DW_LNS_set_file, DW_LNS_set_isa,
    DW_LNS_set_prologue_end,
};
use tracing::debug;

use super::unit::split_record;
use super::{read_offset, DebugSection};
use crate::diagnostics::Diagnostics;
use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry
{
    pub name: String,
    /// Index into the include directories; 0 is the compilation directory.
    pub directory: u64,
    pub modified: u64,
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProgramHeader
{
    pub offset: u64,
    pub format: Format,
    pub unit_length: u64,
    pub version: u16,
    pub header_length: u64,
    pub minimum_instruction_length: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    pub opcode_base: u8,
    /// Operand counts of standard opcodes `1..opcode_base`.
    pub standard_opcode_lengths: Vec<u8>,
    pub include_directories: Vec<String>,
    /// The header's file table, followed by `DW_LNE_define_file` entries.
    pub files: Vec<FileEntry>,
}

/// The line-number state machine registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRegisters
{
    pub address: u64,
    pub file: u64,
    pub line: u64,
    pub column: u64,
    pub is_stmt: bool,
    pub basic_block: bool,
    pub end_sequence: bool,
    /// Number of the most recent `DW_LNE_define_file` entry, 0 if none.
    pub last_file_entry: u64,
}

impl LineRegisters
{
    pub fn new(default_is_stmt: bool) -> Self
    {
        Self {
            address: 0,
            file: 1,
            line: 1,
            column: 0,
            is_stmt: default_is_stmt,
            basic_block: false,
            end_sequence: false,
            last_file_entry: 0,
        }
    }
}

/// One row of the line table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRow
{
    pub address: u64,
    pub file: u64,
    pub line: u64,
    pub column: u64,
    pub is_stmt: bool,
    pub basic_block: bool,
    pub end_sequence: bool,
}

impl From<&LineRegisters> for LineRow
{
    fn from(regs: &LineRegisters) -> Self
    {
        Self {
            address: regs.address,
            file: regs.file,
            line: regs.line,
            column: regs.column,
            is_stmt: regs.is_stmt,
            basic_block: regs.basic_block,
            end_sequence: regs.end_sequence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineInstruction
{
    Special
    {
        opcode: u8,
        address_advance: u64,
        line_advance: i64,
    },
    Copy,
    AdvancePc(u64),
    AdvanceLine(i64),
    SetFile(u64),
    SetColumn(u64),
    NegateStmt,
    SetBasicBlock,
    ConstAddPc(u64),
    FixedAdvancePc(u16),
    SetPrologueEnd,
    SetEpilogueBegin,
    SetIsa(u64),
    UnknownStandard
    {
        opcode: u8,
        operands: Vec<u64>,
    },
    EndSequence,
    SetAddress(u64),
    DefineFile(FileEntry),
    UnknownExtended
    {
        opcode: u8,
        length: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProgram
{
    pub header: LineProgramHeader,
    /// Every opcode with its offset in `.debug_line`.
    pub instructions: Vec<(u64, LineInstruction)>,
    pub rows: Vec<LineRow>,
}

fn parse_header(offset: u64, unit_length: u64, format: Format, body: &mut Cursor<'_>) -> Result<LineProgramHeader>
{
    let version = body.u16()?;
    if !(2..=3).contains(&version) {
        return Err(ElfError::UnsupportedVersion { offset, version });
    }
    let header_length = read_offset(body, format)?;
    let program_start = (body.position() as u64).checked_add(header_length).ok_or_else(|| {
        ElfError::corrupt(
            "line program header",
            offset,
            format!("header_length 0x{header_length:x} runs past the unit"),
        )
    })?;

    let minimum_instruction_length = body.u8()?;
    let default_is_stmt = body.u8()? != 0;
    let line_base = body.i8()?;
    let line_range = body.u8()?;
    let opcode_base = body.u8()?;
    if line_range == 0 {
        return Err(ElfError::corrupt("line program header", offset, "line_range is zero"));
    }
    let standard_opcode_lengths = body.bytes(usize::from(opcode_base.saturating_sub(1)))?.to_vec();

    let mut include_directories = Vec::new();
    loop {
        let dir = body.cstr()?;
        if dir.is_empty() {
            break;
        }
        include_directories.push(dir.into_owned());
    }

    let mut files = Vec::new();
    while let Some(file) = read_file_entry(body)? {
        files.push(file);
    }

    let start = usize::try_from(program_start).unwrap_or(usize::MAX);
    if start < body.position() {
        return Err(ElfError::corrupt(
            "line program header",
            offset,
            format!("header_length 0x{header_length:x} ends inside the file table"),
        ));
    }
    body.seek(start)?;

    Ok(LineProgramHeader {
        offset,
        format,
        unit_length,
        version,
        header_length,
        minimum_instruction_length,
        default_is_stmt,
        line_base,
        line_range,
        opcode_base,
        standard_opcode_lengths,
        include_directories,
        files,
    })
}

/// A file table entry, or `None` at the terminating empty name.
fn read_file_entry(cursor: &mut Cursor<'_>) -> Result<Option<FileEntry>>
{
    let name = cursor.cstr()?;
    if name.is_empty() {
        return Ok(None);
    }
    let name = name.into_owned();
    Ok(Some(FileEntry {
        name,
        directory: cursor.uleb()?,
        modified: cursor.uleb()?,
        length: cursor.uleb()?,
    }))
}

struct LineMachine<'p>
{
    program: &'p mut LineProgram,
    regs: LineRegisters,
}

impl LineMachine<'_>
{
    fn emit_row(&mut self)
    {
        self.program.rows.push(LineRow::from(&self.regs));
        self.regs.basic_block = false;
    }

    fn advance_address(&mut self, operation_advance: u64) -> u64
    {
        let advance = operation_advance.wrapping_mul(u64::from(self.program.header.minimum_instruction_length));
        self.regs.address = self.regs.address.wrapping_add(advance);
        advance
    }

    fn run(&mut self, cursor: &mut Cursor<'_>) -> Result<()>
    {
        let header = self.program.header.clone();
        while !cursor.is_empty() {
            let offset = cursor.offset();
            let opcode = cursor.u8()?;

            let instruction = if opcode >= header.opcode_base {
                let adjusted = opcode - header.opcode_base;
                let address_advance = self.advance_address(u64::from(adjusted / header.line_range));
                let line_advance = i64::from(header.line_base) + i64::from(adjusted % header.line_range);
                self.regs.line = self.regs.line.wrapping_add_signed(line_advance);
                self.emit_row();
                LineInstruction::Special {
                    opcode,
                    address_advance,
                    line_advance,
                }
            } else if opcode == 0 {
                self.extended(cursor)?
            } else {
                self.standard(DwLns(opcode), &header, cursor)?
            };
            self.program.instructions.push((offset, instruction));
        }
        Ok(())
    }

    fn standard(&mut self, opcode: DwLns, header: &LineProgramHeader, cursor: &mut Cursor<'_>) -> Result<LineInstruction>
    {
        let instruction = match opcode {
            DW_LNS_copy => {
                self.emit_row();
                LineInstruction::Copy
            }
            DW_LNS_advance_pc => {
                let operand = cursor.uleb()?;
                LineInstruction::AdvancePc(self.advance_address(operand))
            }
            DW_LNS_advance_line => {
                let delta = cursor.sleb()?;
                self.regs.line = self.regs.line.wrapping_add_signed(delta);
                LineInstruction::AdvanceLine(delta)
            }
            DW_LNS_set_file => {
                self.regs.file = cursor.uleb()?;
                LineInstruction::SetFile(self.regs.file)
            }
            DW_LNS_set_column => {
                self.regs.column = cursor.uleb()?;
                LineInstruction::SetColumn(self.regs.column)
            }
            DW_LNS_negate_stmt => {
                self.regs.is_stmt = !self.regs.is_stmt;
                LineInstruction::NegateStmt
            }
            DW_LNS_set_basic_block => {
                self.regs.basic_block = true;
                LineInstruction::SetBasicBlock
            }
            DW_LNS_const_add_pc => {
                let adjusted = 255 - header.opcode_base;
                LineInstruction::ConstAddPc(self.advance_address(u64::from(adjusted / header.line_range)))
            }
            DW_LNS_fixed_advance_pc => {
                let delta = cursor.u16()?;
                self.regs.address = self.regs.address.wrapping_add(u64::from(delta));
                LineInstruction::FixedAdvancePc(delta)
            }
            DW_LNS_set_prologue_end => LineInstruction::SetPrologueEnd,
            DW_LNS_set_epilogue_begin => LineInstruction::SetEpilogueBegin,
            DW_LNS_set_isa => LineInstruction::SetIsa(cursor.uleb()?),
            DwLns(other) => {
                let count = header
                    .standard_opcode_lengths
                    .get(usize::from(other) - 1)
                    .copied()
                    .unwrap_or(0);
                let operands = (0..count).map(|_| cursor.uleb()).collect::<Result<Vec<_>>>()?;
                LineInstruction::UnknownStandard { opcode: other, operands }
            }
        };
        Ok(instruction)
    }

    fn extended(&mut self, cursor: &mut Cursor<'_>) -> Result<LineInstruction>
    {
        let offset = cursor.offset();
        let length = cursor.uleb()?;
        if length == 0 {
            return Err(ElfError::corrupt("extended line opcode", offset, "zero length"));
        }
        let body_len = usize::try_from(length)
            .map_err(|_| ElfError::corrupt("extended line opcode", offset, "length too large"))?;
        let mut body = cursor.split(body_len)?;
        let opcode = DwLne(body.u8()?);

        let instruction = match opcode {
            DW_LNE_end_sequence => {
                self.regs.end_sequence = true;
                self.emit_row();
                self.regs = LineRegisters::new(self.program.header.default_is_stmt);
                LineInstruction::EndSequence
            }
            DW_LNE_set_address => {
                let size = u8::try_from(body.remaining()).unwrap_or(0);
                self.regs.address = body.address(size)?;
                LineInstruction::SetAddress(self.regs.address)
            }
            DW_LNE_define_file => {
                let file = read_file_entry(&mut body)?
                    .ok_or_else(|| ElfError::corrupt("DW_LNE_define_file", offset, "empty file name"))?;
                self.program.header.files.push(file.clone());
                self.regs.last_file_entry = self.program.header.files.len() as u64;
                LineInstruction::DefineFile(file)
            }
            DwLne(other) => LineInstruction::UnknownExtended { opcode: other, length },
        };
        Ok(instruction)
    }
}

/// Decode every line program in `section`.
///
/// A program with an unsupported version or a corrupt header is skipped with a
/// warning. A truncated opcode stream keeps the instructions decoded so far.
pub fn parse_line_programs(section: &DebugSection, order: ByteOrder, diags: &mut Diagnostics) -> Vec<LineProgram>
{
    let what = section.name.as_str();
    let mut cursor = section.cursor(order);
    let mut programs = Vec::new();

    while !cursor.is_empty() {
        let offset = cursor.offset();
        let (unit_length, format, mut body) = match split_record(&mut cursor) {
            Ok(record) => record,
            Err(err) => {
                diags.record_error(Some(what), &err);
                break;
            }
        };
        let header = match parse_header(offset, unit_length, format, &mut body) {
            Ok(header) => header,
            Err(err) => {
                diags.record_warning(Some(what), &err);
                continue;
            }
        };

        let regs = LineRegisters::new(header.default_is_stmt);
        let mut program = LineProgram {
            header,
            instructions: Vec::new(),
            rows: Vec::new(),
        };
        let result = LineMachine {
            program: &mut program,
            regs,
        }
        .run(&mut body);
        if let Err(err) = result {
            diags.record_warning(Some(what), &err);
        }
        programs.push(program);
    }

    debug!(programs = programs.len(), "decoded line programs");
    programs
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn program(version: u16, line_range: u8, ops: &[u8]) -> Vec<u8>
    {
        let mut header = vec![1, 1, (-5i8) as u8, line_range, 13];
        header.extend_from_slice(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
        header.extend_from_slice(b"inc\0\0");
        header.extend_from_slice(b"a.c\0\x01\x00\x00\0");

        let mut body = version.to_le_bytes().to_vec();
        body.extend_from_slice(&(header.len() as u32).to_le_bytes());
        body.extend_from_slice(&header);
        body.extend_from_slice(ops);

        let mut out = (body.len() as u32).to_le_bytes().to_vec();
        out.extend(body);
        out
    }

    fn section(data: Vec<u8>) -> DebugSection
    {
        DebugSection {
            name: ".debug_line".to_owned(),
            offset: 0,
            address: 0,
            data,
        }
    }

    fn ops() -> Vec<u8>
    {
        let mut ops = vec![0x00, 0x05, 0x02];
        ops.extend_from_slice(&0x1000u32.to_le_bytes());
        // special: address += 2, line += 3
        ops.push(49);
        // advance_pc 4, copy
        ops.extend_from_slice(&[0x02, 0x04, 0x01]);
        // define_file "b.c"
        ops.extend_from_slice(&[0x00, 0x08, 0x03]);
        ops.extend_from_slice(b"b.c\0\x00\x00\x00");
        // end_sequence
        ops.extend_from_slice(&[0x00, 0x01, 0x01]);
        ops
    }

    #[test]
    fn test_line_program_rows()
    {
        let mut diags = Diagnostics::new();
        let programs = parse_line_programs(&section(program(2, 14, &ops())), ByteOrder::Little, &mut diags);
        assert!(diags.is_empty(), "{:?}", diags.iter().collect::<Vec<_>>());
        assert_eq!(programs.len(), 1);

        let program = &programs[0];
        assert_eq!(program.header.include_directories, vec!["inc".to_owned()]);
        assert_eq!(program.header.files.len(), 2);
        assert_eq!(program.header.files[1].name, "b.c");
        assert_eq!(
            program.instructions[1].1,
            LineInstruction::Special {
                opcode: 49,
                address_advance: 2,
                line_advance: 3
            }
        );

        let rows: Vec<(u64, u64, bool)> = program.rows.iter().map(|r| (r.address, r.line, r.end_sequence)).collect();
        assert_eq!(rows, vec![(0x1002, 4, false), (0x1006, 4, false), (0x1006, 4, true)]);
    }

    #[test]
    fn test_zero_line_range_is_corrupt()
    {
        let mut data = program(2, 0, &ops());
        data.extend(program(3, 14, &ops()));
        let mut diags = Diagnostics::new();
        let programs = parse_line_programs(&section(data), ByteOrder::Little, &mut diags);
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].header.version, 3);
        assert!(diags.mentions("line_range is zero"));
    }

    #[test]
    fn test_unsupported_version_is_skipped()
    {
        let mut diags = Diagnostics::new();
        let programs = parse_line_programs(&section(program(5, 14, &ops())), ByteOrder::Little, &mut diags);
        assert!(programs.is_empty());
        assert_eq!(diags.warning_count(), 1);
    }
    #[test]
    fn test_huge_header_length_skips_unit()
    {
        // DWARF64 unit whose header_length is all ones
        let mut body = 3u16.to_le_bytes().to_vec();
        body.extend_from_slice(&u64::MAX.to_le_bytes());
        body.extend_from_slice(&[0; 8]);
        let mut data = vec![0xff; 4];
        data.extend_from_slice(&(body.len() as u64).to_le_bytes());
        data.extend(body);
        data.extend(program(2, 14, &ops()));

        let mut diags = Diagnostics::new();
        let programs = parse_line_programs(&section(data), ByteOrder::Little, &mut diags);
        assert!(diags.mentions("runs past the unit"));
        assert!(!diags.has_fatal());
        assert_eq!(programs.len(), 1);
        assert_eq!(programs[0].header.format, Format::Dwarf32);
        assert_eq!(programs[0].rows.len(), 3);
    }
}
