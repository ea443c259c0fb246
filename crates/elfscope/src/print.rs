//! Plain-text rendering of a [`DecodeReport`], loosely following readelf's layout.

use std::io::{self, Write};

use elfscope_core::arch::{
    dynamic_tag_name, file_type_name, machine_name, osabi_name, relocation_type_name, section_type_name,
    segment_type_name, symbol_binding_name, symbol_type_name, symbol_visibility_name,
};
use elfscope_core::dwarf::{FrameRecord, ListEntry, MacroEntry, ResolvedList};
use elfscope_core::elf::dynamic::{dt_flags_1_names, dt_flags_names};
use elfscope_core::elf::notes::note_type_name;
use elfscope_core::elf::section::section_flag_letters;
use elfscope_core::elf::{SymbolRef, SymbolTable};
use elfscope_core::reader::ByteOrder;
use elfscope_core::{DebugReport, DecodeReport, DumpRequest, UnwindReport};

const DT_NEEDED: i64 = 1;
const DT_SONAME: i64 = 14;
const DT_RPATH: i64 = 15;
const DT_RUNPATH: i64 = 29;
const DT_FLAGS: i64 = 30;
const DT_FLAGS_1: i64 = 0x6fff_fffb;

pub fn report(out: &mut impl Write, report: &DecodeReport, show_header: bool, request: &DumpRequest) -> io::Result<()>
{
    if show_header {
        file_header(out, report)?;
    }
    if request.section_headers {
        sections(out, report)?;
    }
    if request.section_groups {
        groups(out, report)?;
    }
    if request.program_headers {
        segments(out, report)?;
    }
    if request.dynamic {
        dynamic(out, report)?;
    }
    if request.relocations {
        relocations(out, report)?;
    }
    if request.symbols || request.dyn_syms {
        for table in &report.symbols {
            symbols(out, report, table)?;
        }
    }
    if request.version_info {
        versions(out, report)?;
    }
    if request.notes {
        notes(out, report)?;
    }
    if let Some(unwind) = &report.unwind {
        unwind_tables(out, unwind)?;
    }
    if let Some(debug) = &report.debug {
        debug_info(out, debug)?;
    }
    Ok(())
}

fn file_header(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    let h = &report.header;
    writeln!(out, "ELF Header:")?;
    writeln!(out, "  Class:                             {}", if h.is_64() { "ELF64" } else { "ELF32" })?;
    let data = match h.order {
        ByteOrder::Little => "2's complement, little endian",
        ByteOrder::Big => "2's complement, big endian",
    };
    writeln!(out, "  Data:                              {data}")?;
    writeln!(out, "  Version:                           {}", h.ident_version)?;
    writeln!(out, "  OS/ABI:                            {}", osabi_name(h.os_abi))?;
    writeln!(out, "  ABI Version:                       {}", h.abi_version)?;
    writeln!(out, "  Type:                              {}", file_type_name(h.file_type))?;
    writeln!(out, "  Machine:                           {}", machine_name(h.machine))?;
    writeln!(out, "  Entry point address:               0x{:x}", h.entry)?;
    writeln!(out, "  Start of program headers:          {} (bytes into file)", h.phoff)?;
    writeln!(out, "  Start of section headers:          {} (bytes into file)", h.shoff)?;
    writeln!(out, "  Flags:                             0x{:x}", h.flags)?;
    writeln!(out, "  Number of program headers:         {}", h.phnum)?;
    writeln!(out, "  Number of section headers:         {}", h.shnum)?;
    writeln!(out, "  Section header string table index: {}", h.shstrndx)
}

fn sections(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    let machine = report.header.machine;
    writeln!(out, "\nSection Headers:")?;
    writeln!(out, "  [Nr] Name                 Type             Address          Off      Size     ES Flg Lk Inf Al")?;
    for s in &report.sections {
        let kind = section_type_name(machine, s.sh_type).map_or_else(|| format!("0x{:x}", s.sh_type), str::to_owned);
        writeln!(
            out,
            "  [{:2}] {:<20} {:<16} {:016x} {:08x} {:08x} {:02x} {:>3} {:2} {:3} {:2}",
            s.index,
            s.name,
            kind,
            s.addr,
            s.offset,
            s.size,
            s.entsize,
            section_flag_letters(s.flags),
            s.link,
            s.info,
            s.addralign
        )?;
    }
    Ok(())
}

fn groups(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    if report.groups.is_empty() {
        return writeln!(out, "\nThere are no section groups in this file.");
    }
    for group in &report.groups {
        let kind = if group.is_comdat() { "COMDAT" } else { "" };
        writeln!(out, "\n{kind} group section [{:5}] `{}' contains {} sections:", group.section, group.signature, group.members.len())?;
        for &member in &group.members {
            let name = report.sections.get(member).map_or("", |s| s.name.as_str());
            writeln!(out, "   [{member:5}]   {name}")?;
        }
    }
    Ok(())
}

fn segments(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    if report.segments.is_empty() {
        return writeln!(out, "\nThere are no program headers in this file.");
    }
    let machine = report.header.machine;
    writeln!(out, "\nProgram Headers:")?;
    writeln!(out, "  Type           Offset   VirtAddr           PhysAddr           FileSiz  MemSiz   Flg Align")?;
    for p in &report.segments {
        let kind = segment_type_name(machine, p.p_type).map_or_else(|| format!("0x{:x}", p.p_type), str::to_owned);
        writeln!(
            out,
            "  {:<14} 0x{:06x} 0x{:016x} 0x{:016x} 0x{:06x} 0x{:06x} {} 0x{:x}",
            kind,
            p.offset,
            p.vaddr,
            p.paddr,
            p.filesz,
            p.memsz,
            p.flag_letters(),
            p.align
        )?;
    }
    writeln!(out, "\n Section to Segment mapping:")?;
    for mapping in &report.segment_sections {
        let names: Vec<&str> = mapping
            .sections
            .iter()
            .filter_map(|&index| report.sections.get(index).map(|s| s.name.as_str()))
            .collect();
        writeln!(out, "  {:02}     {}", mapping.segment, names.join(" "))?;
    }
    Ok(())
}

fn dynamic(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    let Some(table) = &report.dynamic else {
        return writeln!(out, "\nThere is no dynamic section in this file.");
    };
    let machine = report.header.machine;
    writeln!(out, "\nDynamic section at offset 0x{:x} contains {} entries:", table.offset, table.entries.len())?;
    writeln!(out, "  Tag        Type                         Name/Value")?;
    for entry in &table.entries {
        let name = dynamic_tag_name(machine, entry.tag).map_or_else(|| format!("<unknown>: {:x}", entry.tag), |n| format!("({n})"));
        let value = match entry.tag {
            DT_NEEDED => format!("Shared library: [{}]", report.dynamic_strings.name(entry.value)),
            DT_SONAME => format!("Library soname: [{}]", report.dynamic_strings.name(entry.value)),
            DT_RPATH => format!("Library rpath: [{}]", report.dynamic_strings.name(entry.value)),
            DT_RUNPATH => format!("Library runpath: [{}]", report.dynamic_strings.name(entry.value)),
            DT_FLAGS => dt_flags_names(entry.value).join(" "),
            DT_FLAGS_1 => format!("Flags: {}", dt_flags_1_names(entry.value).join(" ")),
            _ => format!("0x{:x}", entry.value),
        };
        writeln!(out, " 0x{:016x} {:<28} {}", entry.tag, name, value)?;
    }
    if !table.terminated {
        writeln!(out, "  (no DT_NULL terminator)")?;
    }
    Ok(())
}

fn relocations(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    if report.relocations.is_empty() {
        return writeln!(out, "\nThere are no relocations in this file.");
    }
    let machine = report.header.machine;
    for table in &report.relocations {
        writeln!(
            out,
            "\nRelocation section '{}' at offset 0x{:x} contains {} entries:",
            table.name,
            table.offset,
            table.entries.len()
        )?;
        writeln!(out, "  Offset          Info           Type               Sym. Value    Sym. Name + Addend")?;
        for entry in &table.entries {
            let r = &entry.relocation;
            let kind = relocation_type_name(machine, r.r_type).map_or_else(|| format!("unrecognized: {:x}", r.r_type), str::to_owned);
            let symbol = match &entry.symbol {
                SymbolRef::None => String::new(),
                SymbolRef::Symbol { name, value, .. } => format!("{value:016x} {name}"),
                SymbolRef::OutOfRange { index, .. } => format!("<corrupt symbol index {index}>"),
            };
            let addend = r.addend.map(|a| if a < 0 { format!(" - {:x}", a.unsigned_abs()) } else { format!(" + {a:x}") });
            writeln!(out, "{:012x}  {:012x} {:<18} {}{}", r.offset, r.info, kind, symbol, addend.unwrap_or_default())?;
        }
    }
    Ok(())
}

fn symbols(out: &mut impl Write, report: &DecodeReport, table: &SymbolTable) -> io::Result<()>
{
    let name = table
        .section
        .and_then(|index| report.sections.get(index))
        .map_or(if table.dynamic { "DT_SYMTAB" } else { ".symtab" }, |s| s.name.as_str());
    writeln!(out, "\nSymbol table '{}' contains {} entries:", name, table.len())?;
    writeln!(out, "   Num:    Value          Size Type    Bind   Vis      Ndx Name")?;
    for symbol in &table.symbols {
        let version = if table.dynamic {
            report
                .versions
                .as_ref()
                .and_then(|v| v.label(symbol.index, symbol.is_defined()))
                .map(|label| label.suffix(symbol.is_defined()))
                .unwrap_or_default()
        } else {
            String::new()
        };
        writeln!(
            out,
            "{:6}: {:016x} {:5} {:<7} {:<6} {:<8} {:>3} {}{}",
            symbol.index,
            symbol.value,
            symbol.size,
            symbol_type_name(symbol.kind()),
            symbol_binding_name(symbol.binding()),
            symbol_visibility_name(symbol.visibility()),
            symbol.shndx.label(),
            symbol.name.display_name(),
            version
        )?;
    }
    Ok(())
}

fn versions(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    let Some(info) = report.versions.as_ref().filter(|info| !info.is_empty()) else {
        return writeln!(out, "\nNo version information found in this file.");
    };
    if !info.definitions.is_empty() {
        writeln!(out, "\nVersion definition section contains {} entries:", info.definitions.len())?;
        for def in &info.definitions {
            writeln!(
                out,
                "  0x{:04x}: Rev: {}  Flags: 0x{:x}  Index: {}  Cnt: {}  Name: {}",
                def.offset,
                def.version,
                def.flags,
                def.index,
                def.count,
                def.name().unwrap_or("<none>")
            )?;
        }
    }
    if !info.requirements.is_empty() {
        writeln!(out, "\nVersion needs section contains {} entries:", info.requirements.len())?;
        for need in &info.requirements {
            writeln!(out, "  0x{:04x}: Version: {}  File: {}  Cnt: {}", need.offset, need.version, need.file, need.count)?;
            for aux in &need.aux {
                writeln!(out, "  0x{:04x}:   Name: {}  Flags: 0x{:x}  Version: {}", aux.offset, aux.name, aux.flags, aux.index)?;
            }
        }
    }
    Ok(())
}

fn notes(out: &mut impl Write, report: &DecodeReport) -> io::Result<()>
{
    for (source, notes) in &report.notes {
        writeln!(out, "\nDisplaying notes found in: {source}")?;
        writeln!(out, "  Owner                Data size \tDescription")?;
        for note in notes {
            let kind = note_type_name(&note.owner, note.n_type, report.header.file_type)
                .map_or_else(|| format!("Unknown note type: (0x{:08x})", note.n_type), str::to_owned);
            writeln!(out, "  {:<20} 0x{:08x}\t{}", note.owner, note.descriptor.len(), kind)?;
            if let Some(id) = note.build_id() {
                writeln!(out, "    Build ID: {id}")?;
            }
            if let Some((os, major, minor, patch)) = note.abi_tag(report.header.order) {
                writeln!(out, "    OS: {os}, ABI: {major}.{minor}.{patch}")?;
            }
        }
    }
    Ok(())
}

fn unwind_tables(out: &mut impl Write, unwind: &UnwindReport) -> io::Result<()>
{
    if unwind.ia64.is_empty() && unwind.hppa.is_empty() {
        return writeln!(out, "\nThere are no unwind sections in this file.");
    }
    for table in &unwind.ia64 {
        writeln!(out, "\nUnwind section '{}' contains {} entries:", table.section, table.entries.len())?;
        for entry in &table.entries {
            let function = entry.function.as_ref().map_or_else(String::new, |f| format!("<{}+{:x}>", f.name, f.distance));
            writeln!(out, "\n{function}: [0x{:x}-0x{:x}], info at +0x{:x}", entry.start.address, entry.end.address, entry.info.address)?;
            if let Some(info) = &entry.info_block {
                writeln!(
                    out,
                    "  v{}, flags=0x{:x}{}{}, len={} bytes",
                    info.version,
                    info.flags,
                    if info.has_exception_handler() { " (ehandler)" } else { "" },
                    if info.has_unwind_handler() { " (uhandler)" } else { "" },
                    info.descriptors.len()
                )?;
            }
        }
    }
    for table in &unwind.hppa {
        writeln!(out, "\nUnwind section '{}' contains {} entries:", table.section, table.entries.len())?;
        for entry in &table.entries {
            let function = entry.function.as_ref().map_or_else(String::new, |f| format!("<{}+{:x}>", f.name, f.distance));
            writeln!(
                out,
                "{function}: [0x{:x}-0x{:x}]\n\tTotal_frame_size={} save_rp={} cannot_unwind={}",
                entry.start.address, entry.end.address, entry.flags.total_frame_size, entry.flags.save_rp, entry.flags.cannot_unwind
            )?;
        }
    }
    Ok(())
}

fn lists(out: &mut impl Write, title: &str, lists: &[ResolvedList]) -> io::Result<()>
{
    writeln!(out, "\n{title}:")?;
    writeln!(out, "    Offset   Begin            End              Expression")?;
    for list in lists {
        for entry in &list.entries {
            match entry {
                ListEntry::Location { offset, begin, end, expression, .. } => {
                    let text = expression.as_ref().map_or_else(|| "<corrupt>".to_owned(), ToString::to_string);
                    writeln!(out, "    {offset:08x} {begin:016x} {end:016x} ({text})")?;
                }
                ListEntry::Range { offset, begin, end } => writeln!(out, "    {offset:08x} {begin:016x} {end:016x}")?,
                ListEntry::BaseAddress { offset, address } => {
                    writeln!(out, "    {offset:08x} {address:016x} (base address)")?;
                }
            }
        }
        writeln!(out, "    {:08x} <End of list>", list.end)?;
    }
    Ok(())
}

fn frames(out: &mut impl Write, section: &str, records: &[FrameRecord]) -> io::Result<()>
{
    writeln!(out, "\nContents of the {section} section:\n")?;
    for record in records {
        match record {
            FrameRecord::Cie(cie) => {
                writeln!(out, "{:08x} {:016x} CIE", cie.offset, cie.length)?;
                writeln!(out, "  Version:               {}", cie.version)?;
                writeln!(out, "  Augmentation:          \"{}\"", cie.augmentation)?;
                writeln!(out, "  Code alignment factor: {}", cie.code_alignment)?;
                writeln!(out, "  Data alignment factor: {}", cie.data_alignment)?;
                writeln!(out, "  Return address column: {}\n", cie.return_address_register)?;
            }
            FrameRecord::Fde { fde, rows } => {
                writeln!(
                    out,
                    "{:08x} {:016x} FDE cie={:08x} pc={:016x}..{:016x}",
                    fde.offset,
                    fde.length,
                    fde.cie_offset,
                    fde.initial_location,
                    fde.initial_location.wrapping_add(fde.address_range)
                )?;
                for row in rows {
                    let columns: Vec<String> = row
                        .registers
                        .iter()
                        .enumerate()
                        .map(|(reg, rule)| (reg, rule.to_string()))
                        .filter(|(_, rule)| !rule.is_empty())
                        .map(|(reg, rule)| format!("r{reg}={rule}"))
                        .collect();
                    writeln!(out, "  {:016x} {:<10} {}", row.location, row.cfa.to_string(), columns.join(" "))?;
                }
                writeln!(out)?;
            }
            FrameRecord::Terminator { offset } => writeln!(out, "{offset:08x} ZERO terminator\n")?,
        }
    }
    Ok(())
}

fn debug_info(out: &mut impl Write, debug: &DebugReport) -> io::Result<()>
{
    if let Some(info) = &debug.info {
        writeln!(out, "\nContents of the .debug_info section:\n")?;
        for unit in &info.units {
            let h = &unit.header;
            writeln!(out, "  Compilation Unit @ offset 0x{:x}:", h.offset)?;
            writeln!(out, "   Length:        0x{:x}", h.unit_length)?;
            writeln!(out, "   Version:       {}", h.version)?;
            writeln!(out, "   Abbrev Offset: 0x{:x}", h.abbrev_offset)?;
            writeln!(out, "   Pointer Size:  {}", h.address_size)?;
            for die in &unit.entries {
                writeln!(out, " <{}><{:x}>: Abbrev Number: {} ({})", die.depth, die.offset, die.code, die.tag)?;
                for attr in &die.attributes {
                    let value = match &attr.expression {
                        Some(expression) => format!("{} ({expression})", attr.value.describe(attr.name)),
                        None => attr.value.describe(attr.name),
                    };
                    writeln!(out, "    <{:x}>   {:<18}: {}", attr.offset, attr.name.to_string(), value)?;
                }
            }
        }
    }
    if !debug.abbreviations.is_empty() {
        writeln!(out, "\nContents of the .debug_abbrev section:\n")?;
        for (offset, table) in &debug.abbreviations {
            writeln!(out, "  Number TAG (0x{offset:x})")?;
            let mut abbrevs: Vec<_> = table.iter().collect();
            abbrevs.sort_by_key(|a| a.code);
            for abbrev in abbrevs {
                let children = if abbrev.has_children { "[has children]" } else { "[no children]" };
                writeln!(out, "   {}      {}    {}", abbrev.code, abbrev.tag, children)?;
                for spec in &abbrev.attributes {
                    writeln!(out, "    {:<18} {}", spec.name.to_string(), spec.form)?;
                }
            }
        }
    }
    for program in &debug.lines {
        writeln!(out, "\nLine number program @ offset 0x{:x} (version {}):", program.header.offset, program.header.version)?;
        for (index, file) in program.header.files.iter().enumerate() {
            writeln!(out, "  File {}: {} (dir {})", index + 1, file.name, file.directory)?;
        }
        writeln!(out, "  Address            Line   Column  Stmt")?;
        for row in &program.rows {
            let end = if row.end_sequence { " end_sequence" } else { "" };
            writeln!(out, "  0x{:016x} {:6} {:7}  {}{}", row.address, row.line, row.column, row.is_stmt, end)?;
        }
    }
    if !debug.debug_frame.is_empty() {
        frames(out, ".debug_frame", &debug.debug_frame)?;
    }
    if !debug.eh_frame.is_empty() {
        frames(out, ".eh_frame", &debug.eh_frame)?;
    }
    for set in &debug.aranges {
        writeln!(out, "\nAddress ranges for unit at 0x{:x}:", set.info_offset)?;
        for (address, length) in &set.ranges {
            writeln!(out, "    {address:016x} {length:016x}")?;
        }
    }
    for (title, sets) in [("pubnames", &debug.pubnames), ("pubtypes", &debug.pubtypes)] {
        for set in sets {
            writeln!(out, "\nContents of the .debug_{title} set for unit at 0x{:x}:", set.info_offset)?;
            for name in &set.names {
                writeln!(out, "    {:<8x} {}", name.die_offset, name.name)?;
            }
        }
    }
    if !debug.strings.is_empty() {
        writeln!(out, "\nContents of the .debug_str section:\n")?;
        for (offset, text) in &debug.strings {
            writeln!(out, "  0x{offset:08x} {text}")?;
        }
    }
    if !debug.locations.is_empty() {
        lists(out, "Contents of the .debug_loc section", &debug.locations)?;
    }
    if !debug.ranges.is_empty() {
        lists(out, "Contents of the .debug_ranges section", &debug.ranges)?;
    }
    for list in &debug.macros {
        writeln!(out, "\nMacro list at offset 0x{:x}:", list.offset)?;
        for (offset, entry) in &list.entries {
            match entry {
                MacroEntry::Define { line, text } => writeln!(out, "  <{offset:x}> DW_MACINFO_define - lineno : {line} macro : {text}")?,
                MacroEntry::Undef { line, text } => writeln!(out, "  <{offset:x}> DW_MACINFO_undef - lineno : {line} macro : {text}")?,
                MacroEntry::StartFile { line, file } => {
                    writeln!(out, "  <{offset:x}> DW_MACINFO_start_file - lineno: {line} filenum: {file}")?;
                }
                MacroEntry::EndFile => writeln!(out, "  <{offset:x}> DW_MACINFO_end_file")?,
                MacroEntry::VendorExt { constant, text } => {
                    writeln!(out, "  <{offset:x}> DW_MACINFO_vendor_ext - constant : {constant} string : {text}")?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use elfscope_core::{decode, DecodeOptions};

    /// An x86-64 executable header with no sections or segments.
    fn bare_executable() -> Vec<u8>
    {
        let mut h = b"\x7fELF\x02\x01\x01".to_vec();
        h.resize(16, 0);
        h.extend_from_slice(&2u16.to_le_bytes());
        h.extend_from_slice(&62u16.to_le_bytes());
        h.extend_from_slice(&1u32.to_le_bytes());
        h.extend_from_slice(&0x40_1000u64.to_le_bytes());
        h.extend_from_slice(&[0; 16]);
        h.extend_from_slice(&0u32.to_le_bytes());
        h.extend_from_slice(&64u16.to_le_bytes());
        h.extend_from_slice(&56u16.to_le_bytes());
        h.extend_from_slice(&0u16.to_le_bytes());
        h.extend_from_slice(&64u16.to_le_bytes());
        h.extend_from_slice(&[0; 4]);
        h
    }

    fn render(show_header: bool, request: &DumpRequest) -> String
    {
        let data = bare_executable();
        let decoded = decode(&data, request, &DecodeOptions::default()).unwrap();
        let mut out = Vec::new();
        report(&mut out, &decoded, show_header, request).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_file_header()
    {
        let text = render(true, &DumpRequest::default());
        assert!(text.contains("ELF64"));
        assert!(text.contains("2's complement, little endian"));
        assert!(text.contains("EXEC (Executable file)"));
        assert!(text.contains("Advanced Micro Devices X86-64"));
        assert!(text.contains("Entry point address:               0x401000"));
    }

    #[test]
    fn test_missing_tables_are_announced()
    {
        let text = render(false, &DumpRequest::all());
        assert!(!text.contains("ELF Header:"));
        assert!(text.contains("There are no program headers in this file."));
        assert!(text.contains("There is no dynamic section in this file."));
        assert!(text.contains("There are no relocations in this file."));
        assert!(text.contains("No version information found in this file."));
        assert!(text.contains("There are no unwind sections in this file."));
    }
}
