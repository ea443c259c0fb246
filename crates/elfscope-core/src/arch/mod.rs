//! # Architecture Semantic Tables
//!
//! Pure lookups from raw numeric codes to symbolic names.
//!
//! Relocation types and processor-specific dynamic tags mean different things
//! on every machine, so each architecture family gets its own static table in
//! [`relocs`] and [`tags`]; dispatch is a single `match` on `e_machine`. A
//! `None` result means "unrecognised, render numerically".

pub mod relocs;
pub mod tags;

use object::elf::{
    EM_386, EM_68K, EM_AARCH64, EM_ALPHA, EM_ARM, EM_AVR, EM_BPF, EM_IA_64, EM_LOONGARCH, EM_M32R, EM_MIPS,
    EM_MSP430, EM_NONE, EM_PARISC, EM_PPC, EM_PPC64, EM_RISCV, EM_S390, EM_SH, EM_SPARC, EM_SPARC32PLUS,
    EM_SPARCV9, EM_X86_64, ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL, PT_DYNAMIC, PT_GNU_EH_FRAME,
    PT_GNU_RELRO, PT_GNU_STACK, PT_INTERP, PT_LOAD, PT_NOTE, PT_NULL, PT_PHDR, PT_SHLIB, PT_TLS, SHT_DYNAMIC,
    SHT_DYNSYM, SHT_FINI_ARRAY, SHT_GNU_ATTRIBUTES, SHT_GNU_HASH, SHT_GNU_VERDEF, SHT_GNU_VERNEED,
    SHT_GNU_VERSYM, SHT_GROUP, SHT_HASH, SHT_INIT_ARRAY, SHT_NOBITS, SHT_NOTE, SHT_NULL, SHT_PREINIT_ARRAY,
    SHT_PROGBITS, SHT_REL, SHT_RELA, SHT_SHLIB, SHT_STRTAB, SHT_SYMTAB, SHT_SYMTAB_SHNDX, STB_GLOBAL,
    STB_GNU_UNIQUE, STB_LOCAL, STB_WEAK, STT_COMMON, STT_FILE, STT_FUNC, STT_GNU_IFUNC, STT_NOTYPE, STT_OBJECT,
    STT_SECTION, STT_TLS, STV_DEFAULT, STV_HIDDEN, STV_INTERNAL,
};

pub use relocs::relocation_type_name;
pub use tags::dynamic_tag_name;

/// Which relocation record layout a table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelocationStyle
{
    /// `ElfN_Rel`, implicit addend
    Rel,
    /// `ElfN_Rela`, explicit addend
    Rela,
    /// Neither declared nor known for the machine.
    Unknown,
}

/// Default relocation layout of a machine, for tables that do not declare one.
///
/// Only consulted when nothing in the file says which layout is used (e.g. a
/// missing `DT_PLTREL`).
pub fn guess_relocation_style(machine: u16) -> RelocationStyle
{
    match machine {
        EM_386 | EM_ARM | EM_MIPS | EM_68K | EM_M32R | EM_BPF => RelocationStyle::Rel,
        EM_X86_64 | EM_AARCH64 | EM_ALPHA | EM_IA_64 | EM_PARISC | EM_PPC | EM_PPC64 | EM_RISCV | EM_S390
        | EM_SH | EM_SPARC | EM_SPARC32PLUS | EM_SPARCV9 | EM_LOONGARCH | EM_AVR | EM_MSP430 => RelocationStyle::Rela,
        _ => RelocationStyle::Unknown,
    }
}

/// Descriptive name of `e_machine`, with a numeric fallback.
pub fn machine_name(machine: u16) -> String
{
    let name = match machine {
        EM_NONE => "None",
        EM_SPARC => "Sparc",
        EM_386 => "Intel 80386",
        EM_68K => "MC68000",
        EM_MIPS => "MIPS R3000",
        EM_PARISC => "HPPA",
        EM_SPARC32PLUS => "Sparc v8+",
        EM_PPC => "PowerPC",
        EM_PPC64 => "PowerPC64",
        EM_S390 => "IBM S/390",
        EM_ARM => "ARM",
        EM_SH => "Renesas / SuperH SH",
        EM_SPARCV9 => "Sparc v9",
        EM_IA_64 => "Intel IA-64",
        EM_X86_64 => "Advanced Micro Devices X86-64",
        EM_AVR => "Atmel AVR 8-bit microcontroller",
        EM_MSP430 => "Texas Instruments msp430 microcontroller",
        EM_M32R => "Renesas M32R (formerly Mitsubishi M32r)",
        EM_AARCH64 => "AArch64",
        EM_BPF => "Linux BPF",
        EM_RISCV => "RISC-V",
        EM_LOONGARCH => "LoongArch",
        EM_ALPHA => "Alpha",
        other => return format!("<unknown>: 0x{other:x}"),
    };
    name.to_owned()
}

/// Name of `e_type`.
pub fn file_type_name(file_type: u16) -> String
{
    match file_type {
        ET_NONE => "NONE (None)".to_owned(),
        ET_REL => "REL (Relocatable file)".to_owned(),
        ET_EXEC => "EXEC (Executable file)".to_owned(),
        ET_DYN => "DYN (Shared object file)".to_owned(),
        ET_CORE => "CORE (Core file)".to_owned(),
        0xfe00..=0xfeff => format!("OS Specific: ({file_type:x})"),
        0xff00..=0xffff => format!("Processor Specific: ({file_type:x})"),
        _ => format!("<unknown>: {file_type:x}"),
    }
}

/// Name of `EI_OSABI`.
pub fn osabi_name(os_abi: u8) -> String
{
    let name = match os_abi {
        0 => "UNIX - System V",
        1 => "UNIX - HP-UX",
        2 => "UNIX - NetBSD",
        3 => "UNIX - GNU",
        6 => "UNIX - Solaris",
        7 => "UNIX - AIX",
        8 => "UNIX - IRIX",
        9 => "UNIX - FreeBSD",
        10 => "UNIX - TRU64",
        11 => "Novell - Modesto",
        12 => "UNIX - OpenBSD",
        13 => "VMS - OpenVMS",
        14 => "HP - Non-Stop Kernel",
        15 => "AROS",
        16 => "FenixOS",
        97 => "ARM",
        255 => "Standalone App",
        other => return format!("<unknown: {other:x}>"),
    };
    name.to_owned()
}

/// Name of `ELF_ST_TYPE`.
pub fn symbol_type_name(kind: u8) -> String
{
    let name = match kind {
        STT_NOTYPE => "NOTYPE",
        STT_OBJECT => "OBJECT",
        STT_FUNC => "FUNC",
        STT_SECTION => "SECTION",
        STT_FILE => "FILE",
        STT_COMMON => "COMMON",
        STT_TLS => "TLS",
        STT_GNU_IFUNC => "IFUNC",
        13..=15 => return format!("<processor specific>: {kind}"),
        other => return format!("<unknown>: {other}"),
    };
    name.to_owned()
}

/// Name of `ELF_ST_BIND`.
pub fn symbol_binding_name(binding: u8) -> String
{
    let name = match binding {
        STB_LOCAL => "LOCAL",
        STB_GLOBAL => "GLOBAL",
        STB_WEAK => "WEAK",
        STB_GNU_UNIQUE => "UNIQUE",
        13..=15 => return format!("<processor specific>: {binding}"),
        other => return format!("<unknown>: {other}"),
    };
    name.to_owned()
}

/// Name of `ELF_ST_VISIBILITY`.
pub fn symbol_visibility_name(visibility: u8) -> &'static str
{
    match visibility & 0x3 {
        STV_DEFAULT => "DEFAULT",
        STV_INTERNAL => "INTERNAL",
        STV_HIDDEN => "HIDDEN",
        _ => "PROTECTED",
    }
}

/// Name of a program header type; processor-specific values depend on `machine`.
pub fn segment_type_name(machine: u16, p_type: u32) -> Option<&'static str>
{
    let name = match p_type {
        PT_NULL => "NULL",
        PT_LOAD => "LOAD",
        PT_DYNAMIC => "DYNAMIC",
        PT_INTERP => "INTERP",
        PT_NOTE => "NOTE",
        PT_SHLIB => "SHLIB",
        PT_PHDR => "PHDR",
        PT_TLS => "TLS",
        PT_GNU_EH_FRAME => "GNU_EH_FRAME",
        PT_GNU_STACK => "GNU_STACK",
        PT_GNU_RELRO => "GNU_RELRO",
        0x6474_e553 => "GNU_PROPERTY",
        0x6474_e554 => "GNU_SFRAME",
        0x7000_0000..=0x7fff_ffff => return processor_segment_type_name(machine, p_type),
        _ => return None,
    };
    Some(name)
}

fn processor_segment_type_name(machine: u16, p_type: u32) -> Option<&'static str>
{
    let name = match (machine, p_type) {
        (EM_ARM, 0x7000_0001) => "EXIDX",
        (EM_AARCH64, 0x7000_0000) => "AARCH64_ARCHEXT",
        (EM_AARCH64, 0x7000_0001) => "AARCH64_UNWIND",
        (EM_AARCH64, 0x7000_0002) => "AARCH64_MEMTAG_MTE",
        (EM_MIPS, 0x7000_0000) => "REGINFO",
        (EM_MIPS, 0x7000_0001) => "RTPROC",
        (EM_MIPS, 0x7000_0002) => "OPTIONS",
        (EM_MIPS, 0x7000_0003) => "ABIFLAGS",
        (EM_PARISC, 0x7000_0000) => "PARISC_ARCHEXT",
        (EM_PARISC, 0x7000_0001) => "PARISC_UNWIND",
        (EM_IA_64, 0x7000_0000) => "IA_64_ARCHEXT",
        (EM_IA_64, 0x7000_0001) => "IA_64_UNWIND",
        (EM_RISCV, 0x7000_0003) => "RISCV_ATTRIBUTES",
        (EM_S390, 0x7000_0000) => "S390_PGSTE",
        _ => return None,
    };
    Some(name)
}

/// Name of a section header type; processor-specific values depend on `machine`.
pub fn section_type_name(machine: u16, sh_type: u32) -> Option<&'static str>
{
    let name = match sh_type {
        SHT_NULL => "NULL",
        SHT_PROGBITS => "PROGBITS",
        SHT_SYMTAB => "SYMTAB",
        SHT_STRTAB => "STRTAB",
        SHT_RELA => "RELA",
        SHT_HASH => "HASH",
        SHT_DYNAMIC => "DYNAMIC",
        SHT_NOTE => "NOTE",
        SHT_NOBITS => "NOBITS",
        SHT_REL => "REL",
        SHT_SHLIB => "SHLIB",
        SHT_DYNSYM => "DYNSYM",
        SHT_INIT_ARRAY => "INIT_ARRAY",
        SHT_FINI_ARRAY => "FINI_ARRAY",
        SHT_PREINIT_ARRAY => "PREINIT_ARRAY",
        SHT_GROUP => "GROUP",
        SHT_SYMTAB_SHNDX => "SYMTAB SECTION INDICES",
        0x13 => "RELR",
        SHT_GNU_ATTRIBUTES => "GNU_ATTRIBUTES",
        SHT_GNU_HASH => "GNU_HASH",
        0x6fff_fff7 => "GNU_LIBLIST",
        SHT_GNU_VERDEF => "VERDEF",
        SHT_GNU_VERNEED => "VERNEED",
        SHT_GNU_VERSYM => "VERSYM",
        0x6fff_4c00 => "LLVM_ODRTAB",
        0x7000_0000..=0x7fff_ffff => return processor_section_type_name(machine, sh_type),
        _ => return None,
    };
    Some(name)
}

fn processor_section_type_name(machine: u16, sh_type: u32) -> Option<&'static str>
{
    let name = match (machine, sh_type) {
        (EM_X86_64, 0x7000_0001) => "X86_64_UNWIND",
        (EM_ARM, 0x7000_0001) => "ARM_EXIDX",
        (EM_ARM, 0x7000_0002) => "ARM_PREEMPTMAP",
        (EM_ARM, 0x7000_0003) => "ARM_ATTRIBUTES",
        (EM_ARM, 0x7000_0004) => "ARM_DEBUGOVERLAY",
        (EM_ARM, 0x7000_0005) => "ARM_OVERLAYSECTION",
        (EM_AARCH64, 0x7000_0003) => "AARCH64_ATTRIBUTES",
        (EM_MIPS, 0x7000_0000) => "MIPS_LIBLIST",
        (EM_MIPS, 0x7000_0002) => "MIPS_CONFLICT",
        (EM_MIPS, 0x7000_0003) => "MIPS_GPTAB",
        (EM_MIPS, 0x7000_0006) => "MIPS_REGINFO",
        (EM_MIPS, 0x7000_000d) => "MIPS_OPTIONS",
        (EM_MIPS, 0x7000_001e) => "MIPS_DWARF",
        (EM_MIPS, 0x7000_002a) => "MIPS_ABIFLAGS",
        (EM_PARISC, 0x7000_0000) => "PARISC_EXT",
        (EM_PARISC, 0x7000_0001) => "PARISC_UNWIND",
        (EM_PARISC, 0x7000_0002) => "PARISC_DOC",
        (EM_IA_64, 0x7000_0000) => "IA_64_EXT",
        (EM_IA_64, 0x7000_0001) => "IA_64_UNWIND",
        (EM_RISCV, 0x7000_0003) => "RISCV_ATTRIBUTES",
        (EM_PPC, 0x7000_0001) => "PPC_ATTRIBUTES",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_guess_relocation_style()
    {
        assert_eq!(guess_relocation_style(EM_386), RelocationStyle::Rel);
        assert_eq!(guess_relocation_style(EM_X86_64), RelocationStyle::Rela);
        assert_eq!(guess_relocation_style(EM_AARCH64), RelocationStyle::Rela);
        assert_eq!(guess_relocation_style(0xbeef), RelocationStyle::Unknown);
    }

    #[test]
    fn test_processor_specific_types_depend_on_machine()
    {
        assert_eq!(section_type_name(EM_IA_64, 0x7000_0001), Some("IA_64_UNWIND"));
        assert_eq!(section_type_name(EM_PARISC, 0x7000_0001), Some("PARISC_UNWIND"));
        assert_eq!(section_type_name(EM_386, 0x7000_0001), None);
        assert_eq!(segment_type_name(EM_ARM, 0x7000_0001), Some("EXIDX"));
        assert_eq!(segment_type_name(EM_X86_64, PT_LOAD), Some("LOAD"));
    }

    #[test]
    fn test_symbol_attribute_names()
    {
        assert_eq!(symbol_type_name(STT_FUNC), "FUNC");
        assert_eq!(symbol_type_name(10), "IFUNC");
        assert_eq!(symbol_binding_name(STB_WEAK), "WEAK");
        assert_eq!(symbol_binding_name(7), "<unknown>: 7");
        assert_eq!(symbol_visibility_name(STV_HIDDEN), "HIDDEN");
    }

    #[test]
    fn test_machine_name_fallback()
    {
        assert_eq!(machine_name(EM_X86_64), "Advanced Micro Devices X86-64");
        assert_eq!(machine_name(0x4242), "<unknown>: 0x4242");
    }
}
