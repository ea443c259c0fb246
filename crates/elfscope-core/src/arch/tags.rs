//! Dynamic tag names.
//!
//! Names are rendered without the `DT_` prefix, the way a dynamic section
//! listing shows them.

use object::elf::{EM_ALPHA, EM_IA_64, EM_MIPS, EM_PARISC, EM_PPC, EM_PPC64};

const LOOS: u32 = 0x6000_0000;
const HIOS: u32 = 0x6fff_ffff;
const LOPROC: u32 = 0x7000_0000;
const HIPROC: u32 = 0x7fff_ffff;

/// Symbolic name of `d_tag` on `machine`.
///
/// Generic and GNU tags are checked first; the processor range is only
/// consulted for machines that define tags there.
pub fn dynamic_tag_name(machine: u16, tag: i64) -> Option<&'static str>
{
    let tag = u32::try_from(tag).ok()?;
    generic_tag_name(tag).or_else(|| match tag {
        LOOS..=HIOS if machine == EM_PARISC => hpux_tag_name(tag),
        LOPROC..=HIPROC => processor_tag_name(machine, tag),
        _ => None,
    })
}

fn generic_tag_name(tag: u32) -> Option<&'static str>
{
    let name = match tag {
        0 => "NULL",
        1 => "NEEDED",
        2 => "PLTRELSZ",
        3 => "PLTGOT",
        4 => "HASH",
        5 => "STRTAB",
        6 => "SYMTAB",
        7 => "RELA",
        8 => "RELASZ",
        9 => "RELAENT",
        10 => "STRSZ",
        11 => "SYMENT",
        12 => "INIT",
        13 => "FINI",
        14 => "SONAME",
        15 => "RPATH",
        16 => "SYMBOLIC",
        17 => "REL",
        18 => "RELSZ",
        19 => "RELENT",
        20 => "PLTREL",
        21 => "DEBUG",
        22 => "TEXTREL",
        23 => "JMPREL",
        24 => "BIND_NOW",
        25 => "INIT_ARRAY",
        26 => "FINI_ARRAY",
        27 => "INIT_ARRAYSZ",
        28 => "FINI_ARRAYSZ",
        29 => "RUNPATH",
        30 => "FLAGS",
        32 => "PREINIT_ARRAY",
        33 => "PREINIT_ARRAYSZ",
        34 => "SYMTAB_SHNDX",
        35 => "RELRSZ",
        36 => "RELR",
        37 => "RELRENT",

        0x6fff_fdf5 => "GNU_PRELINKED",
        0x6fff_fdf6 => "GNU_CONFLICTSZ",
        0x6fff_fdf7 => "GNU_LIBLISTSZ",
        0x6fff_fdf8 => "CHECKSUM",
        0x6fff_fdf9 => "PLTPADSZ",
        0x6fff_fdfa => "MOVEENT",
        0x6fff_fdfb => "MOVESZ",
        0x6fff_fdfc => "FEATURE",
        0x6fff_fdfd => "POSFLAG_1",
        0x6fff_fdfe => "SYMINSZ",
        0x6fff_fdff => "SYMINENT",
        0x6fff_fef5 => "GNU_HASH",
        0x6fff_fef6 => "TLSDESC_PLT",
        0x6fff_fef7 => "TLSDESC_GOT",
        0x6fff_fef8 => "GNU_CONFLICT",
        0x6fff_fef9 => "GNU_LIBLIST",
        0x6fff_fefa => "CONFIG",
        0x6fff_fefb => "DEPAUDIT",
        0x6fff_fefc => "AUDIT",
        0x6fff_fefd => "PLTPAD",
        0x6fff_fefe => "MOVETAB",
        0x6fff_feff => "SYMINFO",
        0x6fff_fff0 => "VERSYM",
        0x6fff_fff9 => "RELACOUNT",
        0x6fff_fffa => "RELCOUNT",
        0x6fff_fffb => "FLAGS_1",
        0x6fff_fffc => "VERDEF",
        0x6fff_fffd => "VERDEFNUM",
        0x6fff_fffe => "VERNEED",
        0x6fff_ffff => "VERNEEDNUM",

        0x7fff_fffd => "AUXILIARY",
        0x7fff_fffe => "USED",
        0x7fff_ffff => "FILTER",
        _ => return None,
    };
    Some(name)
}

fn processor_tag_name(machine: u16, tag: u32) -> Option<&'static str>
{
    let name = match (machine, tag - LOPROC) {
        (EM_MIPS, 0x01) => "MIPS_RLD_VERSION",
        (EM_MIPS, 0x02) => "MIPS_TIME_STAMP",
        (EM_MIPS, 0x03) => "MIPS_ICHECKSUM",
        (EM_MIPS, 0x04) => "MIPS_IVERSION",
        (EM_MIPS, 0x05) => "MIPS_FLAGS",
        (EM_MIPS, 0x06) => "MIPS_BASE_ADDRESS",
        (EM_MIPS, 0x08) => "MIPS_CONFLICT",
        (EM_MIPS, 0x09) => "MIPS_LIBLIST",
        (EM_MIPS, 0x0a) => "MIPS_LOCAL_GOTNO",
        (EM_MIPS, 0x0b) => "MIPS_CONFLICTNO",
        (EM_MIPS, 0x10) => "MIPS_LIBLISTNO",
        (EM_MIPS, 0x11) => "MIPS_SYMTABNO",
        (EM_MIPS, 0x12) => "MIPS_UNREFEXTNO",
        (EM_MIPS, 0x13) => "MIPS_GOTSYM",
        (EM_MIPS, 0x14) => "MIPS_HIPAGENO",
        (EM_MIPS, 0x16) => "MIPS_RLD_MAP",
        (EM_MIPS, 0x35) => "MIPS_RLD_MAP_REL",
        (EM_PPC, 0x00) => "PPC_GOT",
        (EM_PPC, 0x01) => "PPC_OPT",
        (EM_PPC64, 0x00) => "PPC64_GLINK",
        (EM_PPC64, 0x01) => "PPC64_OPD",
        (EM_PPC64, 0x02) => "PPC64_OPDSZ",
        (EM_PPC64, 0x03) => "PPC64_OPT",
        (EM_IA_64, 0x00) => "IA_64_PLT_RESERVE",
        (EM_ALPHA, 0x00) => "ALPHA_PLTRO",
        _ => return None,
    };
    Some(name)
}

// HP-UX puts its tags at the bottom of the OS range.
fn hpux_tag_name(tag: u32) -> Option<&'static str>
{
    let name = match tag - LOOS {
        0x00 => "HP_LOAD_MAP",
        0x01 => "HP_DLD_FLAGS",
        0x02 => "HP_DLD_HOOK",
        0x03 => "HP_UX10_INIT",
        0x04 => "HP_UX10_INITSZ",
        0x05 => "HP_PREINIT",
        0x06 => "HP_PREINITSZ",
        0x07 => "HP_NEEDED",
        0x08 => "HP_TIME_STAMP",
        0x09 => "HP_CHECKSUM",
        0x0a => "HP_GST_SIZE",
        0x0b => "HP_GST_VERSION",
        0x0c => "HP_GST_HASHVAL",
        0x0d => "HP_EPLTREL",
        0x0e => "HP_EPLTRELSZ",
        0x0f => "HP_FILTERED",
        0x10 => "HP_FILTER_TLS",
        0x11 => "HP_COMPAT_FILTERED",
        0x12 => "HP_LAZYLOAD",
        0x13 => "HP_BIND_NOW_COUNT",
        0x14 => "PLT",
        0x15 => "PLT_SIZE",
        0x16 => "DLT",
        0x17 => "DLT_SIZE",
        _ => return None,
    };
    Some(name)
}
