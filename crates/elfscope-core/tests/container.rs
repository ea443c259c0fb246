//! Tests for the ELF container model over hand-built images

mod common;

use common::*;
use elfscope_core::elf::SymbolRef;
use elfscope_core::{Container, DecodeOptions, ElfError};

fn open(data: &Vec<u8>) -> Container<'_>
{
    Container::open(data, DecodeOptions::default()).unwrap()
}

#[test]
fn test_map_address_through_load_segment()
{
    let mut builder = ElfBuilder::new(ET_EXEC, EM_X86_64);
    builder.segment(TestSegment {
        p_type: PT_LOAD,
        flags: 5,
        offset: 0x200,
        vaddr: 0x1000,
        filesz: 0x1000,
        memsz: 0x1000,
        align: 0x1000,
    });
    let data = builder.build();
    let container = open(&data);

    assert_eq!(container.segments().len(), 1);
    assert_eq!(container.map_address_to_offset(0x1500, 4), 0x700);
    assert!(container.take_diagnostics().is_empty());
}

#[test]
fn test_unmapped_address_falls_back_with_warning()
{
    let mut builder = ElfBuilder::new(ET_EXEC, EM_X86_64);
    builder.segment(TestSegment {
        p_type: PT_LOAD,
        offset: 0x200,
        vaddr: 0x1000,
        filesz: 0x100,
        memsz: 0x100,
        align: 0x1000,
        ..TestSegment::default()
    });
    let data = builder.build();
    let container = open(&data);

    assert_eq!(container.map_address_to_offset(0x9000, 8), 0x9000);
    assert!(container.take_diagnostics().mentions("not in any loadable segment"));
}

#[test]
fn test_extended_section_count()
{
    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    builder.section(TestSection::new(".text", SHT_PROGBITS, vec![0x90; 16]));
    builder.section(TestSection::new(".data", SHT_PROGBITS, vec![1, 2, 3, 4]));
    // two sections plus section 0 and .shstrtab
    builder.shnum_override = Some(0);
    builder.first_section_size = 4;
    let data = builder.build();
    let container = open(&data);

    assert_eq!(container.sections().len(), 4);
    let text = container.section_by_name(".text").unwrap();
    assert_eq!(container.section_data(text).unwrap(), vec![0x90; 16]);
    assert_eq!(container.section_name(2), ".data");
}

#[test]
fn test_bad_magic_is_rejected()
{
    let mut data = ElfBuilder::new(ET_REL, EM_X86_64).build();
    data[3] = b'X';
    let err = Container::open(&data, DecodeOptions::default()).err().unwrap();
    assert!(matches!(err, ElfError::MalformedMagic(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_truncated_section_table_is_a_diagnostic()
{
    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    builder.section(TestSection::new(".text", SHT_PROGBITS, vec![0xc3]));
    let mut data = builder.build();
    // cut into the last section header
    data.truncate(data.len() - 10);
    let container = open(&data);

    assert!(container.sections().is_empty());
    assert!(container.take_diagnostics().has_fatal());
}

#[test]
fn test_out_of_range_relocation_symbol()
{
    let (strtab, names) = string_table(&["main"]);
    let mut symtab = symbol(0, 0, 0, 0, 0);
    symtab.extend(symbol(names[0], 0x12, 1, 0x10, 4));
    let mut relocations = rela(0x4, 1, 2, -4);
    relocations.extend(rela(0x8, 9, 2, 0));

    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    let text = builder.section(TestSection {
        flags: SHF_ALLOC | SHF_EXECINSTR,
        ..TestSection::new(".text", SHT_PROGBITS, vec![0x90; 16])
    });
    let strings = builder.section(TestSection::new(".strtab", SHT_STRTAB, strtab));
    let symbols = builder.section(TestSection {
        link: strings as u32,
        info: 1,
        align: 8,
        entsize: 24,
        ..TestSection::new(".symtab", SHT_SYMTAB, symtab)
    });
    builder.section(TestSection {
        link: symbols as u32,
        info: text as u32,
        align: 8,
        entsize: 24,
        ..TestSection::new(".rela.text", SHT_RELA, relocations)
    });
    let data = builder.build();
    let container = open(&data);

    let tables = container.relocation_sections();
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.name, ".rela.text");
    assert_eq!(table.target, Some(text));
    assert_eq!(table.entries.len(), 2);

    assert_eq!(table.entries[0].relocation.addend, Some(-4));
    match &table.entries[0].symbol {
        SymbolRef::Symbol { name, value, .. } => {
            assert_eq!(name, "main");
            assert_eq!(*value, 0x10);
        }
        other => panic!("unexpected symbol {other:?}"),
    }
    assert_eq!(table.entries[1].symbol, SymbolRef::OutOfRange { index: 9, limit: 2 });

    let diagnostics = container.take_diagnostics();
    assert!(diagnostics.mentions("relocation symbol"));
    assert!(!diagnostics.has_fatal());
}

#[test]
fn test_overlong_version_need_chain_terminates()
{
    let (strtab, names) = string_table(&["libc.so.6"]);
    let mut verneed = Vec::new();
    for _ in 0..2 {
        verneed.extend_from_slice(&1u16.to_le_bytes());
        verneed.extend_from_slice(&0u16.to_le_bytes());
        verneed.extend_from_slice(&names[0].to_le_bytes());
        verneed.extend_from_slice(&0u32.to_le_bytes());
        // every record claims a successor, the last one past the end
        verneed.extend_from_slice(&16u32.to_le_bytes());
    }

    let mut builder = ElfBuilder::new(ET_EXEC, EM_X86_64);
    let strings = builder.section(TestSection::new(".dynstr", SHT_STRTAB, strtab));
    builder.section(TestSection {
        link: strings as u32,
        info: u32::MAX,
        align: 8,
        ..TestSection::new(".gnu.version_r", SHT_GNU_VERNEED, verneed)
    });
    let data = builder.build();
    let container = open(&data);

    let info = container.version_info().unwrap();
    assert_eq!(info.requirements.len(), 2);
    assert!(info.requirements.iter().all(|need| need.file == "libc.so.6"));
    assert!(container.take_diagnostics().mentions("version need chain"));
}

#[test]
fn test_section_groups_validate_members()
{
    let (strtab, names) = string_table(&["inline_fn"]);
    let mut symtab = symbol(0, 0, 0, 0, 0);
    symtab.extend(symbol(names[0], 0x12, 1, 0, 8));
    let words = |values: &[u32]| values.iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<u8>>();

    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    let text = builder.section(TestSection::new(".text.inline_fn", SHT_PROGBITS, vec![0xc3; 8]));
    let strings = builder.section(TestSection::new(".strtab", SHT_STRTAB, strtab));
    let symbols = builder.section(TestSection {
        link: strings as u32,
        info: 1,
        align: 8,
        entsize: 24,
        ..TestSection::new(".symtab", SHT_SYMTAB, symtab)
    });
    for (name, members) in [(".group", words(&[1, text as u32, 99])), (".group.dup", words(&[0, text as u32]))] {
        builder.section(TestSection {
            link: symbols as u32,
            info: 1,
            align: 4,
            entsize: 4,
            ..TestSection::new(name, SHT_GROUP, members)
        });
    }
    let data = builder.build();
    let container = open(&data);

    let groups = container.section_groups();
    assert_eq!(groups.len(), 2);
    assert!(groups[0].is_comdat());
    assert_eq!(groups[0].signature, "inline_fn");
    assert_eq!(groups[0].members, vec![text]);
    assert!(!groups[1].is_comdat());
    assert!(groups[1].members.is_empty());

    let diagnostics = container.take_diagnostics();
    assert!(diagnostics.mentions("group member section"));
    assert!(diagnostics.mentions("already in group .group"));
}

#[test]
fn test_dynamic_strings_without_section_headers()
{
    let (dynstr, names) = string_table(&["libc.so.6"]);
    let mut builder = ElfBuilder::new(ET_EXEC, EM_X86_64);
    // header and two program headers put the first section at 176
    let base = 0x40_0000u64;
    builder.segment(TestSegment {
        p_type: PT_LOAD,
        flags: 4,
        vaddr: base,
        filesz: 0x1000,
        memsz: 0x1000,
        align: 0x1000,
        ..TestSegment::default()
    });
    builder.segment(TestSegment {
        p_type: PT_DYNAMIC,
        flags: 6,
        offset: 192,
        vaddr: base + 192,
        filesz: 64,
        memsz: 64,
        align: 8,
    });

    let mut dynamic = Vec::new();
    for (tag, value) in [(1u64, u64::from(names[0])), (5, base + 176), (10, dynstr.len() as u64), (0, 0)] {
        dynamic.extend_from_slice(&tag.to_le_bytes());
        dynamic.extend_from_slice(&value.to_le_bytes());
    }
    builder.section(TestSection::new(".blob", SHT_PROGBITS, dynstr));
    builder.section(TestSection::new(".blob.dyn", SHT_PROGBITS, dynamic));
    assert_eq!(builder.section_offset(1), 176);
    assert_eq!(builder.section_offset(2), 192);
    let data = builder.build();
    let container = open(&data);

    let table = container.dynamic().unwrap();
    assert!(table.terminated);
    assert_eq!(table.section, None);
    assert_eq!(table.entries.len(), 3);
    let strings = container.locate_dynamic_strings();
    assert_eq!(table.needed(&strings), vec!["libc.so.6".to_owned()]);
    assert!(container.locate_dynamic_symbols().unwrap().is_none());
}

#[test]
fn test_relocation_link_must_name_a_symbol_table()
{
    let (strtab, names) = string_table(&["main"]);
    let mut symtab = symbol(0, 0, 0, 0, 0);
    symtab.extend(symbol(names[0], 0x12, 1, 0x10, 4));

    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    let text = builder.section(TestSection {
        flags: SHF_ALLOC | SHF_EXECINSTR,
        ..TestSection::new(".text", SHT_PROGBITS, vec![0x90; 16])
    });
    let strings = builder.section(TestSection::new(".strtab", SHT_STRTAB, strtab));
    let symbols = builder.section(TestSection {
        link: strings as u32,
        info: 1,
        align: 8,
        entsize: 24,
        ..TestSection::new(".symtab", SHT_SYMTAB, symtab)
    });
    for (name, link) in [(".rela.text", symbols), (".rela.text.again", symbols), (".rela.text.bad", strings)] {
        builder.section(TestSection {
            link: link as u32,
            info: text as u32,
            align: 8,
            entsize: 24,
            ..TestSection::new(name, SHT_RELA, rela(0x4, 1, 2, -4))
        });
    }
    let data = builder.build();
    let container = open(&data);

    let tables = container.relocation_sections();
    assert_eq!(tables.len(), 3);
    for table in &tables[..2] {
        assert!(matches!(&table.entries[0].symbol, SymbolRef::Symbol { name, .. } if name == "main"));
    }
    assert_eq!(tables[2].name, ".rela.text.bad");
    assert_eq!(tables[2].entries.len(), 1);
    assert_eq!(tables[2].entries[0].symbol, SymbolRef::None);

    let diagnostics = container.take_diagnostics();
    assert!(diagnostics.mentions("linked section .strtab is not a symbol table"));
    assert!(!diagnostics.has_fatal());
}
