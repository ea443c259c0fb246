//! End-to-end tests for `decode` over hand-built and `object`-written images

mod common;

use common::*;
use elfscope_core::dwarf::{CfaRule, FrameRecord};
use elfscope_core::elf::{SectionIndex, SymbolRef};
use elfscope_core::{decode, DebugDump, DecodeOptions, DumpRequest};

const R_PARISC_DIR32: u32 = 1;
const R_PARISC_SEGREL32: u32 = 49;

fn parisc_image() -> Vec<u8>
{
    let (strtab, names) = string_table(&["frobnicate"]);
    let mut symtab = symbol(0, 0, 0, 0, 0);
    symtab.extend(symbol(names[0], 0x12, 1, 0x1000, 0x40));

    // two entries; the first start address comes from a relocation
    let mut unwind = Vec::new();
    for word in [0u32, 0x1030, 1 << 3, 0x20, 0x1020, 0x1040, 0, 0x8] {
        unwind.extend_from_slice(&word.to_le_bytes());
    }
    let mut relocations = rela(0, 1, R_PARISC_SEGREL32, 0x10);
    relocations.extend(rela(8, 1, R_PARISC_DIR32, 0));

    let mut builder = ElfBuilder::new(ET_REL, EM_PARISC);
    builder.section(TestSection {
        flags: SHF_ALLOC | SHF_EXECINSTR,
        addr: 0x1000,
        ..TestSection::new(".text", SHT_PROGBITS, vec![0; 0x40])
    });
    let strings = builder.section(TestSection::new(".strtab", SHT_STRTAB, strtab));
    let symbols = builder.section(TestSection {
        link: strings as u32,
        info: 1,
        align: 8,
        entsize: 24,
        ..TestSection::new(".symtab", SHT_SYMTAB, symtab)
    });
    let table = builder.section(TestSection {
        align: 4,
        ..TestSection::new(".PARISC.unwind", SHT_PROGBITS, unwind)
    });
    builder.section(TestSection {
        link: symbols as u32,
        info: table as u32,
        align: 8,
        entsize: 24,
        ..TestSection::new(".rela.PARISC.unwind", SHT_RELA, relocations)
    });
    builder.build()
}

#[test]
fn test_parisc_unwind_table()
{
    let data = parisc_image();
    let request = DumpRequest {
        unwind: true,
        ..DumpRequest::default()
    };
    let report = decode(&data, &request, &DecodeOptions::default()).unwrap();

    let unwind = report.unwind.unwrap();
    assert!(unwind.ia64.is_empty());
    assert_eq!(unwind.hppa.len(), 1);
    let table = &unwind.hppa[0];
    assert_eq!(table.section, ".PARISC.unwind");
    assert_eq!(table.segment_base, 0);
    assert_eq!(table.entries.len(), 2);

    let first = &table.entries[0];
    assert_eq!(first.start.address, 0x1010);
    assert_eq!(first.start.section, SectionIndex::Regular(1));
    assert_eq!(first.end.address, 0x1030);
    assert!(first.flags.save_rp);
    assert_eq!(first.flags.total_frame_size, 0x20);
    let function = first.function.as_ref().unwrap();
    assert_eq!(function.name, "frobnicate");
    assert_eq!(function.distance, 0x10);

    let second = &table.entries[1];
    assert_eq!(second.start.address, 0x1020);
    assert_eq!(second.function.as_ref().map(|f| f.distance), Some(0x20));

    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.message.contains("skipping unexpected relocation type")));
}

#[test]
fn test_unwind_request_ignores_other_machines()
{
    let mut builder = ElfBuilder::new(ET_REL, EM_X86_64);
    builder.section(TestSection::new(".PARISC.unwind", SHT_PROGBITS, vec![0; 16]));
    let data = builder.build();
    let request = DumpRequest {
        unwind: true,
        ..DumpRequest::default()
    };
    let unwind = decode(&data, &request, &DecodeOptions::default()).unwrap().unwind.unwrap();
    assert!(unwind.hppa.is_empty());
}

/// CIE at 0 followed by two FDEs pointing back at it.
fn debug_frame() -> Vec<u8>
{
    let mut cie = Vec::new();
    cie.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
    // version 1, no augmentation, code 1, data -8, return address r16
    cie.extend_from_slice(&[1, 0, 1, 0x78, 16]);
    // def_cfa(r7, 8); offset(r16, 1)
    cie.extend_from_slice(&[0x0c, 7, 8, 0x90, 1]);
    cie.resize(20, 0);

    let mut out = Vec::new();
    out.extend_from_slice(&(cie.len() as u32).to_le_bytes());
    out.extend(cie);
    for start in [0x40_1000u64, 0x40_2000] {
        let mut fde = Vec::new();
        fde.extend_from_slice(&0u32.to_le_bytes());
        fde.extend_from_slice(&start.to_le_bytes());
        fde.extend_from_slice(&0x20u64.to_le_bytes());
        // advance_loc(4); def_cfa_offset(16)
        fde.extend_from_slice(&[0x44, 0x0e, 16]);
        fde.resize(24, 0);
        out.extend_from_slice(&(fde.len() as u32).to_le_bytes());
        out.extend(fde);
    }
    out
}

#[test]
fn test_every_fde_refers_to_a_decoded_cie()
{
    let mut builder = ElfBuilder::new(ET_EXEC, EM_X86_64);
    builder.section(TestSection::new(".debug_frame", SHT_PROGBITS, debug_frame()));
    let data = builder.build();
    let request = DumpRequest {
        debug: DebugDump {
            frames: true,
            ..DebugDump::default()
        },
        ..DumpRequest::default()
    };
    let report = decode(&data, &request, &DecodeOptions::default()).unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let records = report.debug.unwrap().debug_frame;
    let cie_offsets: Vec<u64> = records
        .iter()
        .filter_map(|record| match record {
            FrameRecord::Cie(cie) => Some(cie.offset),
            _ => None,
        })
        .collect();
    assert_eq!(cie_offsets, vec![0]);

    let mut fdes = 0;
    for record in &records {
        if let FrameRecord::Fde { fde, rows } = record {
            fdes += 1;
            assert!(cie_offsets.contains(&fde.cie_offset));
            let last = rows.last().unwrap();
            assert_eq!(last.location, fde.initial_location + 4);
            assert_eq!(last.cfa, CfaRule::RegisterOffset { register: 7, offset: 16 });
        }
    }
    assert_eq!(fdes, 2);
}

#[test]
fn test_cross_check_with_object_writer()
{
    use object::write::{Object, Relocation, StandardSection, Symbol, SymbolSection};
    use object::{Architecture, BinaryFormat, Endianness, RelocationFlags, SymbolFlags, SymbolKind, SymbolScope};

    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);
    let offset = obj.append_section_data(text, &[0x55, 0xe8, 0, 0, 0, 0, 0x5d, 0xc3], 16);
    obj.add_symbol(Symbol {
        name: b"main".to_vec(),
        value: offset,
        size: 8,
        kind: SymbolKind::Text,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(text),
        flags: SymbolFlags::None,
    });
    let puts = obj.add_symbol(Symbol {
        name: b"puts".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.add_relocation(
        text,
        Relocation {
            offset: offset + 2,
            symbol: puts,
            addend: -4,
            flags: RelocationFlags::Elf {
                r_type: object::elf::R_X86_64_PLT32,
            },
        },
    )
    .unwrap();
    let data = obj.write().unwrap();

    let report = decode(&data, &DumpRequest::all(), &DecodeOptions::default()).unwrap();
    assert_eq!(report.header.machine, object::elf::EM_X86_64);
    assert_eq!(report.header.file_type, object::elf::ET_REL);
    assert!(report.sections.iter().any(|s| s.name == ".text"));
    assert!(report.segments.is_empty());

    let symbols: Vec<&str> = report
        .symbols
        .iter()
        .flat_map(|table| table.symbols.iter())
        .map(|symbol| symbol.name.raw())
        .collect();
    assert!(symbols.contains(&"main"));
    assert!(symbols.contains(&"puts"));

    let rela = report
        .relocations
        .iter()
        .find(|table| table.name == ".rela.text")
        .unwrap();
    assert_eq!(rela.entries.len(), 1);
    let entry = &rela.entries[0];
    assert_eq!(entry.relocation.r_type, object::elf::R_X86_64_PLT32);
    assert_eq!(entry.relocation.offset, offset + 2);
    assert_eq!(entry.relocation.addend, Some(-4));
    assert!(matches!(&entry.symbol, SymbolRef::Symbol { name, .. } if name == "puts"));

    assert!(!report.diagnostics.iter().any(|d| d.severity == elfscope_core::Severity::Fatal));
}
