//! Hand-assembled ELF64 little-endian images for integration tests.

#![allow(dead_code)]

pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;
pub const EM_X86_64: u16 = 62;
pub const EM_PARISC: u16 = 15;

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_GROUP: u32 = 17;
pub const SHT_GNU_VERNEED: u32 = 0x6fff_fffe;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;

pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;

#[derive(Debug, Clone, Default)]
pub struct TestSection
{
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entsize: u64,
    pub data: Vec<u8>,
}

impl TestSection
{
    pub fn new(name: &str, sh_type: u32, data: Vec<u8>) -> Self
    {
        Self {
            name: name.to_owned(),
            sh_type,
            align: 1,
            data,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TestSegment
{
    pub p_type: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

/// Builds an image laid out as: file header, program headers, section
/// contents, `.shstrtab`, section headers. Section 0 is added automatically
/// and `.shstrtab` is always the last section.
#[derive(Debug, Clone)]
pub struct ElfBuilder
{
    pub file_type: u16,
    pub machine: u16,
    pub entry: u64,
    sections: Vec<TestSection>,
    segments: Vec<TestSegment>,
    /// Overrides `e_shnum` after layout, for the extended-count escape.
    pub shnum_override: Option<u16>,
    /// Written to section 0's `sh_size`.
    pub first_section_size: u64,
}

impl ElfBuilder
{
    pub fn new(file_type: u16, machine: u16) -> Self
    {
        Self {
            file_type,
            machine,
            entry: 0,
            sections: Vec::new(),
            segments: Vec::new(),
            shnum_override: None,
            first_section_size: 0,
        }
    }

    /// Adds a section and returns its header index (section 0 is reserved).
    pub fn section(&mut self, section: TestSection) -> usize
    {
        self.sections.push(section);
        self.sections.len()
    }

    pub fn segment(&mut self, segment: TestSegment)
    {
        self.segments.push(segment);
    }

    /// File offset the next call to [`build`](Self::build) gives section `index`.
    pub fn section_offset(&self, index: usize) -> u64
    {
        let mut offset = self.contents_start();
        for section in &self.sections[..index - 1] {
            offset = align8(offset + section.data.len() as u64);
        }
        offset
    }

    fn contents_start(&self) -> u64
    {
        align8(64 + 56 * self.segments.len() as u64)
    }

    pub fn build(&self) -> Vec<u8>
    {
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let mut out = vec![0u8; self.contents_start() as usize];
        let mut offsets = Vec::new();
        for section in &self.sections {
            offsets.push(out.len() as u64);
            out.extend_from_slice(&section.data);
            out.resize(align8(out.len() as u64) as usize, 0);
        }
        let shstrtab_offset = out.len() as u64;
        out.extend_from_slice(&shstrtab);
        out.resize(align8(out.len() as u64) as usize, 0);
        let shoff = out.len() as u64;

        // section 0
        out.extend_from_slice(&section_header(0, 0, 0, 0, 0, self.first_section_size, 0, 0, 0, 0));
        for (i, section) in self.sections.iter().enumerate() {
            let size = section.data.len() as u64;
            out.extend_from_slice(&section_header(
                name_offsets[i],
                section.sh_type,
                section.flags,
                section.addr,
                offsets[i],
                size,
                section.link,
                section.info,
                section.align,
                section.entsize,
            ));
        }
        out.extend_from_slice(&section_header(shstrtab_name, SHT_STRTAB, 0, 0, shstrtab_offset, shstrtab.len() as u64, 0, 0, 1, 0));

        let shnum = self.shnum_override.unwrap_or(self.sections.len() as u16 + 2);
        let shstrndx = self.sections.len() as u16 + 1;
        let phoff = if self.segments.is_empty() { 0 } else { 64 };
        out[..64].copy_from_slice(&file_header(self, phoff, shoff, shnum, shstrndx));
        for (i, segment) in self.segments.iter().enumerate() {
            let at = 64 + 56 * i;
            out[at..at + 56].copy_from_slice(&program_header(segment));
        }
        out
    }
}

pub fn align8(value: u64) -> u64
{
    (value + 7) & !7
}

fn file_header(builder: &ElfBuilder, phoff: u64, shoff: u64, shnum: u16, shstrndx: u16) -> Vec<u8>
{
    let mut h = Vec::with_capacity(64);
    h.extend_from_slice(b"\x7fELF");
    h.extend_from_slice(&[2, 1, 1, 0, 0]);
    h.resize(16, 0);
    h.extend_from_slice(&builder.file_type.to_le_bytes());
    h.extend_from_slice(&builder.machine.to_le_bytes());
    h.extend_from_slice(&1u32.to_le_bytes());
    h.extend_from_slice(&builder.entry.to_le_bytes());
    h.extend_from_slice(&phoff.to_le_bytes());
    h.extend_from_slice(&shoff.to_le_bytes());
    h.extend_from_slice(&0u32.to_le_bytes());
    h.extend_from_slice(&64u16.to_le_bytes());
    h.extend_from_slice(&56u16.to_le_bytes());
    h.extend_from_slice(&(builder.segments.len() as u16).to_le_bytes());
    h.extend_from_slice(&64u16.to_le_bytes());
    h.extend_from_slice(&shnum.to_le_bytes());
    h.extend_from_slice(&shstrndx.to_le_bytes());
    h
}

#[allow(clippy::too_many_arguments)]
fn section_header(
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    align: u64,
    entsize: u64,
) -> Vec<u8>
{
    let mut h = Vec::with_capacity(64);
    h.extend_from_slice(&name.to_le_bytes());
    h.extend_from_slice(&sh_type.to_le_bytes());
    h.extend_from_slice(&flags.to_le_bytes());
    h.extend_from_slice(&addr.to_le_bytes());
    h.extend_from_slice(&offset.to_le_bytes());
    h.extend_from_slice(&size.to_le_bytes());
    h.extend_from_slice(&link.to_le_bytes());
    h.extend_from_slice(&info.to_le_bytes());
    h.extend_from_slice(&align.to_le_bytes());
    h.extend_from_slice(&entsize.to_le_bytes());
    h
}

fn program_header(segment: &TestSegment) -> Vec<u8>
{
    let mut h = Vec::with_capacity(56);
    h.extend_from_slice(&segment.p_type.to_le_bytes());
    h.extend_from_slice(&segment.flags.to_le_bytes());
    h.extend_from_slice(&segment.offset.to_le_bytes());
    h.extend_from_slice(&segment.vaddr.to_le_bytes());
    h.extend_from_slice(&segment.vaddr.to_le_bytes());
    h.extend_from_slice(&segment.filesz.to_le_bytes());
    h.extend_from_slice(&segment.memsz.to_le_bytes());
    h.extend_from_slice(&segment.align.to_le_bytes());
    h
}

/// One `Elf64_Sym`.
pub fn symbol(name: u32, info: u8, shndx: u16, value: u64, size: u64) -> Vec<u8>
{
    let mut s = Vec::with_capacity(24);
    s.extend_from_slice(&name.to_le_bytes());
    s.push(info);
    s.push(0);
    s.extend_from_slice(&shndx.to_le_bytes());
    s.extend_from_slice(&value.to_le_bytes());
    s.extend_from_slice(&size.to_le_bytes());
    s
}

/// One `Elf64_Rela`.
pub fn rela(offset: u64, sym: u32, r_type: u32, addend: i64) -> Vec<u8>
{
    let mut r = Vec::with_capacity(24);
    r.extend_from_slice(&offset.to_le_bytes());
    r.extend_from_slice(&((u64::from(sym) << 32) | u64::from(r_type)).to_le_bytes());
    r.extend_from_slice(&addend.to_le_bytes());
    r
}

/// A string table holding `names` in order; returns the bytes and each name's offset.
pub fn string_table(names: &[&str]) -> (Vec<u8>, Vec<u32>)
{
    let mut data = vec![0u8];
    let mut offsets = Vec::new();
    for name in names {
        offsets.push(data.len() as u32);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
    }
    (data, offsets)
}
