//! ELF file header (`Elf32_Ehdr` / `Elf64_Ehdr`).

use object::elf::{ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, ELFMAG};

use crate::error::{ElfError, Result};
use crate::reader::{ByteOrder, Cursor};

/// Size of `e_ident`.
pub const EI_NIDENT: usize = 16;
/// Size of an `Elf32_Ehdr`.
pub const ELF32_HEADER_SIZE: usize = 52;
/// Size of an `Elf64_Ehdr`.
pub const ELF64_HEADER_SIZE: usize = 64;

/// Word width of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElfClass
{
    Elf32,
    Elf64,
}

impl ElfClass
{
    /// Size of an address/offset word in bytes.
    pub fn word_size(self) -> usize
    {
        match self {
            ElfClass::Elf32 => 4,
            ElfClass::Elf64 => 8,
        }
    }

    pub fn is_64(self) -> bool
    {
        self == ElfClass::Elf64
    }

    /// Size of one `ElfN_Shdr`.
    pub fn section_header_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 40,
            ElfClass::Elf64 => 64,
        }
    }

    /// Size of one `ElfN_Phdr`.
    pub fn program_header_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 32,
            ElfClass::Elf64 => 56,
        }
    }

    /// Size of one `ElfN_Sym`.
    pub fn symbol_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 16,
            ElfClass::Elf64 => 24,
        }
    }

    /// Size of one `ElfN_Rel`.
    pub fn rel_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 8,
            ElfClass::Elf64 => 16,
        }
    }

    /// Size of one `ElfN_Rela`.
    pub fn rela_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 12,
            ElfClass::Elf64 => 24,
        }
    }

    /// Size of one `ElfN_Dyn`.
    pub fn dyn_size(self) -> u64
    {
        match self {
            ElfClass::Elf32 => 8,
            ElfClass::Elf64 => 16,
        }
    }
}

/// The decoded file header.
///
/// Offsets, counts and sizes are kept exactly as stored; the extended-count
/// escapes (`e_shnum == 0`, `e_shstrndx == SHN_XINDEX`) are resolved later by the
/// section parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader
{
    pub class: ElfClass,
    pub order: ByteOrder,
    /// `EI_VERSION`
    pub ident_version: u8,
    /// `EI_OSABI`
    pub os_abi: u8,
    /// `EI_ABIVERSION`
    pub abi_version: u8,
    pub file_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl FileHeader
{
    pub fn is_64(&self) -> bool
    {
        self.class.is_64()
    }

    /// Address size in bytes, used as the default DWARF address size.
    pub fn address_size(&self) -> u8
    {
        self.class.word_size() as u8
    }
}

/// Parse the file header from the first bytes of the file.
///
/// ## Errors
///
/// - [`ElfError::MalformedMagic`] if the signature does not match; nothing else is read
/// - [`ElfError::UnsupportedClass`] if `EI_CLASS` is neither 32- nor 64-bit
/// - [`ElfError::Corrupt`] for an unknown data encoding
/// - [`ElfError::TruncatedRead`] if the buffer is shorter than the header
pub fn parse_header(bytes: &[u8]) -> Result<FileHeader>
{
    let mut magic = [0u8; 4];
    let available = bytes.len().min(4);
    magic[..available].copy_from_slice(&bytes[..available]);
    if magic != ELFMAG {
        return Err(ElfError::MalformedMagic(magic));
    }
    if bytes.len() < EI_NIDENT {
        return Err(ElfError::TruncatedRead {
            offset: 0,
            len: EI_NIDENT as u64,
            available: bytes.len() as u64,
        });
    }

    let class = match bytes[4] {
        ELFCLASS32 => ElfClass::Elf32,
        ELFCLASS64 => ElfClass::Elf64,
        other => return Err(ElfError::UnsupportedClass(other)),
    };
    let order = match bytes[5] {
        ELFDATA2LSB => ByteOrder::Little,
        ELFDATA2MSB => ByteOrder::Big,
        other => {
            return Err(ElfError::corrupt(
                "file header",
                5,
                format!("unknown data encoding {other}"),
            ))
        }
    };

    let mut cursor = Cursor::new(bytes, order);
    cursor.skip(EI_NIDENT)?;
    let word = class.word_size();

    let file_type = cursor.u16()?;
    let machine = cursor.u16()?;
    let version = cursor.u32()?;
    let entry = cursor.uint(word)?;
    let phoff = cursor.uint(word)?;
    let shoff = cursor.uint(word)?;
    let flags = cursor.u32()?;
    let ehsize = cursor.u16()?;
    let phentsize = cursor.u16()?;
    let phnum = cursor.u16()?;
    let shentsize = cursor.u16()?;
    let shnum = cursor.u16()?;
    let shstrndx = cursor.u16()?;

    Ok(FileHeader {
        class,
        order,
        ident_version: bytes[6],
        os_abi: bytes[7],
        abi_version: bytes[8],
        file_type,
        machine,
        version,
        entry,
        phoff,
        shoff,
        flags,
        ehsize,
        phentsize,
        phnum,
        shentsize,
        shnum,
        shstrndx,
    })
}

/// Number of header bytes to read before calling [`parse_header`].
pub(crate) const MAX_HEADER_SIZE: usize = ELF64_HEADER_SIZE;

#[cfg(test)]
mod tests
{
    use super::*;

    fn minimal_header64() -> Vec<u8>
    {
        let mut bytes = vec![0u8; ELF64_HEADER_SIZE];
        bytes[..4].copy_from_slice(&ELFMAG);
        bytes[4] = ELFCLASS64;
        bytes[5] = ELFDATA2LSB;
        bytes[6] = 1;
        bytes[16..18].copy_from_slice(&2u16.to_le_bytes());
        bytes[18..20].copy_from_slice(&62u16.to_le_bytes());
        bytes[24..32].copy_from_slice(&0x401000u64.to_le_bytes());
        bytes[58..60].copy_from_slice(&64u16.to_le_bytes());
        bytes[60..62].copy_from_slice(&5u16.to_le_bytes());
        bytes[62..64].copy_from_slice(&4u16.to_le_bytes());
        bytes
    }

    #[test]
    fn test_parse_header64()
    {
        let header = parse_header(&minimal_header64()).unwrap();
        assert_eq!(header.class, ElfClass::Elf64);
        assert_eq!(header.order, ByteOrder::Little);
        assert_eq!(header.file_type, 2);
        assert_eq!(header.machine, 62);
        assert_eq!(header.entry, 0x401000);
        assert_eq!(header.shnum, 5);
        assert_eq!(header.shstrndx, 4);
    }

    #[test]
    fn test_bad_magic_rejected_first()
    {
        let mut bytes = minimal_header64();
        bytes[1] = b'X';
        assert!(matches!(parse_header(&bytes), Err(ElfError::MalformedMagic(_))));
        assert!(matches!(parse_header(b"\x7fE"), Err(ElfError::MalformedMagic(_))));
    }

    #[test]
    fn test_unknown_class_is_unsupported()
    {
        let mut bytes = minimal_header64();
        bytes[4] = 7;
        assert!(matches!(parse_header(&bytes), Err(ElfError::UnsupportedClass(7))));
    }

    #[test]
    fn test_truncated_header()
    {
        let bytes = minimal_header64();
        assert!(matches!(parse_header(&bytes[..40]), Err(ElfError::TruncatedRead { .. })));
    }
}
