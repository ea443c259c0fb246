//! ELF notes (`SHT_NOTE` sections and `PT_NOTE` segments).

use object::elf::{ET_CORE, PT_NOTE, SHT_NOTE};
use tracing::debug;

use super::container::Container;
use crate::diagnostics::Diagnostics;
use crate::reader::{ByteOrder, Cursor};

/// One note record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note
{
    /// File offset of the note header.
    pub offset: u64,
    /// Owner name without its terminating NUL.
    pub owner: String,
    pub n_type: u32,
    pub descriptor: Vec<u8>,
}

impl Note
{
    /// The build ID as lowercase hex, for `NT_GNU_BUILD_ID` notes.
    pub fn build_id(&self) -> Option<String>
    {
        (self.owner == "GNU" && self.n_type == 3)
            .then(|| self.descriptor.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// `NT_GNU_ABI_TAG` as `(os, major, minor, patch)`.
    pub fn abi_tag(&self, order: ByteOrder) -> Option<(&'static str, u32, u32, u32)>
    {
        if self.owner != "GNU" || self.n_type != 1 || self.descriptor.len() < 16 {
            return None;
        }
        let word = |i: usize| order.u32_at(&self.descriptor, i * 4).unwrap_or(0);
        let os = match word(0) {
            0 => "Linux",
            1 => "Hurd",
            2 => "Solaris",
            3 => "FreeBSD",
            4 => "NetBSD",
            5 => "Syllable",
            _ => "Unknown",
        };
        Some((os, word(1), word(2), word(3)))
    }
}

/// Human-readable name for a note type, which depends on the owner and, for
/// unowned notes, on whether the file is a core dump.
pub fn note_type_name(owner: &str, n_type: u32, file_type: u16) -> Option<&'static str>
{
    let name = match owner {
        "GNU" => match n_type {
            1 => "NT_GNU_ABI_TAG (ABI version tag)",
            2 => "NT_GNU_HWCAP (DSO-supplied software HWCAP info)",
            3 => "NT_GNU_BUILD_ID (unique build ID bitstring)",
            4 => "NT_GNU_GOLD_VERSION (gold version)",
            5 => "NT_GNU_PROPERTY_TYPE_0",
            _ => return None,
        },
        "stapsdt" if n_type == 3 => "NT_STAPSDT (SystemTap probe descriptors)",
        "Go" if n_type == 4 => "GO BUILDID",
        "FreeBSD" if n_type == 1 => "NT_FREEBSD_ABI_TAG",
        "NetBSD" if n_type == 1 => "NT_NETBSD_IDENT",
        _ if file_type == ET_CORE => match n_type {
            1 => "NT_PRSTATUS (prstatus structure)",
            2 => "NT_FPREGSET (floating point registers)",
            3 => "NT_PRPSINFO (prpsinfo structure)",
            4 => "NT_TASKSTRUCT (task structure)",
            6 => "NT_AUXV (auxiliary vector)",
            0x200 => "NT_386_TLS (x86 TLS information)",
            0x202 => "NT_X86_XSTATE (x86 XSAVE extended state)",
            0x4641_494c => "NT_FILE (mapped files)",
            0x4649_4749 => "NT_SIGINFO (siginfo_t data)",
            _ => return None,
        },
        _ => match n_type {
            1 => "NT_VERSION (version)",
            2 => "NT_ARCH (architecture)",
            _ => return None,
        },
    };
    Some(name)
}

/// Decode every note in `data`.
///
/// Name and descriptor are padded to `align` bytes (4, or 8 for sections that
/// declare 8-byte alignment). A truncated note ends the walk with a warning.
pub fn parse_notes(data: &[u8], order: ByteOrder, base: u64, align: usize, what: &str, diags: &mut Diagnostics) -> Vec<Note>
{
    let align = if align == 8 { 8 } else { 4 };
    let pad = |len: usize| len.div_ceil(align) * align;

    let mut notes = Vec::new();
    let mut cursor = Cursor::with_base(data, order, base);
    while cursor.remaining() >= 12 {
        let offset = cursor.offset();
        let header = (cursor.u32(), cursor.u32(), cursor.u32());
        let (Ok(namesz), Ok(descsz), Ok(n_type)) = header else {
            break;
        };
        let (namesz, descsz) = (namesz as usize, descsz as usize);

        let name_len = pad(namesz);
        if name_len > cursor.remaining() || descsz > cursor.remaining() - name_len {
            diags.warn(
                Some(what),
                Some(offset),
                format!("<corrupt> note sizes namesz={namesz} descsz={descsz} run past end of notes"),
            );
            break;
        }

        let Ok(name) = cursor.bytes(name_len) else {
            break;
        };
        let owner_bytes = &name[..namesz];
        let owner_bytes = owner_bytes.strip_suffix(&[0u8]).unwrap_or(owner_bytes);
        let owner = String::from_utf8_lossy(owner_bytes).into_owned();
        // the final descriptor may omit its padding
        let desc_len = pad(descsz).min(cursor.remaining());
        let Ok(desc) = cursor.bytes(desc_len) else {
            break;
        };

        notes.push(Note {
            offset,
            owner,
            n_type,
            descriptor: desc[..descsz].to_vec(),
        });
    }
    if cursor.remaining() != 0 && cursor.remaining() < 12 {
        diags.warn(Some(what), Some(cursor.offset()), "trailing bytes after last note");
    }
    notes
}

impl Container<'_>
{
    /// Notes from every `SHT_NOTE` section, or from `PT_NOTE` segments when the
    /// file has no section headers.
    pub fn notes(&self) -> Vec<(String, Vec<Note>)>
    {
        let order = self.header().order;
        let mut out = Vec::new();

        if self.sections().is_empty() {
            for (index, segment) in self.segments().iter().enumerate().filter(|(_, s)| s.p_type == PT_NOTE) {
                let what = format!("PT_NOTE[{index}]");
                match self.source().read_at(segment.offset, segment.filesz) {
                    Ok(data) => {
                        let align = usize::try_from(segment.align).unwrap_or(4);
                        let notes = parse_notes(&data, order, segment.offset, align, &what, &mut self.diagnostics());
                        out.push((what, notes));
                    }
                    Err(err) => self.record_error(&what, &err),
                }
            }
        } else {
            for section in self.sections_of_type(SHT_NOTE) {
                match self.section_data(section) {
                    Ok(data) => {
                        let align = usize::try_from(section.addralign).unwrap_or(4);
                        let notes =
                            parse_notes(&data, order, section.offset, align, &section.name, &mut self.diagnostics());
                        out.push((section.name.clone(), notes));
                    }
                    Err(err) => self.record_error(&section.name, &err),
                }
            }
        }
        debug!(count = out.len(), "decoded note containers");
        out
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn note(owner: &[u8], n_type: u32, desc: &[u8]) -> Vec<u8>
    {
        let mut out = Vec::new();
        out.extend_from_slice(&(owner.len() as u32).to_le_bytes());
        out.extend_from_slice(&(desc.len() as u32).to_le_bytes());
        out.extend_from_slice(&n_type.to_le_bytes());
        out.extend_from_slice(owner);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out.extend_from_slice(desc);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    #[test]
    fn test_build_id_note()
    {
        let data = note(b"GNU\0", 3, &[0xde, 0xad, 0xbe, 0xef, 0x01]);
        let mut diags = Diagnostics::new();
        let notes = parse_notes(&data, ByteOrder::Little, 0x200, 4, ".note.gnu.build-id", &mut diags);
        assert!(diags.is_empty());
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].owner, "GNU");
        assert_eq!(notes[0].offset, 0x200);
        assert_eq!(notes[0].build_id().as_deref(), Some("deadbeef01"));
        assert_eq!(
            note_type_name("GNU", 3, 2),
            Some("NT_GNU_BUILD_ID (unique build ID bitstring)")
        );
    }

    #[test]
    fn test_abi_tag_note()
    {
        let mut desc = Vec::new();
        for word in [0u32, 3, 2, 0] {
            desc.extend_from_slice(&word.to_le_bytes());
        }
        let mut data = note(b"GNU\0", 1, &desc);
        data.extend(note(b"GNU\0", 3, &[1, 2]));
        let notes = parse_notes(&data, ByteOrder::Little, 0, 4, ".note", &mut Diagnostics::new());
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].abi_tag(ByteOrder::Little), Some(("Linux", 3, 2, 0)));
    }

    #[test]
    fn test_oversized_note_is_corrupt()
    {
        let mut data = note(b"GNU\0", 3, &[0; 4]);
        data[4..8].copy_from_slice(&0x1000u32.to_le_bytes());
        let mut diags = Diagnostics::new();
        let notes = parse_notes(&data, ByteOrder::Little, 0, 4, ".note", &mut diags);
        assert!(notes.is_empty());
        assert_eq!(diags.warning_count(), 1);
    }
}
