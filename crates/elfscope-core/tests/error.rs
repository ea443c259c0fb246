//! Tests for error handling

use elfscope_core::error::{ElfError, Result};
use elfscope_core::DecodeOptions;

#[test]
fn test_malformed_magic_display()
{
    let error = ElfError::MalformedMagic(*b"MZ\x90\x00");
    let message = format!("{}", error);
    assert!(message.contains("bad magic"));
    assert!(message.contains("4d"));
    assert!(error.is_fatal());
    assert_eq!(error.offset(), None);
}

#[test]
fn test_truncated_read_display()
{
    let error = ElfError::TruncatedRead {
        offset: 0x40,
        len: 0x100,
        available: 0x80,
    };
    let message = format!("{}", error);
    assert!(message.contains("0x100"));
    assert!(message.contains("0x40"));
    assert!(!error.is_fatal());
    assert_eq!(error.offset(), Some(0x40));
}

#[test]
fn test_index_out_of_range_display()
{
    let error = ElfError::IndexOutOfRange {
        what: "symbol",
        index: 9,
        limit: 2,
    };
    assert_eq!(format!("{}", error), "Index out of range: symbol index 9 (limit 2)");
}

#[test]
fn test_unsupported_version_is_recoverable()
{
    let error = ElfError::UnsupportedVersion { offset: 0x2c, version: 5 };
    assert!(format!("{}", error).contains("version 5"));
    assert!(!error.is_fatal());
    assert_eq!(error.offset(), Some(0x2c));
}

#[test]
fn test_corrupt_helper()
{
    let error = ElfError::corrupt("note", 0x1f0, "descriptor overruns section");
    match &error {
        ElfError::Corrupt { what, offset, reason } => {
            assert_eq!(*what, "note");
            assert_eq!(*offset, 0x1f0);
            assert_eq!(reason, "descriptor overruns section");
        }
        _ => panic!("Expected Corrupt variant"),
    }
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short file");
    let error: ElfError = io.into();
    assert!(matches!(error, ElfError::Io(_)));
    assert!(format!("{}", error).contains("short file"));
}

#[test]
fn test_unsupported_class_is_fatal()
{
    assert!(ElfError::UnsupportedClass(7).is_fatal());
}

#[test]
fn test_result_alias()
{
    fn parse(ok: bool) -> Result<u8>
    {
        if ok { Ok(1) } else { Err(ElfError::InconsistentOrdering("loc list 0x10 after 0x20".into())) }
    }
    assert_eq!(parse(true).unwrap(), 1);
    assert!(parse(false).unwrap_err().to_string().contains("0x10 after 0x20"));
}

#[test]
fn test_default_options()
{
    let options = DecodeOptions::default();
    assert!(options.interpret_frames);
    assert_eq!(options.unwind_search_distance, 0x10_0000);
    assert_eq!(options.max_die_depth, 1024);
    assert!(options.demangle);
}
