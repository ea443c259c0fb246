use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use elfscope_core::{decode, DebugDump, DecodeOptions, DumpRequest, ElfError, FileSource};
use elfscope_utils::{info, init_logging, LogLevel};

mod print;

/// Display information about the contents of ELF format files.
#[derive(Parser, Debug)]
#[command(name = "elfscope")]
#[command(version)]
#[command(about = "Display information about ELF object files and their DWARF debug information", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli
{
    /// ELF files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Equivalent to -h -l -S -s -r -d -V -g -n -u
    #[arg(short = 'a', long)]
    all: bool,

    /// Display the ELF file header
    #[arg(short = 'h', long)]
    file_header: bool,

    /// Display the program headers
    #[arg(short = 'l', long, visible_alias = "segments")]
    program_headers: bool,

    /// Display the section headers
    #[arg(short = 'S', long, visible_alias = "sections")]
    section_headers: bool,

    /// Display the section groups
    #[arg(short = 'g', long)]
    section_groups: bool,

    /// Display the symbol table
    #[arg(short = 's', long, visible_alias = "symbols")]
    syms: bool,

    /// Display the dynamic symbol table
    #[arg(long)]
    dyn_syms: bool,

    /// Display the relocations (if present)
    #[arg(short = 'r', long)]
    relocs: bool,

    /// Display the dynamic section (if present)
    #[arg(short = 'd', long)]
    dynamic: bool,

    /// Display the version sections (if present)
    #[arg(short = 'V', long)]
    version_info: bool,

    /// Display the core notes (if present)
    #[arg(short = 'n', long)]
    notes: bool,

    /// Display the unwind info (if present)
    #[arg(short = 'u', long)]
    unwind: bool,

    /// Display the contents of DWARF debug sections (all of them if no list is given)
    #[arg(
        short = 'w',
        long = "debug-dump",
        value_enum,
        value_delimiter = ',',
        num_args = 0..,
        require_equals = true
    )]
    debug_dump: Option<Vec<DebugSection>>,

    /// Show only the final row of each FDE instead of interpreting every advance
    #[arg(long)]
    raw_frames: bool,

    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Print help
    #[arg(short = 'H', long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DebugSection
{
    Info,
    Abbrev,
    #[value(alias = "rawline", alias = "decodedline")]
    Line,
    #[value(alias = "frames-interp")]
    Frames,
    Aranges,
    Pubnames,
    Pubtypes,
    Str,
    Loc,
    Ranges,
    #[value(alias = "macinfo")]
    Macro,
}

impl Cli
{
    fn request(&self) -> DumpRequest
    {
        let debug = match &self.debug_dump {
            None => DebugDump::default(),
            Some(list) if list.is_empty() => DebugDump::all(),
            Some(list) => {
                let mut dump = DebugDump::default();
                for section in list {
                    match section {
                        DebugSection::Info => dump.info = true,
                        DebugSection::Abbrev => dump.abbrev = true,
                        DebugSection::Line => dump.lines = true,
                        DebugSection::Frames => dump.frames = true,
                        DebugSection::Aranges => dump.aranges = true,
                        DebugSection::Pubnames => dump.pubnames = true,
                        DebugSection::Pubtypes => dump.pubtypes = true,
                        DebugSection::Str => dump.str = true,
                        DebugSection::Loc => dump.loc = true,
                        DebugSection::Ranges => dump.ranges = true,
                        DebugSection::Macro => dump.macinfo = true,
                    }
                }
                dump
            }
        };
        DumpRequest {
            section_headers: self.all || self.section_headers,
            program_headers: self.all || self.program_headers,
            section_groups: self.all || self.section_groups,
            dynamic: self.all || self.dynamic,
            relocations: self.all || self.relocs,
            symbols: self.all || self.syms,
            dyn_syms: self.all || self.syms || self.dyn_syms,
            version_info: self.all || self.version_info,
            notes: self.all || self.notes,
            unwind: self.all || self.unwind,
            debug,
        }
    }

    fn shows_header(&self) -> bool
    {
        self.all || self.file_header
    }

    fn options(&self) -> DecodeOptions
    {
        DecodeOptions {
            interpret_frames: !self.raw_frames,
            ..DecodeOptions::default()
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    let _guard = match init_logging(cli.log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    let mut failed = false;
    for path in &cli.files {
        if let Err(e) = run_file(&cli, path) {
            eprintln!("elfscope: Error: {}: {e}", path.display());
            failed = true;
        }
    }
    if failed {
        process::exit(1);
    }
}

#[derive(Debug, thiserror::Error)]
enum RunError
{
    #[error(transparent)]
    Decode(#[from] ElfError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn run_file(cli: &Cli, path: &Path) -> Result<(), RunError>
{
    info!(file = %path.display(), "decoding");
    let source = FileSource::open(path)?;
    let request = cli.request();
    let report = decode(&source, &request, &cli.options())?;

    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    if cli.files.len() > 1 {
        writeln!(out, "\nFile: {}", path.display())?;
    }
    print::report(&mut out, &report, cli.shows_header(), &request)?;
    out.flush()?;

    // diagnostics go to stderr after the dump, like readelf's warnings
    for diagnostic in &report.diagnostics {
        eprintln!("elfscope: {diagnostic}");
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_debug_dump_without_list_selects_all()
    {
        let cli = Cli::parse_from(["elfscope", "-w", "a.out"]);
        assert_eq!(cli.request().debug, DebugDump::all());
    }

    #[test]
    fn test_debug_dump_list()
    {
        let cli = Cli::parse_from(["elfscope", "--debug-dump=info,frames-interp", "a.out"]);
        let debug = cli.request().debug;
        assert!(debug.info && debug.frames);
        assert!(!debug.lines);
    }

    #[test]
    fn test_all_excludes_debug()
    {
        let cli = Cli::parse_from(["elfscope", "-a", "a.out"]);
        let request = cli.request();
        assert!(request.section_headers && request.unwind && request.dyn_syms);
        assert!(!request.debug.any());
        assert!(cli.shows_header());
    }

    #[test]
    fn test_raw_frames_and_log_level()
    {
        let cli = Cli::parse_from(["elfscope", "--raw-frames", "--log-level", "debug", "a.out"]);
        assert!(!cli.options().interpret_frames);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }

    #[test]
    fn test_file_header_short_flag()
    {
        let cli = Cli::parse_from(["elfscope", "-h", "a.out"]);
        assert!(cli.shows_header());
        assert!(!cli.request().section_headers);
    }
}
