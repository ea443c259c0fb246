//! Decode configuration.

/// Tunables for a decode session.
///
/// `Default` gives the values the CLI uses when no flag overrides them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions
{
    /// Produce one call-frame row per `advance_loc` boundary instead of only the
    /// terminal row of each FDE.
    pub interpret_frames: bool,
    /// Maximum distance between an unwind address and the function symbol it is
    /// attributed to.
    pub unwind_search_distance: u64,
    /// Nesting limit for the DIE walk; deeper trees are treated as corrupt.
    pub max_die_depth: usize,
    /// Demangle symbol names with `rustc-demangle`.
    pub demangle: bool,
}

impl Default for DecodeOptions
{
    fn default() -> Self
    {
        Self {
            interpret_frames: true,
            unwind_search_distance: 0x10_0000,
            max_die_depth: 1024,
            demangle: true,
        }
    }
}
