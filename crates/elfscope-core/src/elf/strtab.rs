//! String tables (`SHT_STRTAB` sections and `DT_STRTAB`).

use std::borrow::Cow;

/// Placeholder emitted for names whose offset falls outside their string table.
pub const CORRUPT_NAME: &str = "<corrupt>";

/// An owned string table.
#[derive(Debug, Clone, Default)]
pub struct StringTable
{
    data: Vec<u8>,
}

impl StringTable
{
    pub fn new(data: Vec<u8>) -> Self
    {
        Self { data }
    }

    pub fn len(&self) -> usize
    {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.data.is_empty()
    }

    /// The NUL-terminated string at `offset`, or `None` if `offset` is out of range.
    ///
    /// A string that runs to the end of the table without a terminator is
    /// returned truncated.
    pub fn get(&self, offset: u64) -> Option<Cow<'_, str>>
    {
        let start = usize::try_from(offset).ok()?;
        let rest = self.data.get(start..)?;
        if rest.is_empty() && start != 0 {
            return None;
        }
        let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        Some(String::from_utf8_lossy(&rest[..end]))
    }

    /// Like [`get`](Self::get) but substitutes [`CORRUPT_NAME`] for bad offsets.
    pub fn name(&self, offset: u64) -> String
    {
        self.get(offset).map_or_else(|| CORRUPT_NAME.to_owned(), Cow::into_owned)
    }

    /// Iterate `(offset, string)` for every string in the table.
    pub fn iter(&self) -> impl Iterator<Item = (u64, Cow<'_, str>)>
    {
        let mut offset = 0usize;
        std::iter::from_fn(move || {
            if offset >= self.data.len() {
                return None;
            }
            let start = offset;
            let rest = &self.data[start..];
            let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            offset = start + end + 1;
            Some((start as u64, String::from_utf8_lossy(&rest[..end])))
        })
    }
}
