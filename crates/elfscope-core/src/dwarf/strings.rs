//! `.debug_str` contents.

use std::borrow::Cow;

/// Every NUL-terminated string in `data` with its offset, skipping empty ones.
///
/// A trailing string without a terminator is still returned.
pub fn enumerate_strings(data: &[u8]) -> Vec<(u64, Cow<'_, str>)>
{
    let mut out = Vec::new();
    let mut start = 0;
    for chunk in data.split_inclusive(|&b| b == 0) {
        let text = chunk.strip_suffix(&[0]).unwrap_or(chunk);
        if !text.is_empty() {
            out.push((start as u64, String::from_utf8_lossy(text)));
        }
        start += chunk.len();
    }
    out
}

/// The string at `offset`, if it lies inside `data`.
pub fn string_at(data: &[u8], offset: u64) -> Option<Cow<'_, str>>
{
    let tail = data.get(usize::try_from(offset).ok()?..)?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]))
}
