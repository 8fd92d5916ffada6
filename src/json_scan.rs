//! Locate and parse JSON objects embedded in noisy transcript text.
//!
//! Balance is a plain `{`/`}` counter: braces inside string values count
//! too, which is what the source corpora were produced with.

use memchr::{memchr, memchr2, memmem};
use serde_json::Value;

/// A parsed object together with the byte index of its closing brace.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Value,
    /// Index of the closing `}` (inclusive) in the scanned text.
    pub end: usize,
}

/// Byte range `start..=end` of the first balanced `{...}` span at or after `from`.
///
/// Returns `None` when there is no `{` or the counter never returns to zero.
#[must_use]
pub fn balanced_span(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    if from >= bytes.len() {
        return None;
    }
    let start = from + memchr(b'{', &bytes[from..])?;
    let mut depth = 0usize;
    let mut cursor = start;
    while let Some(rel) = memchr2(b'{', b'}', &bytes[cursor..]) {
        let idx = cursor + rel;
        if bytes[idx] == b'{' {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some((start, idx));
            }
        }
        cursor = idx + 1;
    }
    None
}

/// Parse the first balanced object found at or after `from`.
///
/// A span that balances but does not parse is reported at debug level and
/// yields `None`; the caller treats the document as corrupt at that point.
#[must_use]
pub fn extract_object_from(text: &str, from: usize) -> Option<Extracted> {
    let (start, end) = balanced_span(text, from)?;
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) => Some(Extracted { value, end }),
        Err(err) => {
            tracing::debug!(start, end, "balanced span is not valid JSON: {err}");
            None
        }
    }
}

/// Parse the first balanced object in `text`.
#[must_use]
pub fn extract_object(text: &str) -> Option<Extracted> {
    extract_object_from(text, 0)
}

/// Parse the first balanced object at or after the first occurrence of `marker`.
#[must_use]
pub fn extract_object_after(text: &str, marker: &str) -> Option<Extracted> {
    let pos = memmem::find(text.as_bytes(), marker.as_bytes())?;
    extract_object_from(text, pos)
}

/// Parse one object anchored at every occurrence of `marker`.
///
/// Occurrences whose span does not parse are skipped.
#[must_use]
pub fn extract_objects_at(text: &str, marker: &str) -> Vec<Value> {
    memmem::find_iter(text.as_bytes(), marker.as_bytes())
        .filter_map(|pos| extract_object_from(text, pos))
        .map(|extracted| extracted.value)
        .collect()
}

/// Parse consecutive objects following `marker` until one fails to parse.
#[must_use]
pub fn extract_objects_after(text: &str, marker: &str) -> Vec<Value> {
    let Some(mut cursor) = memmem::find(text.as_bytes(), marker.as_bytes()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    while cursor < text.len() {
        let Some(extracted) = extract_object_from(text, cursor) else {
            break;
        };
        out.push(extracted.value);
        cursor = extracted.end + 1;
    }
    out
}

/// Where a delimited extraction stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEnd<'a> {
    Marker(&'a str),
    EndOfText,
}

/// Parse exactly the trimmed text between `begin` and `end`.
///
/// `end` is searched after `begin`. Any value kind is accepted, not only
/// objects.
#[must_use]
pub fn extract_between(text: &str, begin: &str, end: SpanEnd<'_>) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = memmem::find(bytes, begin.as_bytes())? + begin.len();
    let stop = match end {
        SpanEnd::Marker(marker) => start + memmem::find(&bytes[start..], marker.as_bytes())?,
        SpanEnd::EndOfText => bytes.len(),
    };
    serde_json::from_str(text[start..stop].trim()).ok()
}

#[cfg(test)]
#[path = "json_scan_tests.rs"]
mod tests;
