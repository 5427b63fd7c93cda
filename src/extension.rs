//! File extension normalization and allow-list matching.
//!
//! An extension is the part of a filename after its final `.`. Allow-list
//! entries may be written with or without a leading dot and in any case;
//! they go through [`normalize_extension`], so `".PNG"`, `"png"` and `"Png"`
//! are the same entry. The filename side is only lowercased: whitespace or
//! control characters after the last `.` are part of the extension and make
//! it match nothing.

use std::collections::BTreeSet;

/// Normalize an allow-list entry: trim surrounding whitespace, strip one
/// leading `.`, and lowercase.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_dot = trimmed.strip_prefix('.').unwrap_or(trimmed);
    without_dot.to_lowercase()
}

/// The substring after the final `.` of `filename`.
///
/// Returns `None` when the name has no dot or nothing follows the last one.
/// Only the last path segment is considered, so `dir.d/readme` has no
/// extension.
pub fn extension_of(filename: &str) -> Option<&str> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() { None } else { Some(ext) }
}

/// A normalized set of permitted extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedExtensions {
    entries: BTreeSet<String>,
}

impl AllowedExtensions {
    /// Build the set from raw configuration entries. Entries that normalize
    /// to the empty string are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    /// Whether the extension of `filename` is in the set.
    pub fn permits(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) => self.entries.contains(&ext.to_lowercase()),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}
