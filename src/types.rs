//! Shared identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a folder in the content repository.
///
/// The crate never interprets the identifier; it is handed to the
/// [`ContentRepository`](crate::ContentRepository) as-is. Typical values are
/// repository paths (`/sites/default/uploads/`) or structure ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FolderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for FolderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
