//! Names for newly created content items.
//!
//! A form's `name_pattern` contains the `%(number)` macro, e.g. `n_%(number)`.
//! New items get the first name, counting up from 1 with five-digit
//! zero-padding (`n_00001`, `n_00002`, ...), that is not yet taken in the
//! target folder. Counters keep growing past `99999` and simply get wider.
//!
//! Like the admission checks, probing for a free name is not atomic with the
//! caller's write: two concurrent sessions may pick the same name, and the
//! repository's create call is the final arbiter.

use thiserror::Error;
use tracing::debug;

use crate::repository::{ContentRepository, RepositoryError};
use crate::types::FolderId;

/// Macro replaced by the item counter.
pub const NUMBER_MACRO: &str = "%(number)";

const NUMBER_WIDTH: usize = 5;
const MAX_NAME_PROBES: u64 = 100_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NamingError {
    #[error("name pattern {0:?} does not contain %(number)")]
    MissingNumberMacro(String),

    #[error("no free name found for pattern {pattern:?} after {probes} attempts")]
    Exhausted { pattern: String, probes: u64 },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A parsed name pattern, split around its first `%(number)` macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    suffix: String,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Result<Self, NamingError> {
        let (prefix, suffix) = pattern
            .split_once(NUMBER_MACRO)
            .ok_or_else(|| NamingError::MissingNumberMacro(pattern.to_string()))?;
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The name for counter value `number`.
    pub fn format(&self, number: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            number,
            self.suffix,
            width = NUMBER_WIDTH
        )
    }

    /// First name not yet present under `folder`.
    pub fn next_name<R>(&self, repository: &R, folder: &FolderId) -> Result<String, NamingError>
    where
        R: ContentRepository + ?Sized,
    {
        for number in 1..=MAX_NAME_PROBES {
            let candidate = self.format(number);
            if !repository.contains_child(folder, &candidate)? {
                debug!(folder = %folder, name = %candidate, "naming.next_name");
                return Ok(candidate);
            }
        }

        Err(NamingError::Exhausted {
            pattern: format!("{}{}{}", self.prefix, NUMBER_MACRO, self.suffix),
            probes: MAX_NAME_PROBES,
        })
    }
}
