//! Error types produced by the admission checks.
//!
//! Every denial is a typed [`AdmissionError`] variant so callers can pattern
//! match on the reason instead of inspecting message strings. Policy
//! violations and infrastructure failures are kept apart:
//!
//! | Error | Category | Trigger |
//! |-------|----------|---------|
//! | [`NoUploadsAllowed`](AdmissionError::NoUploadsAllowed) | Policy | upload attempted without an upload folder |
//! | [`UploadTooBig`](AdmissionError::UploadTooBig) | Policy | file larger than the per-file maximum |
//! | [`ExtensionNotAllowed`](AdmissionError::ExtensionNotAllowed) | Policy | extension missing or not in the allow-list |
//! | [`TooManyUploads`](AdmissionError::TooManyUploads) | Policy | upload folder at or above its item limit |
//! | [`TooManyContents`](AdmissionError::TooManyContents) | Policy | target folder at or above its item limit |
//! | [`Repository`](AdmissionError::Repository) | Infrastructure | the repository count query failed |
//!
//! None of these are retried: a policy violation is a decision, and a
//! repository failure is reported so the caller can decide.
//!
//! ```rust
//! use admission::AdmissionError;
//!
//! fn user_message(error: &AdmissionError) -> String {
//!     match error {
//!         AdmissionError::UploadTooBig { max_size } => {
//!             format!("The file is too big, at most {max_size} bytes are allowed.")
//!         }
//!         e if e.is_policy_violation() => e.to_string(),
//!         _ => "Please try again later.".to_string(),
//!     }
//! }
//!
//! assert!(user_message(&AdmissionError::UploadTooBig { max_size: 10 }).contains("10 bytes"));
//! ```
use thiserror::Error;

use crate::repository::RepositoryError;

/// Reasons an upload or content creation is refused.
///
/// The enum is `#[non_exhaustive]`; include a catch-all arm when matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdmissionError {
    /// The form has no upload folder, so uploads are disabled.
    #[error("uploads are not allowed for this form")]
    NoUploadsAllowed,

    /// The file exceeds the configured per-file maximum.
    #[error("upload exceeds the maximum size of {max_size} bytes")]
    UploadTooBig {
        /// Configured limit in bytes.
        max_size: u64,
    },

    /// The filename has no extension, or it is not in the allow-list.
    #[error("file extension of {filename:?} is not allowed")]
    ExtensionNotAllowed { filename: String },

    /// The upload folder already holds the maximum number of files.
    #[error("too many uploads, at most {max_count} are allowed")]
    TooManyUploads { max_count: u64 },

    /// The target folder already holds the maximum number of content items.
    #[error("too many contents, at most {max_count} are allowed")]
    TooManyContents { max_count: u64 },

    /// The policy could not be evaluated because the repository failed.
    #[error("could not evaluate admission policy: {0}")]
    Repository(#[from] RepositoryError),
}

/// Discriminant of a policy violation, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    NoUploadsAllowed,
    UploadTooBig,
    ExtensionNotAllowed,
    TooManyUploads,
    TooManyContents,
}

impl ViolationKind {
    /// Stable snake_case code, suitable as a message catalog key.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::NoUploadsAllowed => "no_uploads_allowed",
            ViolationKind::UploadTooBig => "upload_too_big",
            ViolationKind::ExtensionNotAllowed => "upload_file_extension_not_allowed",
            ViolationKind::TooManyUploads => "too_many_uploads",
            ViolationKind::TooManyContents => "too_many_contents",
        }
    }
}

impl AdmissionError {
    /// True for denials by policy, false for infrastructure failures.
    pub fn is_policy_violation(&self) -> bool {
        self.kind().is_some()
    }

    /// The violation kind, or `None` for [`AdmissionError::Repository`].
    pub fn kind(&self) -> Option<ViolationKind> {
        match self {
            AdmissionError::NoUploadsAllowed => Some(ViolationKind::NoUploadsAllowed),
            AdmissionError::UploadTooBig { .. } => Some(ViolationKind::UploadTooBig),
            AdmissionError::ExtensionNotAllowed { .. } => Some(ViolationKind::ExtensionNotAllowed),
            AdmissionError::TooManyUploads { .. } => Some(ViolationKind::TooManyUploads),
            AdmissionError::TooManyContents { .. } => Some(ViolationKind::TooManyContents),
            AdmissionError::Repository(_) => None,
        }
    }

    /// Message catalog key for the caller's localized messages.
    pub fn message_key(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.code(),
            None => "admission_unavailable",
        }
    }

    /// Suggested HTTP status code for this error.
    ///
    /// - `UploadTooBig`: 413
    /// - `ExtensionNotAllowed`: 415
    /// - `Repository`: 503
    /// - all other violations: 403
    pub fn http_status_code(&self) -> u16 {
        match self {
            AdmissionError::UploadTooBig { .. } => 413,
            AdmissionError::ExtensionNotAllowed { .. } => 415,
            AdmissionError::Repository(_) => 503,
            _ => 403,
        }
    }
}
