//! Admission control for user-generated content forms.
//!
//! Before a form submission uploads a file or creates a content item, the
//! form-session layer asks [`UploadAdmissionController`] whether the action
//! is allowed by the form's [`FormConfiguration`]: is there an upload folder
//! at all, is the file small enough, is its extension allowed, and is there
//! room left under the folder's item limit.
//!
//! Counts come from a [`ContentRepository`], supplied by the embedder. The
//! checks never write; the caller performs the mutation after a successful
//! check.
//!
//! Supporting pieces:
//!
//! - [`NamePattern`] picks free names such as `n_00003` for new items.
//! - [`SessionQueueRegistry`] (feature `queue`) spaces out sessions writing
//!   into the same folder.
//! - [`set_admission_metrics`] installs an observer for check outcomes.
//!
//! ```rust
//! use admission::{
//!     AdmissionError, FormConfiguration, InMemoryRepository, UploadAdmissionController,
//! };
//!
//! let repo = InMemoryRepository::new();
//! repo.create_folder("/").unwrap();
//! repo.create_folder("/uploads/").unwrap();
//!
//! let config = FormConfiguration::new("/")
//!     .with_upload_folder("/uploads/")
//!     .with_max_upload_size(10_000)
//!     .with_max_content_count(0)
//!     .with_allowed_extensions([".jpg", ".PNG"]);
//!
//! let controller = UploadAdmissionController::new(repo);
//! assert!(controller.check_create_upload(&config, "foo.JPG", 100).is_ok());
//! assert!(matches!(
//!     controller.check_create_upload(&config, "foo.doc", 100),
//!     Err(AdmissionError::ExtensionNotAllowed { .. })
//! ));
//! assert_eq!(
//!     controller.check_create_content(&config),
//!     Err(AdmissionError::TooManyContents { max_count: 0 })
//! );
//! ```

mod config;
mod controller;
mod error;
mod extension;
mod metrics;
mod naming;
#[cfg(feature = "queue")]
mod queue;
mod repository;
mod serde_millis;
mod types;

pub use crate::config::{ConfigError, ConfigLoadError, FormConfiguration};
pub use crate::controller::UploadAdmissionController;
pub use crate::error::{AdmissionError, ViolationKind};
pub use crate::extension::{AllowedExtensions, extension_of, normalize_extension};
pub use crate::metrics::{AdmissionMetrics, set_admission_metrics};
pub use crate::naming::{NUMBER_MACRO, NamePattern, NamingError};
#[cfg(feature = "queue")]
pub use crate::queue::{QueueError, SessionQueue, SessionQueueRegistry};
pub use crate::repository::{ContentRepository, InMemoryRepository, RepositoryError};
pub use crate::types::FolderId;
