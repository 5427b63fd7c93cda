//! Per-form configuration.
//!
//! A [`FormConfiguration`] describes where a user-generated-content form
//! writes and which quotas apply to it. It is built once per form session,
//! never mutated by the checks, and shared freely between threads.
//!
//! Every optional limit means *unlimited* when absent. A configured limit of
//! zero is a real limit: `max_content_count: Some(0)` refuses every new item.
//!
//! # JSON representation
//!
//! ```json
//! {
//!   "target_folder": "/sites/default/contents/",
//!   "resource_type": "plain",
//!   "name_pattern": "n_%(number)",
//!   "locale": "en",
//!   "upload_folder": "/sites/default/uploads/",
//!   "max_upload_size": 10000,
//!   "max_content_count": 100,
//!   "max_upload_count": 20,
//!   "queue_wait_time": 250,
//!   "max_queue_length": 5,
//!   "auto_publish": false,
//!   "allowed_extensions": [".jpg", ".PNG"]
//! }
//! ```
//!
//! Fields other than `target_folder` may be omitted. `queue_wait_time` is in
//! milliseconds.
//!
//! ```rust
//! use admission::FormConfiguration;
//!
//! let config = FormConfiguration::new("/contents/")
//!     .with_upload_folder("/uploads/")
//!     .with_max_upload_size(10_000)
//!     .with_allowed_extensions([".jpg", ".png"]);
//!
//! config.validate().expect("valid configuration");
//! assert!(config.uploads_enabled());
//! ```
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::extension::{AllowedExtensions, normalize_extension};
use crate::naming::{NUMBER_MACRO, NamePattern, NamingError};
use crate::types::FolderId;

/// Limits and locations governing one user-facing submission form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfiguration {
    /// Identity of this configuration. Generated when omitted.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Type of the content items the form creates.
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    /// Folder new content items are written into.
    pub target_folder: FolderId,

    /// Name pattern for new content items; must contain `%(number)`.
    #[serde(default = "default_name_pattern")]
    pub name_pattern: String,

    /// Locale new content is created in.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Folder uploaded files are written into. `None` disables uploads.
    #[serde(default)]
    pub upload_folder: Option<FolderId>,

    /// Per-file byte ceiling.
    #[serde(default)]
    pub max_upload_size: Option<u64>,

    /// Ceiling on the number of items under `target_folder`.
    #[serde(default)]
    pub max_content_count: Option<u64>,

    /// Ceiling on the number of files under `upload_folder`.
    #[serde(default)]
    pub max_upload_count: Option<u64>,

    /// Minimum spacing between two form sessions on the same target folder.
    #[serde(default, with = "crate::serde_millis")]
    pub queue_wait_time: Option<Duration>,

    /// Maximum number of sessions waiting for their turn on the target folder.
    #[serde(default)]
    pub max_queue_length: Option<u32>,

    /// Whether created content is published right away. Carried for the
    /// session layer; the admission checks do not read it.
    #[serde(default)]
    pub auto_publish: bool,

    /// Permitted filename extensions, with or without leading dot, any case.
    /// `None` permits every extension.
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
}

fn default_resource_type() -> String {
    "plain".into()
}

fn default_name_pattern() -> String {
    format!("n_{NUMBER_MACRO}")
}

fn default_locale() -> String {
    "en".into()
}

/// Invalid combinations of configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("target_folder must not be empty")]
    EmptyTargetFolder,

    #[error("upload_folder must not be empty when set")]
    EmptyUploadFolder,

    #[error("name_pattern {pattern:?} must contain the %(number) macro")]
    NamePatternWithoutNumber { pattern: String },

    #[error("allowed_extensions entry {entry:?} is empty after normalization")]
    EmptyExtension { entry: String },
}

/// Errors that can occur when loading a configuration from JSON.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(#[from] ConfigError),
}

impl FormConfiguration {
    /// A configuration writing content into `target_folder` with no uploads
    /// and no limits.
    pub fn new(target_folder: impl Into<FolderId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource_type: default_resource_type(),
            target_folder: target_folder.into(),
            name_pattern: default_name_pattern(),
            locale: default_locale(),
            upload_folder: None,
            max_upload_size: None,
            max_content_count: None,
            max_upload_count: None,
            queue_wait_time: None,
            max_queue_length: None,
            auto_publish: false,
            allowed_extensions: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    pub fn with_name_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.name_pattern = pattern.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_upload_folder(mut self, folder: impl Into<FolderId>) -> Self {
        self.upload_folder = Some(folder.into());
        self
    }

    pub fn with_max_upload_size(mut self, bytes: u64) -> Self {
        self.max_upload_size = Some(bytes);
        self
    }

    pub fn with_max_content_count(mut self, count: u64) -> Self {
        self.max_content_count = Some(count);
        self
    }

    pub fn with_max_upload_count(mut self, count: u64) -> Self {
        self.max_upload_count = Some(count);
        self
    }

    pub fn with_queue_wait_time(mut self, wait: Duration) -> Self {
        self.queue_wait_time = Some(wait);
        self
    }

    pub fn with_max_queue_length(mut self, length: u32) -> Self {
        self.max_queue_length = Some(length);
        self
    }

    pub fn with_auto_publish(mut self, auto_publish: bool) -> Self {
        self.auto_publish = auto_publish;
        self
    }

    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the form accepts uploads at all.
    pub fn uploads_enabled(&self) -> bool {
        self.upload_folder.is_some()
    }

    /// The normalized allow-list, or `None` when every extension is allowed.
    pub fn extension_allow_list(&self) -> Option<AllowedExtensions> {
        self.allowed_extensions
            .as_ref()
            .map(AllowedExtensions::from_entries)
    }

    /// The parsed `name_pattern`.
    pub fn content_name_pattern(&self) -> Result<NamePattern, NamingError> {
        NamePattern::parse(&self.name_pattern)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_folder.is_blank() {
            return Err(ConfigError::EmptyTargetFolder);
        }

        if self
            .upload_folder
            .as_ref()
            .is_some_and(FolderId::is_blank)
        {
            return Err(ConfigError::EmptyUploadFolder);
        }

        if !self.name_pattern.contains(NUMBER_MACRO) {
            return Err(ConfigError::NamePatternWithoutNumber {
                pattern: self.name_pattern.clone(),
            });
        }

        if let Some(entries) = &self.allowed_extensions {
            if let Some(entry) = entries.iter().find(|e| normalize_extension(e).is_empty()) {
                return Err(ConfigError::EmptyExtension {
                    entry: entry.clone(),
                });
            }
        }

        Ok(())
    }

    /// Parse and validate a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigLoadError> {
        let config: FormConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
