//! Admission checks for uploads and new content items.
//!
//! [`UploadAdmissionController`] answers one question per call: may this
//! form submission go ahead? It holds no state besides a handle to the
//! repository, so a single controller can serve every form session
//! concurrently.
//!
//! # Check order
//!
//! ```text
//! check_create_upload(config, filename, size)
//!        │
//!        ▼
//! ┌───────────────────────────────────┐
//! │ 1. upload folder configured?      │──► NoUploadsAllowed
//! │ 2. size <= max_upload_size?       │──► UploadTooBig
//! │ 3. extension in allow-list?       │──► ExtensionNotAllowed
//! │ 4. uploads < max_upload_count?    │──► TooManyUploads   (repository query)
//! └───────────────────────────────────┘
//!        │
//!        ▼
//!       Ok(())
//! ```
//!
//! Cheap checks run first, so a disabled feature or an obviously bad request
//! is refused without a repository round trip.
//!
//! # Concurrency
//!
//! Counting and the caller's subsequent write are not atomic. Two concurrent
//! submissions can both pass a count check before either item exists, so a
//! limit can be overshot by the number of racing submissions. No lock is
//! taken here; callers that need a hard limit must serialize the
//! check-and-create sequence themselves (for example through the session
//! queue).
//!
//! ```rust
//! use admission::{AdmissionError, FormConfiguration, InMemoryRepository, UploadAdmissionController};
//!
//! let repo = InMemoryRepository::new();
//! repo.create_folder("/uploads/").unwrap();
//! let controller = UploadAdmissionController::new(repo);
//!
//! let config = FormConfiguration::new("/")
//!     .with_upload_folder("/uploads/")
//!     .with_max_upload_size(100);
//!
//! assert!(controller.check_create_upload(&config, "foo.png", 100).is_ok());
//! assert_eq!(
//!     controller.check_create_upload(&config, "foo.png", 101),
//!     Err(AdmissionError::UploadTooBig { max_size: 100 })
//! );
//! ```
use std::time::Instant;

use tracing::{Level, debug, warn};

use crate::config::FormConfiguration;
use crate::error::AdmissionError;
use crate::metrics::MetricsSpan;
use crate::repository::ContentRepository;

/// Gate-keeper for uploads and content creation.
#[derive(Debug, Clone, Default)]
pub struct UploadAdmissionController<R> {
    repository: R,
}

impl<R: ContentRepository> UploadAdmissionController<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Check whether a file called `filename` of `size_in_bytes` may be
    /// uploaded through the form described by `config`.
    ///
    /// Succeeds without side effects; the caller performs the write.
    pub fn check_create_upload(
        &self,
        config: &FormConfiguration,
        filename: &str,
        size_in_bytes: u64,
    ) -> Result<(), AdmissionError> {
        let start = Instant::now();
        let metrics = MetricsSpan::start();
        let span = tracing::span!(
            Level::INFO,
            "admission.check_create_upload",
            form_id = %config.id,
            filename = %filename,
            size_in_bytes
        );
        let _guard = span.enter();

        let result = self.upload_inner(config, filename, size_in_bytes);
        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(()) => debug!(elapsed_micros, "upload_admitted"),
            Err(err) if err.is_policy_violation() => warn!(
                reason = err.message_key(),
                error = %err,
                elapsed_micros,
                "upload_denied"
            ),
            Err(err) => warn!(error = %err, elapsed_micros, "upload_check_failed"),
        }

        if let Some(span) = metrics {
            span.record_upload(result.as_ref().map(|_| ()));
        }
        result
    }

    /// Check whether a new content item may be created in the form's
    /// target folder.
    pub fn check_create_content(&self, config: &FormConfiguration) -> Result<(), AdmissionError> {
        let start = Instant::now();
        let metrics = MetricsSpan::start();
        let span = tracing::span!(
            Level::INFO,
            "admission.check_create_content",
            form_id = %config.id,
            target_folder = %config.target_folder
        );
        let _guard = span.enter();

        let result = self.content_inner(config);
        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(()) => debug!(elapsed_micros, "content_admitted"),
            Err(err) if err.is_policy_violation() => warn!(
                reason = err.message_key(),
                error = %err,
                elapsed_micros,
                "content_denied"
            ),
            Err(err) => warn!(error = %err, elapsed_micros, "content_check_failed"),
        }

        if let Some(span) = metrics {
            span.record_content(result.as_ref().map(|_| ()));
        }
        result
    }

    fn upload_inner(
        &self,
        config: &FormConfiguration,
        filename: &str,
        size_in_bytes: u64,
    ) -> Result<(), AdmissionError> {
        let upload_folder = config
            .upload_folder
            .as_ref()
            .ok_or(AdmissionError::NoUploadsAllowed)?;

        if let Some(max_size) = config.max_upload_size {
            if size_in_bytes > max_size {
                return Err(AdmissionError::UploadTooBig { max_size });
            }
        }

        if let Some(allowed) = config.extension_allow_list() {
            if !allowed.permits(filename) {
                return Err(AdmissionError::ExtensionNotAllowed {
                    filename: filename.to_string(),
                });
            }
        }

        if let Some(max_count) = config.max_upload_count {
            let count = self.repository.count_children_under(upload_folder)?;
            if count >= max_count {
                return Err(AdmissionError::TooManyUploads { max_count });
            }
        }

        Ok(())
    }

    fn content_inner(&self, config: &FormConfiguration) -> Result<(), AdmissionError> {
        if let Some(max_count) = config.max_content_count {
            let count = self
                .repository
                .count_children_under(&config.target_folder)?;
            if count >= max_count {
                return Err(AdmissionError::TooManyContents { max_count });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, RepositoryError};
    use crate::types::FolderId;

    fn repo_with_uploads(n: usize) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.create_folder("/").unwrap();
        repo.create_folder("/uploads/").unwrap();
        for i in 0..n {
            repo.add_child("/uploads/", format!("file{i}.png")).unwrap();
        }
        repo
    }

    fn upload_config() -> FormConfiguration {
        FormConfiguration::new("/").with_upload_folder("/uploads/")
    }

    /// Repository whose every query fails.
    struct BrokenRepository;

    impl ContentRepository for BrokenRepository {
        fn count_children_under(&self, _folder: &FolderId) -> Result<u64, RepositoryError> {
            Err(RepositoryError::backend("connection refused"))
        }

        fn contains_child(&self, _folder: &FolderId, _name: &str) -> Result<bool, RepositoryError> {
            Err(RepositoryError::backend("connection refused"))
        }
    }

    #[test]
    fn no_upload_folder_always_denies() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = FormConfiguration::new("/")
            .with_max_content_count(100)
            .with_allowed_extensions([".jpg", ".PNG"]);

        for (name, size) in [("foo.png", 100), ("foo.doc", 0), ("noext", u64::MAX)] {
            assert_eq!(
                controller.check_create_upload(&config, name, size),
                Err(AdmissionError::NoUploadsAllowed)
            );
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = upload_config().with_max_upload_size(100);

        assert!(controller.check_create_upload(&config, "foo.png", 100).is_ok());
        assert_eq!(
            controller.check_create_upload(&config, "foo.png", 101),
            Err(AdmissionError::UploadTooBig { max_size: 100 })
        );
        assert_eq!(
            controller.check_create_upload(&config, "foo.png", 50000),
            Err(AdmissionError::UploadTooBig { max_size: 100 })
        );
    }

    #[test]
    fn extension_allow_list() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = upload_config().with_allowed_extensions([".jpg", ".PNG"]);

        assert!(controller.check_create_upload(&config, "foo.JPG", 1).is_ok());
        assert!(controller.check_create_upload(&config, "foo.png", 1).is_ok());
        for name in ["foo.doc", "foo", "foo."] {
            assert!(matches!(
                controller.check_create_upload(&config, name, 1),
                Err(AdmissionError::ExtensionNotAllowed { filename }) if filename == name
            ));
        }
    }

    #[test]
    fn padded_extensions_are_not_allowed() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = upload_config().with_allowed_extensions([".png"]);

        for name in ["foo.png ", "foo.png\n", "foo. png"] {
            assert_eq!(
                controller.check_create_upload(&config, name, 1),
                Err(AdmissionError::ExtensionNotAllowed {
                    filename: name.to_string()
                })
            );
        }
    }

    #[test]
    fn size_is_checked_before_extension() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = upload_config()
            .with_max_upload_size(10)
            .with_allowed_extensions([".png"]);

        assert_eq!(
            controller.check_create_upload(&config, "foo.doc", 11),
            Err(AdmissionError::UploadTooBig { max_size: 10 })
        );
    }

    #[test]
    fn upload_count_limit() {
        let config = upload_config().with_max_upload_count(2);

        let controller = UploadAdmissionController::new(repo_with_uploads(1));
        assert!(controller.check_create_upload(&config, "a.png", 1).is_ok());

        let controller = UploadAdmissionController::new(repo_with_uploads(2));
        assert_eq!(
            controller.check_create_upload(&config, "a.png", 1),
            Err(AdmissionError::TooManyUploads { max_count: 2 })
        );
    }

    #[test]
    fn no_upload_count_limit_skips_the_repository() {
        let controller = UploadAdmissionController::new(BrokenRepository);
        assert!(controller.check_create_upload(&upload_config(), "a.png", 1).is_ok());
        assert!(controller
            .check_create_content(&FormConfiguration::new("/"))
            .is_ok());
    }

    #[test]
    fn earlier_violations_skip_the_repository() {
        let controller = UploadAdmissionController::new(BrokenRepository);
        let config = upload_config()
            .with_max_upload_size(1)
            .with_max_upload_count(5);
        assert_eq!(
            controller.check_create_upload(&config, "a.png", 2),
            Err(AdmissionError::UploadTooBig { max_size: 1 })
        );
    }

    #[test]
    fn repository_failures_are_not_policy_violations() {
        let controller = UploadAdmissionController::new(BrokenRepository);

        let err = controller
            .check_create_upload(&upload_config().with_max_upload_count(5), "a.png", 1)
            .expect_err("count query fails");
        assert!(matches!(err, AdmissionError::Repository(RepositoryError::Backend(_))));
        assert!(!err.is_policy_violation());

        let err = controller
            .check_create_content(&FormConfiguration::new("/").with_max_content_count(5))
            .expect_err("count query fails");
        assert!(matches!(err, AdmissionError::Repository(_)));
    }

    #[test]
    fn content_count_limit() {
        let repo = InMemoryRepository::new();
        repo.add_child("/contents/", "n_00001").unwrap();
        repo.add_child("/contents/", "n_00002").unwrap();
        let controller = UploadAdmissionController::new(repo);

        let at_limit = FormConfiguration::new("/contents/").with_max_content_count(2);
        assert_eq!(
            controller.check_create_content(&at_limit),
            Err(AdmissionError::TooManyContents { max_count: 2 })
        );

        let below_limit = FormConfiguration::new("/contents/").with_max_content_count(3);
        assert!(controller.check_create_content(&below_limit).is_ok());
    }

    #[test]
    fn zero_content_limit_denies_even_empty_folder() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = FormConfiguration::new("/").with_max_content_count(0);
        assert_eq!(
            controller.check_create_content(&config),
            Err(AdmissionError::TooManyContents { max_count: 0 })
        );
    }

    #[test]
    fn content_limit_does_not_affect_uploads() {
        let controller = UploadAdmissionController::new(repo_with_uploads(0));
        let config = upload_config().with_max_content_count(0);
        assert!(controller.check_create_upload(&config, "foo.png", 3).is_ok());
    }
}
