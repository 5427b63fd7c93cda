//! Read access to the content repository.
//!
//! The admission checks only need two questions answered by the repository:
//! how many items live directly under a folder, and whether a given name is
//! already taken there. [`ContentRepository`] captures exactly that so the
//! checks stay independent of any particular storage engine.
//!
//! [`InMemoryRepository`] is a `RwLock<HashMap>` backed implementation used by
//! tests and by embedders that mirror folder listings in memory.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::types::FolderId;

/// Failures raised while querying the repository.
///
/// These are infrastructure errors: they mean a policy could not be
/// evaluated, not that a request was denied.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RepositoryError {
    #[error("folder not found: {0}")]
    FolderNotFound(FolderId),

    #[error("repository backend failure: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn backend<T: Into<String>>(message: T) -> Self {
        RepositoryError::Backend(message.into())
    }
}

/// Trait for the repository queried by the admission checks.
///
/// Implementations must be safe to share between threads handling
/// concurrent form submissions. Counts should reflect a recent snapshot;
/// the consistency model is owned by the implementation.
pub trait ContentRepository: Send + Sync {
    /// Number of items (uploads or regular content) directly under `folder`.
    fn count_children_under(&self, folder: &FolderId) -> Result<u64, RepositoryError>;

    /// Whether an item called `name` already exists directly under `folder`.
    fn contains_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError>;
}

impl<T: ContentRepository + ?Sized> ContentRepository for &T {
    fn count_children_under(&self, folder: &FolderId) -> Result<u64, RepositoryError> {
        (**self).count_children_under(folder)
    }

    fn contains_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError> {
        (**self).contains_child(folder, name)
    }
}

impl<T: ContentRepository + ?Sized> ContentRepository for Arc<T> {
    fn count_children_under(&self, folder: &FolderId) -> Result<u64, RepositoryError> {
        (**self).count_children_under(folder)
    }

    fn contains_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError> {
        (**self).contains_child(folder, name)
    }
}

impl<T: ContentRepository + ?Sized> ContentRepository for Box<T> {
    fn count_children_under(&self, folder: &FolderId) -> Result<u64, RepositoryError> {
        (**self).count_children_under(folder)
    }

    fn contains_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError> {
        (**self).contains_child(folder, name)
    }
}

/// An in-memory repository using a `RwLock` around a `HashMap` of folder listings.
pub struct InMemoryRepository {
    folders: RwLock<HashMap<FolderId, BTreeSet<String>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            folders: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty folder. Existing folders are left untouched.
    pub fn create_folder(&self, folder: impl Into<FolderId>) -> Result<(), RepositoryError> {
        let mut guard = self.write()?;
        guard.entry(folder.into()).or_default();
        Ok(())
    }

    /// Add an item under `folder`, creating the folder if needed.
    ///
    /// Returns `false` when the name was already present.
    pub fn add_child(
        &self,
        folder: impl Into<FolderId>,
        name: impl Into<String>,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.write()?;
        Ok(guard.entry(folder.into()).or_default().insert(name.into()))
    }

    /// Remove an item. Returns `false` when it did not exist.
    pub fn remove_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError> {
        let mut guard = self.write()?;
        let children = guard
            .get_mut(folder)
            .ok_or_else(|| RepositoryError::FolderNotFound(folder.clone()))?;
        Ok(children.remove(name))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<FolderId, BTreeSet<String>>>, RepositoryError>
    {
        self.folders
            .write()
            .map_err(|_| RepositoryError::backend("repository lock poisoned"))
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<FolderId, BTreeSet<String>>>, RepositoryError>
    {
        self.folders
            .read()
            .map_err(|_| RepositoryError::backend("repository lock poisoned"))
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentRepository for InMemoryRepository {
    fn count_children_under(&self, folder: &FolderId) -> Result<u64, RepositoryError> {
        let guard = self.read()?;
        guard
            .get(folder)
            .map(|children| children.len() as u64)
            .ok_or_else(|| RepositoryError::FolderNotFound(folder.clone()))
    }

    fn contains_child(&self, folder: &FolderId, name: &str) -> Result<bool, RepositoryError> {
        let guard = self.read()?;
        guard
            .get(folder)
            .map(|children| children.contains(name))
            .ok_or_else(|| RepositoryError::FolderNotFound(folder.clone()))
    }
}
