//! Storage interface for persisted entities.
//!
//! [`Repository`] is the capability set every storage binding offers;
//! [`memory::InMemoryRepository`] is the binding shipped with this crate.

pub mod memory;

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryRepository;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },
    #[error("Entity has no id and its ids cannot be generated")]
    MissingId,
}

/// Key type of an [`Entity`].
pub trait EntityId: Clone + Ord + Hash + Debug + Send + Sync + 'static {
    /// Id for the `seq`-th generated entity, or `None` for natural keys
    /// that the caller must supply.
    fn generate(seq: u64) -> Option<Self>;
}

impl EntityId for u64 {
    fn generate(seq: u64) -> Option<Self> {
        Some(seq)
    }
}

impl EntityId for String {
    fn generate(_seq: u64) -> Option<Self> {
        None
    }
}

/// A persisted record with an id and an optimistic-concurrency version.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: EntityId;

    fn id(&self) -> Option<&Self::Id>;
    fn set_id(&mut self, id: Self::Id);
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn find(&self, id: &T::Id) -> Result<Option<T>, StorageError>;

    async fn find_all(&self) -> Result<Vec<T>, StorageError>;

    /// Inserts or updates `entity` and returns the stored copy.
    ///
    /// Updating requires the entity to carry the stored version; the stored
    /// version is then incremented. New entities start at version 0.
    async fn save(&self, entity: T) -> Result<T, StorageError>;

    async fn delete(&self, id: &T::Id) -> Result<(), StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;

    async fn exists(&self, id: &T::Id) -> Result<bool, StorageError> {
        Ok(self.find(id).await?.is_some())
    }
}
