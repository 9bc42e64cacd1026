use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Entity, EntityId, Repository, StorageError};

/// Process-local [`Repository`] keyed in id order.
pub struct InMemoryRepository<T: Entity> {
    rows: RwLock<BTreeMap<T::Id, T>>,
    next_id: AtomicU64,
}

impl<T: Entity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T: Entity> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for InMemoryRepository<T> {
    async fn find(&self, id: &T::Id) -> Result<Option<T>, StorageError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn save(&self, mut entity: T) -> Result<T, StorageError> {
        let mut rows = self.rows.write().await;

        let id = match entity.id() {
            Some(id) => id.clone(),
            None => {
                let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
                let id = T::Id::generate(seq).ok_or(StorageError::MissingId)?;
                entity.set_id(id.clone());
                id
            }
        };

        match rows.get(&id) {
            Some(stored) => {
                if stored.version() != entity.version() {
                    return Err(StorageError::VersionConflict {
                        expected: stored.version(),
                        found: entity.version(),
                    });
                }
                entity.set_version(stored.version() + 1);
            }
            None => entity.set_version(0),
        }

        rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: &T::Id) -> Result<(), StorageError> {
        self.rows
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("{id:?}")))
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: Option<u64>,
        body: String,
        version: u64,
    }

    impl Entity for Note {
        type Id = u64;

        fn id(&self) -> Option<&u64> {
            self.id.as_ref()
        }
        fn set_id(&mut self, id: u64) {
            self.id = Some(id);
        }
        fn version(&self) -> u64 {
            self.version
        }
        fn set_version(&mut self, version: u64) {
            self.version = version;
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        name: Option<String>,
        version: u64,
    }

    impl Entity for Tag {
        type Id = String;

        fn id(&self) -> Option<&String> {
            self.name.as_ref()
        }
        fn set_id(&mut self, id: String) {
            self.name = Some(id);
        }
        fn version(&self) -> u64 {
            self.version
        }
        fn set_version(&mut self, version: u64) {
            self.version = version;
        }
    }

    fn note(body: &str) -> Note {
        Note {
            id: None,
            body: body.to_string(),
            version: 0,
        }
    }

    #[tokio::test]
    async fn test_generated_ids_are_sequential() {
        let repo: InMemoryRepository<Note> = InMemoryRepository::new();
        let a = repo.save(note("a")).await.unwrap();
        let b = repo.save(note("b")).await.unwrap();

        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.exists(&2).await.unwrap());
        assert!(!repo.exists(&3).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_rejects_stale_writes() {
        let repo: InMemoryRepository<Note> = InMemoryRepository::new();
        let saved = repo.save(note("draft")).await.unwrap();

        let mut edited = saved.clone();
        edited.body = "final".to_string();
        let updated = repo.save(edited).await.unwrap();
        assert_eq!(updated.version, 1);

        let mut stale = saved;
        stale.body = "lost update".to_string();
        let err = repo.save(stale).await.unwrap_err();
        assert_eq!(
            err,
            StorageError::VersionConflict {
                expected: 1,
                found: 0
            }
        );
        assert_eq!(repo.find(&1).await.unwrap().unwrap().body, "final");
    }

    #[tokio::test]
    async fn test_natural_keys_must_be_supplied() {
        let repo: InMemoryRepository<Tag> = InMemoryRepository::new();
        let err = repo
            .save(Tag {
                name: None,
                version: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::MissingId);

        repo.save(Tag {
            name: Some("b".to_string()),
            version: 0,
        })
        .await
        .unwrap();
        repo.save(Tag {
            name: Some("a".to_string()),
            version: 0,
        })
        .await
        .unwrap();

        let names: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|t| t.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo: InMemoryRepository<Note> = InMemoryRepository::new();
        repo.save(note("a")).await.unwrap();

        repo.delete(&1).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.delete(&1).await,
            Err(StorageError::NotFound(_))
        ));
    }
}
