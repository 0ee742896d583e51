use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::{document_version, Repository, RepositoryError};

/// Process-local document store. Clones share the same map.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    documents: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, document: Value) -> Result<(), RepositoryError> {
        self.documents.write().await.insert(key.to_string(), document);
        Ok(())
    }

    async fn put_if_version(
        &self,
        key: &str,
        document: Value,
        expected: u64,
    ) -> Result<(), RepositoryError> {
        let mut documents = self.documents.write().await;
        let found = documents.get(key).map(document_version).unwrap_or(0);
        if found != expected {
            debug!(key = %key, expected, found, "Rejected stale write");
            return Err(RepositoryError::VersionConflict {
                key: key.to_string(),
                expected,
                found,
            });
        }
        documents.insert(key.to_string(), document);
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_document_is_version_zero() {
        tokio_test::block_on(async {
            let repo = InMemoryRepository::new();
            assert!(repo.get("data/A/groups.json").await.unwrap().is_none());

            repo.put_if_version("data/A/groups.json", json!({"groups": [], "version": 1}), 0)
                .await
                .unwrap();
            let stored = repo.get("data/A/groups.json").await.unwrap().unwrap();
            assert_eq!(document_version(&stored), 1);
        });
    }

    #[test]
    fn test_stale_write_is_rejected() {
        tokio_test::block_on(async {
            let repo = InMemoryRepository::new();
            repo.put("k", json!({"version": 3})).await.unwrap();

            let err = repo.put_if_version("k", json!({"version": 3}), 2).await.unwrap_err();
            assert!(err.is_conflict());
            assert!(matches!(
                err,
                RepositoryError::VersionConflict { expected: 2, found: 3, .. }
            ));
            assert_eq!(repo.get("k").await.unwrap(), Some(json!({"version": 3})));

            repo.put_if_version("k", json!({"version": 4}), 3).await.unwrap();
            assert_eq!(repo.get("k").await.unwrap(), Some(json!({"version": 4})));
        });
    }

    #[test]
    fn test_clones_share_storage() {
        tokio_test::block_on(async {
            let repo = InMemoryRepository::new();
            let other = repo.clone();
            repo.put("k", json!({"version": 1})).await.unwrap();
            assert!(other.get("k").await.unwrap().is_some());
            assert!(other.ping().await.is_ok());
        });
    }
}
