//! Key-value JSON document storage with an optimistic versioning seam.
//!
//! Every stored document carries a top-level `version` field. A document that
//! is absent, or that predates versioning, is at version 0.

pub mod memory;
pub mod postgres;

use serde_json::Value;
use thiserror::Error;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict { key: String, expected: u64, found: u64 },

    #[error("document {key} is not valid JSON for its type: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::VersionConflict { .. })
    }
}

/// Version recorded in a stored document body.
pub fn document_version(document: &Value) -> u64 {
    document.get("version").and_then(Value::as_u64).unwrap_or(0)
}

#[allow(async_fn_in_trait)]
pub trait Repository {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepositoryError>;

    /// Unconditional write.
    async fn put(&self, key: &str, document: Value) -> Result<(), RepositoryError>;

    /// Write only if the stored version still equals `expected`.
    async fn put_if_version(
        &self,
        key: &str,
        document: Value,
        expected: u64,
    ) -> Result<(), RepositoryError>;

    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Backend selected at startup.
#[derive(Clone)]
pub enum DocumentStore {
    Postgres(PgRepository),
    Memory(InMemoryRepository),
}

impl Repository for DocumentStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
        match self {
            DocumentStore::Postgres(repo) => repo.get(key).await,
            DocumentStore::Memory(repo) => repo.get(key).await,
        }
    }

    async fn put(&self, key: &str, document: Value) -> Result<(), RepositoryError> {
        match self {
            DocumentStore::Postgres(repo) => repo.put(key, document).await,
            DocumentStore::Memory(repo) => repo.put(key, document).await,
        }
    }

    async fn put_if_version(
        &self,
        key: &str,
        document: Value,
        expected: u64,
    ) -> Result<(), RepositoryError> {
        match self {
            DocumentStore::Postgres(repo) => repo.put_if_version(key, document, expected).await,
            DocumentStore::Memory(repo) => repo.put_if_version(key, document, expected).await,
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        match self {
            DocumentStore::Postgres(repo) => repo.ping().await,
            DocumentStore::Memory(repo) => repo.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_version_defaults_to_zero() {
        assert_eq!(document_version(&json!({"matches": []})), 0);
        assert_eq!(document_version(&json!({"version": 7})), 7);
        assert_eq!(document_version(&json!({"version": "7"})), 0);
    }
}
