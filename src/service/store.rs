//! Typed, category-scoped documents over a [`Repository`].

use chrono::Utc;
use tracing::{debug, warn};

use crate::api_error::ApiError;
use crate::models::{fill_category, Category, Document, DocumentKind};
use crate::repository::{Repository, RepositoryError};

pub struct Store<R> {
    repo: R,
    namespace: String,
    write_attempts: u32,
}

impl<R: Repository> Store<R> {
    pub fn new(repo: R, namespace: impl Into<String>, write_attempts: u32) -> Self {
        Self {
            repo,
            namespace: namespace.into(),
            write_attempts: write_attempts.max(1),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// `<namespace>/<category>/<file>`
    pub fn key(&self, category: Category, kind: DocumentKind) -> String {
        format!("{}/{}/{}", self.namespace, category, kind.file_name())
    }

    /// The stored document, or the kind's default when nothing is stored yet.
    pub async fn load<D: Document>(
        &self,
        category: Category,
        kind: DocumentKind,
    ) -> Result<D, ApiError> {
        self.load_key(category, &self.key(category, kind)).await
    }

    async fn load_key<D: Document>(&self, category: Category, key: &str) -> Result<D, ApiError> {
        match self.repo.get(key).await? {
            Some(mut value) => {
                fill_category::<D>(&mut value, category);
                serde_json::from_value(value).map_err(|source| {
                    ApiError::from(RepositoryError::Corrupt {
                        key: key.to_string(),
                        source,
                    })
                })
            }
            None => Ok(D::default()),
        }
    }

    /// Read-modify-write with optimistic versioning.
    ///
    /// `mutate` runs against the freshest copy on every attempt, so it must not
    /// capture state from an earlier attempt. An error from `mutate` aborts the
    /// write. The stored version is bumped by one and `updatedAt` is stamped.
    pub async fn modify<D, T, F>(
        &self,
        category: Category,
        kind: DocumentKind,
        mut mutate: F,
    ) -> Result<(D, T), ApiError>
    where
        D: Document,
        F: FnMut(&mut D) -> Result<T, ApiError>,
    {
        let key = self.key(category, kind);

        for attempt in 1..=self.write_attempts {
            let mut document: D = self.load_key(category, &key).await?;
            let expected = document.revision().version;
            let outcome = mutate(&mut document)?;

            let revision = document.revision_mut();
            revision.version = expected + 1;
            revision.updated_at = Some(Utc::now());

            let body = serde_json::to_value(&document).map_err(RepositoryError::from)?;
            match self.repo.put_if_version(&key, body, expected).await {
                Ok(()) => {
                    debug!(key = %key, version = expected + 1, "Document written");
                    return Ok((document, outcome));
                }
                Err(e) if e.is_conflict() => {
                    warn!(key = %key, attempt, max_attempts = self.write_attempts, "Version conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::conflict(format!(
            "{} changed concurrently; gave up after {} attempts",
            key, self.write_attempts
        )))
    }

    /// Replace a document's content wholesale, keeping its revision history.
    pub async fn replace<D: Document>(
        &self,
        category: Category,
        kind: DocumentKind,
        content: D,
    ) -> Result<D, ApiError> {
        let (document, ()) = self
            .modify(category, kind, |current: &mut D| {
                let revision = current.revision().clone();
                *current = content.clone();
                *current.revision_mut() = revision;
                Ok(())
            })
            .await?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Group, GroupsDocument};
    use crate::repository::InMemoryRepository;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Lets another writer slip in before the first `contended` versioned writes.
    struct ContendedRepository {
        inner: InMemoryRepository,
        contended: AtomicU32,
    }

    impl Repository for ContendedRepository {
        async fn get(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, document: Value) -> Result<(), RepositoryError> {
            self.inner.put(key, document).await
        }

        async fn put_if_version(
            &self,
            key: &str,
            document: Value,
            expected: u64,
        ) -> Result<(), RepositoryError> {
            if self.contended.load(Ordering::SeqCst) > 0 {
                self.contended.fetch_sub(1, Ordering::SeqCst);
                let mut rival: GroupsDocument = match self.inner.get(key).await? {
                    Some(value) => serde_json::from_value(value)?,
                    None => GroupsDocument::default(),
                };
                rival.groups.push(Group { id: format!("R{}", rival.revision.version), players: vec![] });
                rival.revision.version += 1;
                self.inner.put(key, serde_json::to_value(&rival)?).await?;
            }
            self.inner.put_if_version(key, document, expected).await
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    fn add_group(id: &'static str) -> impl FnMut(&mut GroupsDocument) -> Result<(), ApiError> {
        move |doc| {
            doc.groups.push(Group { id: id.to_string(), players: vec![] });
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_defaults_when_absent() {
        let store = Store::new(InMemoryRepository::new(), "data", 3);
        let doc: GroupsDocument = store.load(Category::A, DocumentKind::Groups).await.unwrap();
        assert!(doc.groups.is_empty());
        assert_eq!(doc.revision.version, 0);
        assert_eq!(store.key(Category::B, DocumentKind::GroupMatches), "data/B/matches_group.json");
    }

    #[tokio::test]
    async fn test_modify_bumps_version_and_stamps_time() {
        let store = Store::new(InMemoryRepository::new(), "data", 3);
        store.modify(Category::A, DocumentKind::Groups, add_group("G1")).await.unwrap();
        let (doc, ()) = store.modify(Category::A, DocumentKind::Groups, add_group("G2")).await.unwrap();
        assert_eq!(doc.revision.version, 2);
        assert!(doc.revision.updated_at.is_some());

        let stored = store.repository().get("data/A/groups.json").await.unwrap().unwrap();
        assert_eq!(stored["version"], 2);
        assert_eq!(stored["groups"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_conflict_reapplies_mutation_on_fresh_copy() {
        let repo = ContendedRepository {
            inner: InMemoryRepository::new(),
            contended: AtomicU32::new(1),
        };
        let store = Store::new(repo, "data", 3);

        let (doc, ()) = store.modify(Category::A, DocumentKind::Groups, add_group("G1")).await.unwrap();
        let ids: Vec<&str> = doc.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["R0", "G1"]);
        assert_eq!(doc.revision.version, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_conflict() {
        let repo = ContendedRepository {
            inner: InMemoryRepository::new(),
            contended: AtomicU32::new(5),
        };
        let store = Store::new(repo, "data", 2);

        let err = store.modify(Category::A, DocumentKind::Groups, add_group("G1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mutation_error_leaves_document_untouched() {
        let store = Store::new(InMemoryRepository::new(), "data", 3);
        let result = store
            .modify(Category::A, DocumentKind::Groups, |_: &mut GroupsDocument| {
                Err::<(), _>(ApiError::invalid_input("nope"))
            })
            .await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert!(store.repository().get("data/A/groups.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let store = Store::new(InMemoryRepository::new(), "data", 3);
        store
            .repository()
            .put("data/A/groups.json", json!({"groups": "not a list"}))
            .await
            .unwrap();
        let err = store.load::<GroupsDocument>(Category::A, DocumentKind::Groups).await.unwrap_err();
        assert!(matches!(err, ApiError::RepositoryError(RepositoryError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_replace_keeps_revision_history() {
        let store = Store::new(InMemoryRepository::new(), "data", 3);
        store.modify(Category::A, DocumentKind::Groups, add_group("G1")).await.unwrap();

        let content = GroupsDocument {
            groups: vec![Group { id: "G9".to_string(), players: vec![] }],
            ..Default::default()
        };
        let doc = store.replace(Category::A, DocumentKind::Groups, content).await.unwrap();
        assert_eq!(doc.groups.len(), 1);
        assert_eq!(doc.revision.version, 2);
    }
}
