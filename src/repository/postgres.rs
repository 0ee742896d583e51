use serde_json::Value;
use sqlx::Row;
use tracing::debug;

use super::{document_version, Repository, RepositoryError};
use crate::db::{self, DbPool};

/// Documents stored one row per key in the `documents` table.
#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn stored_version(&self, key: &str) -> Result<u64, RepositoryError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM documents WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(version.map(|v| v.max(0) as u64).unwrap_or(0))
    }
}

fn to_column(version: u64) -> Result<i64, RepositoryError> {
    i64::try_from(version).map_err(|_| RepositoryError::Backend(format!("version {} overflows", version)))
}

impl Repository for PgRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepositoryError> {
        let row = sqlx::query("SELECT body FROM documents WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<Value, _>("body")?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, document: Value) -> Result<(), RepositoryError> {
        let version = to_column(document_version(&document))?;
        sqlx::query(
            r#"
            INSERT INTO documents (key, body, version, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO UPDATE
            SET body = EXCLUDED.body, version = EXCLUDED.version, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(&document)
        .bind(version)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_if_version(
        &self,
        key: &str,
        document: Value,
        expected: u64,
    ) -> Result<(), RepositoryError> {
        let version = to_column(document_version(&document))?;
        let expected_column = to_column(expected)?;

        // A missing row counts as version 0, so the first write is an insert.
        let result = if expected == 0 {
            sqlx::query(
                r#"
                INSERT INTO documents (key, body, version, updated_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (key) DO UPDATE
                SET body = EXCLUDED.body, version = EXCLUDED.version, updated_at = NOW()
                WHERE documents.version = $4
                "#,
            )
            .bind(key)
            .bind(&document)
            .bind(version)
            .bind(expected_column)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE documents
                SET body = $2, version = $3, updated_at = NOW()
                WHERE key = $1 AND version = $4
                "#,
            )
            .bind(key)
            .bind(&document)
            .bind(version)
            .bind(expected_column)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            let found = self.stored_version(key).await?;
            debug!(key = %key, expected, found, "Rejected stale write");
            return Err(RepositoryError::VersionConflict {
                key: key.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        db::health_check(&self.pool).await
    }
}
