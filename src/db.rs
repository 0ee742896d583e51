use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::StorageConfig;
use crate::repository::RepositoryError;

pub type DbPool = PgPool;

pub async fn create_pool(config: &StorageConfig) -> Result<DbPool, sqlx::Error> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL is not set".into()))?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
}

/// Create the document table if this database has never been used.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            key TEXT PRIMARY KEY,
            body JSONB NOT NULL,
            version BIGINT NOT NULL DEFAULT 0,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;
    info!("Document schema ready");
    Ok(())
}

pub async fn health_check(pool: &DbPool) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
