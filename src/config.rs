use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub concurrency: ConcurrencyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub rust_log: String,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("STORAGE_BACKEND must be postgres|memory, got '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Leading path segment of every document key.
    pub namespace: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConcurrencyConfig {
    /// Total tries for a versioned write before reporting a conflict.
    pub write_attempts: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { write_attempts: 3 }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let port: u16 = env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse()?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty() && o != "*");
        let jwt_secret = env::var("JWT_SECRET")?;
        let backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;
        let database_url = env::var("DATABASE_URL").ok();
        let max_connections: u32 = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?;
        let namespace = env::var("DATA_NAMESPACE").unwrap_or_else(|_| "data".to_string());
        let write_attempts: u32 = env::var("WRITE_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()?;

        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }
        if write_attempts == 0 {
            anyhow::bail!("WRITE_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            server: ServerConfig {
                port,
                host,
                rust_log,
                cors_origin,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
                namespace,
            },
            auth: AuthConfig { jwt_secret },
            concurrency: ConcurrencyConfig { write_attempts },
        })
    }
}
