use actix_web::{web, App, HttpServer};
use std::io;
use std::sync::Arc;
use tokio::signal;

use pingpong_backend::auth::IdentityVerifier;
use pingpong_backend::config::{Config, StorageBackend};
use pingpong_backend::db::{create_pool, ensure_schema};
use pingpong_backend::http::{configure_routes, AppState};
use pingpong_backend::middleware::cors_middleware;
use pingpong_backend::repository::{DocumentStore, InMemoryRepository, PgRepository};
use pingpong_backend::service::{Store, TournamentService};
use pingpong_backend::telemetry::init_telemetry;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| startup_error("Failed to load configuration", e))?;

    // Initialize telemetry
    init_telemetry(&config.server.rust_log);

    let repository = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.storage)
                .await
                .map_err(|e| startup_error("Failed to create database pool", e))?;
            ensure_schema(&pool)
                .await
                .map_err(|e| startup_error("Failed to prepare database schema", e))?;
            DocumentStore::Postgres(PgRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            DocumentStore::Memory(InMemoryRepository::new())
        }
    };

    let store = Store::new(
        repository,
        config.storage.namespace.clone(),
        config.concurrency.write_attempts,
    );
    let state = web::Data::new(AppState {
        tournament_service: Arc::new(TournamentService::new(store)),
    });
    let verifier = web::Data::new(IdentityVerifier::new(&config.auth.jwt_secret));
    let cors_origin = config.server.cors_origin.clone();

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        backend = ?config.storage.backend,
        "Starting ping-pong tournament backend"
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(verifier.clone())
            .wrap(cors_middleware(cors_origin.as_deref()))
            .wrap(actix_web::middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind((config.server.host.clone(), config.server.port))?
    .run();

    // Graceful shutdown
    let server_handle = server.handle();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    });

    server.await
}
