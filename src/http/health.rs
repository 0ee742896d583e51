use actix_web::{web, HttpResponse, Result};
use tracing::error;

use crate::api_error::ApiError;
use crate::http::tournament_handler::AppState;
use crate::repository::Repository;

/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    if let Err(e) = state.tournament_service.store().repository().ping().await {
        error!(error = %e, "Storage health check failed");
        return Err(e.into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "storage": "ok",
        "ts": chrono::Utc::now().timestamp()
    })))
}
