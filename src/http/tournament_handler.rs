use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api_error::ApiError;
use crate::auth::Identity;
use crate::models::*;
use crate::repository::DocumentStore;
use crate::service::TournamentService;

/// Application state shared by every worker
pub struct AppState {
    pub tournament_service: Arc<TournamentService<DocumentStore>>,
}

fn parse_category(raw: &str) -> Result<Category, ApiError> {
    raw.parse().map_err(ApiError::InvalidInput)
}

// =============================================================================
// PLAYERS
// =============================================================================

/// GET /api/{category}/players
pub async fn list_players(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let players = state.tournament_service.list_players(category).await?;
    Ok(HttpResponse::Ok().json(json!({ "players": players })))
}

/// POST /api/{category}/players
pub async fn create_player(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    req: web::Json<CreatePlayerRequest>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let player = state
        .tournament_service
        .create_player(&identity, category, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "player": player })))
}

// =============================================================================
// GROUPS
// =============================================================================

/// GET /api/{category}/groups
pub async fn list_groups(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let groups = state.tournament_service.list_groups(category).await?;
    Ok(HttpResponse::Ok().json(json!({ "groups": groups })))
}

/// POST /api/{category}/groups/generate
pub async fn generate_groups(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    info!(category = %category, subject = %identity.subject, "Received generate groups request");
    let generated = state.tournament_service.generate_groups(&identity, category).await?;
    Ok(HttpResponse::Ok().json(generated))
}

/// PUT /api/{category}/groups/{group_id}
pub async fn upsert_group(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
    req: web::Json<UpsertGroupRequest>,
) -> Result<impl Responder, ApiError> {
    let (category, group_id) = path.into_inner();
    let category = parse_category(&category)?;
    let group = state
        .tournament_service
        .upsert_group(&identity, category, &group_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "group": group })))
}

// =============================================================================
// MATCHES
// =============================================================================

/// GET /api/{category}/matches?phase=group|elimination
pub async fn list_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PhaseQuery>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let matches = state.tournament_service.list_matches(category, query.phase).await?;
    Ok(HttpResponse::Ok().json(json!({ "matches": matches })))
}

/// POST /api/{category}/matches
pub async fn create_match(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    req: web::Json<CreateMatchRequest>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let created = state
        .tournament_service
        .create_match(&identity, category, req.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(json!({ "match": created })))
}

/// PATCH /api/{category}/matches/{match_id}
pub async fn update_match(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
    req: web::Json<UpdateMatchRequest>,
) -> Result<impl Responder, ApiError> {
    let (category, match_id) = path.into_inner();
    let category = parse_category(&category)?;
    let updated = state
        .tournament_service
        .update_match(&identity, category, &match_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "match": updated })))
}

/// DELETE /api/{category}/matches/{match_id}?phase=group|elimination
pub async fn delete_match(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
    query: web::Query<PhaseQuery>,
) -> Result<impl Responder, ApiError> {
    let (category, match_id) = path.into_inner();
    let category = parse_category(&category)?;
    state
        .tournament_service
        .delete_match(&identity, category, &match_id, query.phase)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "deleted": match_id })))
}

/// POST /api/{category}/matches/{match_id}/score
pub async fn update_score(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
    req: web::Json<UpdateScoreRequest>,
) -> Result<impl Responder, ApiError> {
    let (category, match_id) = path.into_inner();
    let category = parse_category(&category)?;
    info!(
        category = %category,
        match_id = %match_id,
        subject = %identity.subject,
        "Received score update"
    );
    let updated = state
        .tournament_service
        .update_score(&identity, category, &match_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "match": updated })))
}

// =============================================================================
// STANDINGS & BRACKET
// =============================================================================

/// GET /api/{category}/standings
pub async fn get_standings(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let standings = state.tournament_service.get_standings(category).await?;
    Ok(HttpResponse::Ok().json(standings))
}

/// POST /api/{category}/standings/compute
pub async fn compute_standings(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let standings = state.tournament_service.compute_standings(&identity, category).await?;
    Ok(HttpResponse::Ok().json(json!({ "standings": standings })))
}

/// GET /api/{category}/bracket
pub async fn get_bracket(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    let bracket = state.tournament_service.get_bracket(category).await?;
    Ok(HttpResponse::Ok().json(bracket))
}

/// POST /api/{category}/bracket/seed
pub async fn seed_bracket(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> Result<impl Responder, ApiError> {
    let category = parse_category(&path)?;
    info!(category = %category, subject = %identity.subject, "Received bracket seeding request");
    let seeded = state.tournament_service.seed_bracket(&identity, category).await?;
    Ok(HttpResponse::Ok().json(seeded))
}

/// Body and query rejections use the same error shape as everything else.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| ApiError::invalid_input(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| ApiError::invalid_input(err.to_string()).into())
}

/// Configure tournament routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(crate::http::health::health_check));
    cfg.service(
        web::scope("/api/{category}")
            .app_data(json_config())
            .app_data(query_config())
            .route("/players", web::get().to(list_players))
            .route("/players", web::post().to(create_player))
            .route("/groups", web::get().to(list_groups))
            .route("/groups/generate", web::post().to(generate_groups))
            .route("/groups/{group_id}", web::put().to(upsert_group))
            .route("/matches", web::get().to(list_matches))
            .route("/matches", web::post().to(create_match))
            .route("/matches/{match_id}", web::patch().to(update_match))
            .route("/matches/{match_id}", web::delete().to(delete_match))
            .route("/matches/{match_id}/score", web::post().to(update_score))
            .route("/standings", web::get().to(get_standings))
            .route("/standings/compute", web::post().to(compute_standings))
            .route("/bracket", web::get().to(get_bracket))
            .route("/bracket/seed", web::post().to(seed_bracket)),
    );
}
