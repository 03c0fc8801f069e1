//! JSON HTTP server.
//!
//! Exposes one shared [`Catalog`] session over a small REST API so a browser
//! dashboard can render the view list, charts, favorites and comparison.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/plants` | Filtered, sorted view (query: filter params) |
//! | `GET`  | `/plants/{id}` | One plant |
//! | `GET`  | `/stats` | Aggregate statistics |
//! | `GET`  | `/summary` | Headline counters |
//! | `GET`  | `/options` | Habits and statuses present in the collection |
//! | `GET`  | `/favorites` | Favorited plants |
//! | `POST` | `/favorites/{id}` | Toggle a favorite (404 for unknown plants) |
//! | `GET`  | `/compare` | Current comparison table |
//! | `POST` | `/compare/{id}` | Add a plant to the comparison (404 for unknown plants) |
//! | `DELETE` | `/compare/{id}` | Remove a plant from the comparison |
//! | `DELETE` | `/compare` | Clear the comparison |
//! | `POST` | `/refresh` | Invalidate the cache and refetch |
//! | `GET`  | `/categories` | Category catalog |
//! | `GET`  | `/locations` | Location catalog |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "limit_reached", "message": "at most 4 plants can be compared" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `limit_reached` (409),
//! `upstream_unavailable` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use flora_catalog_core::compare::{ComparisonTable, SelectionChange, MAX_COMPARE};
use flora_catalog_core::models::{Category, Location, PlantRecord};
use flora_catalog_core::stats::{AggregateStatistics, CatalogSummary};
use flora_catalog_core::view::FilterOptions;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::params::FilterParams;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
}

/// Starts the HTTP server on `[server].bind` and serves until terminated.
pub async fn run_server(config: &Config, catalog: Arc<Catalog>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(catalog);

    info!(addr = %bind_addr, "server listening");
    eprintln!("Flora Catalog server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Exposed for in-process tests.
pub fn router(catalog: Arc<Catalog>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/plants", get(handle_list_plants))
        .route("/plants/{id}", get(handle_get_plant))
        .route("/stats", get(handle_stats))
        .route("/summary", get(handle_summary))
        .route("/options", get(handle_options))
        .route("/favorites", get(handle_list_favorites))
        .route("/favorites/{id}", post(handle_toggle_favorite))
        .route("/compare", get(handle_compare).delete(handle_clear_compare))
        .route(
            "/compare/{id}",
            post(handle_compare_add).delete(handle_compare_remove),
        )
        .route("/refresh", post(handle_refresh))
        .route("/categories", get(handle_categories))
        .route("/locations", get(handle_locations))
        .layer(cors)
        .with_state(AppState { catalog })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Machine-readable code plus human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn limit_reached() -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "limit_reached".to_string(),
        message: format!("at most {} plants can be compared", MAX_COMPARE),
    }
}

/// The record source failed; the cached collection is unchanged.
fn upstream(err: anyhow::Error) -> AppError {
    warn!(error = %format!("{:#}", err), "upstream request failed");
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_unavailable".to_string(),
        message: format!("{:#}", err),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Plants ============

#[derive(Serialize)]
struct PlantListResponse {
    count: usize,
    results: Vec<PlantRecord>,
}

async fn handle_list_plants(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<PlantListResponse>, AppError> {
    let spec = params.to_spec().map_err(|e| bad_request(e.to_string()))?;
    let results = state.catalog.view(&spec).await.map_err(upstream)?;
    Ok(Json(PlantListResponse {
        count: results.len(),
        results,
    }))
}

async fn handle_get_plant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PlantRecord>, AppError> {
    state
        .catalog
        .get(id)
        .await
        .map_err(upstream)?
        .map(Json)
        .ok_or_else(|| not_found(format!("plant not found: {}", id)))
}

async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<AggregateStatistics>, AppError> {
    Ok(Json(state.catalog.statistics().await.map_err(upstream)?))
}

async fn handle_summary(State(state): State<AppState>) -> Result<Json<CatalogSummary>, AppError> {
    Ok(Json(state.catalog.summary().await.map_err(upstream)?))
}

async fn handle_options(State(state): State<AppState>) -> Result<Json<FilterOptions>, AppError> {
    Ok(Json(state.catalog.options().await.map_err(upstream)?))
}

#[derive(Serialize)]
struct RefreshResponse {
    count: usize,
    fetched_at: i64,
}

async fn handle_refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    let envelope = state.catalog.refresh().await.map_err(upstream)?;
    Ok(Json(RefreshResponse {
        count: envelope.records.len(),
        fetched_at: envelope.fetched_at,
    }))
}

// ============ Favorites ============

#[derive(Serialize)]
struct FavoritesResponse {
    ids: Vec<i64>,
    plants: Vec<PlantRecord>,
}

async fn handle_list_favorites(
    State(state): State<AppState>,
) -> Result<Json<FavoritesResponse>, AppError> {
    let plants = state.catalog.favorite_records().await.map_err(upstream)?;
    Ok(Json(FavoritesResponse {
        ids: state.catalog.favorites().iter().collect(),
        plants,
    }))
}

#[derive(Serialize)]
struct ToggleFavoriteResponse {
    id: i64,
    favorite: bool,
}

async fn handle_toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ToggleFavoriteResponse>, AppError> {
    let favorite = state
        .catalog
        .toggle_favorite(id)
        .await
        .map_err(upstream)?
        .ok_or_else(|| not_found(format!("plant not found: {}", id)))?;
    Ok(Json(ToggleFavoriteResponse { id, favorite }))
}

// ============ Comparison ============

#[derive(Serialize)]
struct CompareResponse {
    ids: Vec<i64>,
    table: ComparisonTable,
}

async fn compare_response(state: &AppState) -> Result<Json<CompareResponse>, AppError> {
    let table = state.catalog.comparison_table().await.map_err(upstream)?;
    Ok(Json(CompareResponse {
        ids: state.catalog.comparison().ids().to_vec(),
        table,
    }))
}

async fn handle_compare(State(state): State<AppState>) -> Result<Json<CompareResponse>, AppError> {
    compare_response(&state).await
}

async fn handle_compare_add(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CompareResponse>, AppError> {
    match state.catalog.compare_add(id).await.map_err(upstream)? {
        SelectionChange::LimitReached => return Err(limit_reached()),
        SelectionChange::UnknownPlant => {
            return Err(not_found(format!("plant not found: {}", id)))
        }
        _ => {}
    }
    compare_response(&state).await
}

async fn handle_compare_remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CompareResponse>, AppError> {
    state.catalog.compare_remove(id);
    compare_response(&state).await
}

async fn handle_clear_compare(State(state): State<AppState>) -> StatusCode {
    state.catalog.compare_clear();
    StatusCode::NO_CONTENT
}

// ============ Catalog metadata ============

async fn handle_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.catalog.categories().await.map_err(upstream)?;
    Ok(Json(categories.to_vec()))
}

async fn handle_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>, AppError> {
    let locations = state.catalog.locations().await.map_err(upstream)?;
    Ok(Json(locations.to_vec()))
}
