//! HTTP API for federated search and single-record reindexing.
//!
//! The serving boundary assumes an upstream auth layer: the principal
//! arrives as `x-user-id` / `x-user-role` headers attached to the
//! request. No session handling happens here.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/search?q=...` | Federated search as the request principal |
//! | `GET`  | `/api/search/projects` | Paginated project search |
//! | `GET`  | `/api/search/discussions` | Paginated discussion search |
//! | `GET`  | `/api/search/learning` | Paginated learning-content search |
//! | `POST` | `/internal/reindex/projects/{id}` | Refresh one project document |
//! | `POST` | `/internal/reindex/discussions/{id}` | Refresh one discussion document |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! The per-collection endpoints take `q` plus optional `page`, `limit`,
//! and `sort` parameters; `/api/search/learning` additionally accepts a
//! `category` facet filter.
//!
//! # Error Contract
//!
//! Failures never propagate as unhandled errors; the handler always
//! produces the structured envelope:
//!
//! ```json
//! { "success": false, "error": "invalid search query: query must not be empty" }
//! ```
//!
//! with HTTP 400. The `details` field (error chain) is included only in
//! non-production configuration.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::Config;
use crate::engine::{HttpSearchEngine, SearchEngine};
use crate::error::SearchError;
use crate::query::{
    collection_search, global_search, CollectionParams, CollectionSearchResponse, Principal,
    SearchResponse,
};
use crate::schema::ContentType;
use crate::store::{SourceStore, SqliteStore};
use crate::writer::{update_discussion_index, update_project_index};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<dyn SearchEngine>,
    store: Arc<dyn SourceStore>,
    /// Suppresses the `details` field in failure envelopes.
    production: bool,
}

/// Start the search HTTP server with engine and store built from config.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine: Arc<dyn SearchEngine> = Arc::new(HttpSearchEngine::from_config(&config.engine)?);
    let store: Arc<dyn SourceStore> = Arc::new(SqliteStore::connect(&config.db).await?);

    let app = router(engine, store, config.server.is_production());

    println!("Search API listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router over injected capabilities. Split out from
/// [`run_server`] so tests can mount fakes.
pub fn router(
    engine: Arc<dyn SearchEngine>,
    store: Arc<dyn SourceStore>,
    production: bool,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        engine,
        store,
        production,
    };

    Router::new()
        .route("/api/search", get(handle_search))
        .route("/api/search/projects", get(handle_search_projects))
        .route("/api/search/discussions", get(handle_search_discussions))
        .route("/api/search/learning", get(handle_search_learning))
        .route("/internal/reindex/projects/{id}", post(handle_reindex_project))
        .route(
            "/internal/reindex/discussions/{id}",
            post(handle_reindex_discussion),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Envelopes ============

/// Success envelope for `GET /api/search`.
#[derive(Serialize)]
struct SearchEnvelope {
    success: bool,
    #[serde(flatten)]
    body: SearchResponse,
}

/// Failure envelope for all endpoints.
#[derive(Serialize)]
struct FailureEnvelope {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

struct AppFailure {
    error: SearchError,
    production: bool,
}

impl IntoResponse for AppFailure {
    fn into_response(self) -> Response {
        let details = if self.production {
            None
        } else {
            Some(format!("{:?}", self.error))
        };
        let envelope = FailureEnvelope {
            success: false,
            error: self.error.to_string(),
            details,
        };
        (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
    }
}

// ============ GET /api/search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

/// Build the request principal from upstream auth headers.
fn principal_from_headers(headers: &HeaderMap) -> Principal {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let role = headers.get("x-user-role").and_then(|v| v.to_str().ok());
    Principal::from_parts(id, role)
}

/// Handler for `GET /api/search`.
///
/// Never propagates an unhandled error: every failure becomes the
/// structured 400 envelope.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Result<Json<SearchEnvelope>, AppFailure> {
    let principal = principal_from_headers(&headers);

    let body = global_search(state.engine.as_ref(), &params.q, &principal)
        .await
        .map_err(|error| {
            warn!(%error, "search request failed");
            AppFailure {
                error,
                production: state.production,
            }
        })?;

    Ok(Json(SearchEnvelope {
        success: true,
        body,
    }))
}

// ============ GET /api/search/{projects,discussions,learning} ============

#[derive(Deserialize)]
struct CollectionSearchQuery {
    #[serde(default)]
    q: String,
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
    category: Option<String>,
}

impl CollectionSearchQuery {
    fn params(&self) -> CollectionParams {
        CollectionParams {
            page: self.page,
            limit: self.limit,
            sort: self.sort.clone(),
            category: self.category.clone(),
        }
    }
}

/// Success envelope for the per-collection endpoints.
#[derive(Serialize)]
struct CollectionEnvelope {
    success: bool,
    #[serde(flatten)]
    body: CollectionSearchResponse,
}

/// Shared body of the three per-collection handlers.
async fn handle_collection_search(
    state: &AppState,
    content_type: ContentType,
    params: CollectionSearchQuery,
    headers: &HeaderMap,
) -> Result<Json<CollectionEnvelope>, AppFailure> {
    let principal = principal_from_headers(headers);

    let body = collection_search(
        state.engine.as_ref(),
        content_type,
        &params.q,
        &principal,
        &params.params(),
    )
    .await
    .map_err(|error| {
        warn!(%error, collection = content_type.collection_name(), "collection search failed");
        AppFailure {
            error,
            production: state.production,
        }
    })?;

    Ok(Json(CollectionEnvelope {
        success: true,
        body,
    }))
}

async fn handle_search_projects(
    State(state): State<AppState>,
    Query(params): Query<CollectionSearchQuery>,
    headers: HeaderMap,
) -> Result<Json<CollectionEnvelope>, AppFailure> {
    handle_collection_search(&state, ContentType::Project, params, &headers).await
}

async fn handle_search_discussions(
    State(state): State<AppState>,
    Query(params): Query<CollectionSearchQuery>,
    headers: HeaderMap,
) -> Result<Json<CollectionEnvelope>, AppFailure> {
    handle_collection_search(&state, ContentType::Discussion, params, &headers).await
}

async fn handle_search_learning(
    State(state): State<AppState>,
    Query(params): Query<CollectionSearchQuery>,
    headers: HeaderMap,
) -> Result<Json<CollectionEnvelope>, AppFailure> {
    handle_collection_search(&state, ContentType::LearningContent, params, &headers).await
}

// ============ POST /internal/reindex/... ============

#[derive(Serialize)]
struct ReindexEnvelope {
    success: bool,
}

/// Handler for `POST /internal/reindex/projects/{id}`. Fired by the
/// source of truth's change-notification path; a missing record is
/// benign and still reports success.
async fn handle_reindex_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReindexEnvelope>, AppFailure> {
    update_project_index(state.engine.as_ref(), state.store.as_ref(), id)
        .await
        .map_err(|error| {
            warn!(%error, project_id = id, "project reindex failed");
            AppFailure {
                error,
                production: state.production,
            }
        })?;

    Ok(Json(ReindexEnvelope { success: true }))
}

/// Handler for `POST /internal/reindex/discussions/{id}`.
async fn handle_reindex_discussion(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReindexEnvelope>, AppFailure> {
    update_discussion_index(state.engine.as_ref(), state.store.as_ref(), id)
        .await
        .map_err(|error| {
            warn!(%error, discussion_id = id, "discussion reindex failed");
            AppFailure {
                error,
                production: state.production,
            }
        })?;

    Ok(Json(ReindexEnvelope { success: true }))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "u1".parse().unwrap());
        headers.insert("x-user-role", "member".parse().unwrap());

        let principal = principal_from_headers(&headers);
        assert_eq!(principal.id.as_deref(), Some("u1"));
        assert!(!principal.elevated);
    }

    #[test]
    fn test_admin_role_is_elevated() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "a1".parse().unwrap());
        headers.insert("x-user-role", "admin".parse().unwrap());

        assert!(principal_from_headers(&headers).elevated);
    }

    #[test]
    fn test_blank_user_id_treated_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", "  ".parse().unwrap());

        assert!(principal_from_headers(&headers).id.is_none());
    }

    #[test]
    fn test_failure_envelope_hides_details_in_production() {
        let failure = FailureEnvelope {
            success: false,
            error: "invalid search query: query must not be empty".to_string(),
            details: None,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("details").is_none());
    }
}
