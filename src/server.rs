//! HTTP server for related-post lookups.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/posts/{id}/related?limit=N` | Ranked related posts |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! A successful related lookup answers
//!
//! ```json
//! { "data": [ { "id": "…", "slug": "…", "title": "…", "score": 7 } ] }
//! ```
//!
//! with a `Cache-Control` header built from `[server]` (by default
//! `public, s-maxage=300, stale-while-revalidate=600`). An unknown or
//! unpublished post id is not an error; it yields `{ "data": [] }`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be at most 20, got 21" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404, unknown route),
//! `internal` (500). Internal failures are logged in full and answered
//! with a generic message.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use folio_core::models::RelatedResult;
use folio_core::related::{related_items_by_id, RelatedQuery};
use folio_core::store::ContentStore;

use crate::config::{Config, LimitError, RelatedConfig};
use crate::db;
use crate::related::canonical_post_id;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn ContentStore>,
    cache_control: Arc<str>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ContentStore>) -> Self {
        let cache_control = config.server.cache_control().into();
        Self {
            config: Arc::new(config),
            store,
            cache_control,
        }
    }
}

/// Build the router with all routes and layers. Exposed so tests and
/// embedding binaries can serve it on their own listener.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/posts/{id}/related", get(handle_related))
        .route("/health", get(handle_health))
        .fallback(handle_fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until Ctrl-C or
/// SIGTERM.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let state = AppState::new(config.clone(), Arc::new(store));

    let listener = TcpListener::bind(&config.server.bind).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ============ Request validation ============

/// Rejected related-posts request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelatedQueryError {
    #[error("invalid post id '{0}': expected a UUID")]
    InvalidId(String),
    #[error("invalid limit '{0}': expected a positive integer")]
    InvalidLimit(String),
    #[error(transparent)]
    Limit(#[from] LimitError),
}

/// A validated related-posts request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRequest {
    /// Post id in the lowercase hyphenated form it is stored under.
    pub id: String,
    pub query: RelatedQuery,
}

/// Validate the raw path id and `limit` query value.
pub fn parse_related_request(
    related: &RelatedConfig,
    id: &str,
    limit: Option<&str>,
) -> Result<RelatedRequest, RelatedQueryError> {
    let id = canonical_post_id(id).ok_or_else(|| RelatedQueryError::InvalidId(id.to_string()))?;

    let requested = match limit {
        Some(raw) => Some(
            raw.trim()
                .parse::<i64>()
                .map_err(|_| RelatedQueryError::InvalidLimit(raw.to_string()))?,
        ),
        None => None,
    };

    Ok(RelatedRequest {
        id,
        query: RelatedQuery {
            limit: related.resolve_limit(requested)?,
            explain: false,
        },
    })
}

/// A response that broke its own output contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("result id '{0}' is not a UUID")]
    InvalidId(String),
    #[error("result '{0}' has a zero score")]
    ZeroScore(String),
    #[error("result with id '{0}' has an empty slug")]
    EmptySlug(String),
    #[error("{count} results exceed the limit of {limit}")]
    TooMany { count: usize, limit: usize },
}

/// Check computed results against the response schema before they leave
/// the server.
pub fn validate_results(
    results: &[RelatedResult],
    limit: usize,
) -> Result<(), ContractViolation> {
    if results.len() > limit {
        return Err(ContractViolation::TooMany {
            count: results.len(),
            limit,
        });
    }
    for r in results {
        if Uuid::parse_str(&r.id).is_err() {
            return Err(ContractViolation::InvalidId(r.id.clone()));
        }
        if r.slug.is_empty() {
            return Err(ContractViolation::EmptySlug(r.id.clone()));
        }
        if r.score == 0 {
            return Err(ContractViolation::ZeroScore(r.slug.clone()));
        }
    }
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: &'static str,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
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

impl From<RelatedQueryError> for AppError {
    fn from(err: RelatedQueryError) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: rejection.body_text(),
        }
    }
}

fn internal_error() -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: "internal server error".to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ GET /api/posts/{id}/related ============

#[derive(Debug, Deserialize)]
struct RelatedParams {
    /// Kept as text so malformed values get our own 400 body.
    limit: Option<String>,
}

#[derive(Serialize)]
struct RelatedResponse {
    data: Vec<RelatedResult>,
}

async fn handle_related(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<RelatedParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params?;
    let RelatedRequest { id, query } =
        parse_related_request(&state.config.related, &id, params.limit.as_deref())?;

    let results = related_items_by_id(state.store.as_ref(), &id, &query)
        .await
        .map_err(|e| {
            error!(id = %id, error = %format!("{:#}", e), "related lookup failed");
            internal_error()
        })?;

    validate_results(&results, query.limit).map_err(|e| {
        error!(id = %id, error = %e, "related results violate the response contract");
        internal_error()
    })?;

    Ok((
        [(header::CACHE_CONTROL, state.cache_control.to_string())],
        Json(RelatedResponse { data: results }),
    )
        .into_response())
}

async fn handle_fallback() -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: "no such route".to_string(),
    }
}
