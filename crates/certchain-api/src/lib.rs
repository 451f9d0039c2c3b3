//! # certchain-api: Axum API Service
//!
//! HTTP surface for CertChain. Certificates are uploaded (or submitted
//! against already-stored blobs), hashed by the registry, and resolved
//! back by content hash.
//!
//! ## Routes
//!
//! - `POST /api/certificates`: multipart upload of fields plus PDF and photo
//! - `POST /api/records`: JSON submission referencing stored blobs
//! - `GET /api/certificates/:hash`: resolve a hash to its record
//! - `GET /api/certificates/:hash/verify`: re-hash the stored record
//! - `GET /uploads/*`: uploaded blobs
//! - `GET /openapi.json`: generated OpenAPI document
//! - `GET /`, `/health/*`: health checks
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → CorsLayer → DefaultBodyLimit (API routes only)
//!
//! Handlers do no hashing or persistence themselves. They delegate to
//! `certchain-registry` and map every failure to a structured `AppError`.

pub mod blobs;
pub mod config;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::certificates::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(state.config.body_limit()));

    Router::new()
        .route("/", get(root))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(api)
        .nest_service("/uploads", ServeDir::new(state.blobs.dir()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "CertChain backend running" }))
}

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check. The store is loaded before the router exists, so this
/// only confirms the index is readable.
async fn readiness(State(state): State<AppState>) -> &'static str {
    tracing::debug!(records = state.service.len(), "readiness check");
    "ready"
}
