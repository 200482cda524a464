// circuitgate-api/src/routes/mod.rs
// ============================================================================
// Module: Routes
// Description: Route handler modules and the router assembled from them.
// Purpose: Keep one handler module per HTTP surface area (§6), wired into
//          a single `Router` in `router()` for `server.rs` to layer
//          middleware around.
// Dependencies: axum
// ============================================================================

pub mod analyses;
pub mod auth;
pub mod health;
pub mod tasks;
pub mod upload;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;

use crate::state::AppState;

/// Builds the full `/api/...` router. Health and OpenAPI routes are
/// composed separately by `server.rs` so they can stay exempt from rate
/// limiting (§5).
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/upload", post(upload::upload))
        .route("/api/tasks/{id}", get(tasks::status))
        .route("/api/tasks/{id}/result", get(tasks::result))
        .route("/api/analyses", get(analyses::list))
        .route("/api/analyses/{id}", get(analyses::get))
        .route("/api/analyses/{id}/approve", put(analyses::approve))
        .route("/api/analyses/{id}/reject", put(analyses::reject))
        .route("/api/analyses/{id}/audit", get(analyses::audit))
        .route("/api/analyses/{id}/report", get(analyses::report))
}

/// Builds the exempt router: health checks and the OpenAPI document,
/// neither rate-limited nor authenticated (§5).
#[must_use]
pub fn exempt_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/api/openapi.json", get(crate::openapi::openapi_document))
}
