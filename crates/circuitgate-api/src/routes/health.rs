// circuitgate-api/src/routes/health.rs
// ============================================================================
// Module: Health Routes
// Description: `/api/health`, `/api/health/live`, `/api/health/ready`.
// Purpose: Process liveness (always 200 once the process can answer HTTP)
//          separate from readiness (every backend's own `readiness()`
//          must succeed), per §6's health-check table.
// Dependencies: axum
// ============================================================================

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

/// `GET /api/health` — an alias for `/api/health/live`.
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// `GET /api/health/live` — the process is up and serving requests.
pub async fn live() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// `GET /api/health/ready` — every backend collaborator reports ready.
///
/// Checks are run independently so one slow/unavailable backend doesn't
/// mask which one failed; the first failure determines the response.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let checks = [
        state.task_store.readiness().await.is_ok(),
        state.analysis_store.readiness().await.is_ok(),
        state.object_store.readiness().await.is_ok(),
    ];
    if checks.iter().all(|ok| *ok) {
        (StatusCode::OK, Json(HealthBody { status: "ok" }))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody { status: "not_ready" }))
    }
}
