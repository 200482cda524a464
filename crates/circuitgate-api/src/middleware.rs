// circuitgate-api/src/middleware.rs
// ============================================================================
// Module: HTTP Middleware
// Description: Rate limiting keyed by authenticated user or client IP
//              (§5 "Rate limiting"), applied to every route except the
//              exempt health/OpenAPI surfaces.
// Purpose: One layer, wired once in `server.rs`, rather than a per-route
//          check each handler would otherwise have to repeat.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! The identifier preference order mirrors the spec: a verified bearer
//! token's subject first, then `X-Forwarded-For`, then a constant
//! "unknown" bucket shared by every caller the proxy didn't identify.
//! Exemptions (health, OpenAPI) are routed around this layer entirely in
//! `server.rs`'s router composition, not branched on here.

use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use circuitgate_core::AppError;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

fn client_identifier(headers: &HeaderMap, jwt_secret: &str) -> String {
    if let Some(token) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer ")))
    {
        if let Ok(user_id) = auth::verify_token(token, jwt_secret) {
            return format!("user:{user_id}");
        }
    }
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next() {
            return format!("ip:{}", ip.trim());
        }
    }
    "ip:unknown".to_string()
}

/// Enforces the per-identifier minute-bucket cap from [`AppState::rate_limiter`].
pub async fn rate_limit(State(state): State<AppState>, headers: HeaderMap, request: Request, next: Next) -> Response {
    let identifier = client_identifier(&headers, &state.config.jwt_secret);
    match state.rate_limiter.check(&identifier) {
        crate::ratelimit::RateLimitOutcome::Allowed { remaining } => {
            let mut response = next.run(request).await;
            if let Ok(value) = axum::http::HeaderValue::from_str(&remaining.to_string()) {
                response.headers_mut().insert("x-ratelimit-remaining", value);
            }
            response
        }
        crate::ratelimit::RateLimitOutcome::Limited => ApiError::new(AppError::RateLimited).into_response(),
    }
}
