// circuitgate-api/src/server.rs
// ============================================================================
// Module: API Server
// Description: Wires routes, middleware, and state into a bindable
//              `axum::Router` and runs it.
// Purpose: The single place that assembles the HTTP surface in §6 behind
//          CORS, rate limiting, and a body-size ceiling.
// Dependencies: axum, tower-http
// ============================================================================

//! ## Overview
//! Middleware order, outermost to innermost: CORS, then rate limiting
//! (exempting health/OpenAPI, which are merged in as a separate,
//! unwrapped sub-router), then the route handlers themselves. The body
//! size limit is a router-level layer so an oversized request is rejected
//! before a handler — or even multipart parsing — runs.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use circuitgate_core::MAX_ARTIFACT_BYTES;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;

use crate::middleware as mw;
use crate::routes;
use crate::state::AppState;

/// Errors starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address {0:?}: {1}")]
    InvalidBindAddr(String, std::io::Error),
    /// Binding the TCP listener failed.
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    /// The server stopped because of an I/O error.
    #[error("server error: {0}")]
    Serve(std::io::Error),
    /// A configured CORS origin was not a valid header value.
    #[error("invalid CORS origin {0:?}")]
    InvalidCorsOrigin(String),
}

/// The bound, ready-to-run HTTP server.
pub struct ApiServer {
    addr: SocketAddr,
    router: Router,
}

impl ApiServer {
    /// Builds the server's router from `state`, resolving the bind address
    /// from `state.config.bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidBindAddr`] when the configured bind
    /// address cannot be parsed, or [`ServerError::InvalidCorsOrigin`]
    /// when a configured CORS origin is not a valid header value.
    pub fn new(state: AppState) -> Result<Self, ServerError> {
        let addr: SocketAddr = state
            .config
            .bind_addr
            .parse()
            .map_err(|e| ServerError::InvalidBindAddr(state.config.bind_addr.clone(), std::io::Error::other(e)))?;
        let router = Self::build_router(state)?;
        Ok(Self { addr, router })
    }

    fn build_router(state: AppState) -> Result<Router, ServerError> {
        let cors = cors_layer(&state.config.cors_allowed_origins)?;

        let authenticated = routes::router()
            .layer(middleware::from_fn_with_state(state.clone(), mw::rate_limit))
            .with_state(state.clone());
        let exempt = routes::exempt_router().with_state(state);
        let max_body_bytes = usize::try_from(MAX_ARTIFACT_BYTES).unwrap_or(usize::MAX);

        let router = Router::new()
            .merge(authenticated)
            .merge(exempt)
            .layer(cors)
            .layer(DefaultBodyLimit::max(max_body_bytes));
        Ok(router)
    }

    /// The address the server will bind to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns a clone of the assembled router, for in-process testing with
    /// `tower::ServiceExt::oneshot`.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Binds and serves until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] or [`ServerError::Serve`] on I/O
    /// failure.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| ServerError::Bind(self.addr, e))?;
        axum::serve(listener, self.router).await.map_err(ServerError::Serve)
    }

    /// Binds and serves until `shutdown_signal` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] or [`ServerError::Serve`] on I/O
    /// failure.
    pub async fn run_until<F>(self, shutdown_signal: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| ServerError::Bind(self.addr, e))?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, ServerError> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::new());
    }
    let mut origins = Vec::with_capacity(allowed_origins.len());
    for origin in allowed_origins {
        let value = axum::http::HeaderValue::from_str(origin).map_err(|_| ServerError::InvalidCorsOrigin(origin.clone()))?;
        origins.push(value);
    }
    Ok(CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_credentials(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_yields_a_permissive_default_layer() {
        let result = cors_layer(&[]);
        assert!(result.is_ok());
    }

    #[test]
    fn malformed_origin_is_rejected() {
        let result = cors_layer(&["not a valid header value \n".to_string()]);
        assert!(matches!(result, Err(ServerError::InvalidCorsOrigin(_))));
    }
}
