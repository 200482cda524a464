// circuitgate-api/src/lib.rs
// ============================================================================
// Module: Circuitgate API
// Description: The HTTP surface — ingestion (C11), review (C12), and report
//              (C13) — plus the auth, rate-limiting, and CORS seams the
//              surface depends on.
// Purpose: Translate §6's HTTP surface into axum routes over the
//          backend-agnostic traits in `circuitgate-core`, with no backend
//          (SQLite, S3, the broker, the LLM provider) named here.
// Dependencies: circuitgate-core, axum, axum-extra, tower-http, argon2,
//               jsonwebtoken
// ============================================================================

//! ## Overview
//! `circuitgate-api` is the only crate in the workspace that speaks HTTP.
//! It owns three responsibilities the spec calls out as components in
//! their own right:
//!
//! - C11 Ingestion API (`routes::upload`, `routes::tasks`)
//! - C12 Review API (`routes::analyses`)
//! - C13 Report Adapter (`report_adapter`), fed to an external
//!   [`circuitgate_core::ReportRenderer`]
//!
//! Everything else — users, tasks, analyses, findings, audit events, the
//! object store, the job broker — is reached only through the trait
//! objects bundled in [`state::AppState`].

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod ratelimit;
pub mod report_adapter;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::AuthUser;
pub use config::AppConfig;
pub use config::ConfigError;
pub use error::ApiError;
pub use server::ApiServer;
pub use server::ServerError;
pub use state::AppState;
