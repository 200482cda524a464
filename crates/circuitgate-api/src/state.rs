// circuitgate-api/src/state.rs
// ============================================================================
// Module: API Application State
// Description: The single `Clone`-cheap bundle of trait objects and
//              configuration every route handler is given via axum's
//              `State` extractor.
// Purpose: Keep every backend (store, object store, broker, report
//          renderer) reachable only through `circuitgate-core` traits, so
//          this crate never names SQLite, S3, or any LLM provider.
// Dependencies: circuitgate-core, tokio
// ============================================================================

//! ## Overview
//! Mirrors the teacher's `AppState` shape: one struct, constructed once at
//! process start, passed by value (cheap — every field is an `Arc` or a
//! small `Copy`/`Clone` value) into `axum::Router::with_state`.

use std::sync::Arc;

use circuitgate_core::AnalysisStore;
use circuitgate_core::AuditStore;
use circuitgate_core::Diagnostics;
use circuitgate_core::FindingStore;
use circuitgate_core::JobBroker;
use circuitgate_core::ObjectStore;
use circuitgate_core::ReportRenderer;
use circuitgate_core::TaskStore;
use circuitgate_core::UserStore;

use crate::config::AppConfig;
use crate::ratelimit::RateLimiter;

/// The full set of backend-agnostic collaborators the HTTP layer needs,
/// plus configuration and the in-process rate limiter.
#[derive(Clone)]
pub struct AppState {
    /// User persistence, backing register/login.
    pub user_store: Arc<dyn UserStore>,
    /// Task persistence (C2).
    pub task_store: Arc<dyn TaskStore>,
    /// Analysis persistence (C2).
    pub analysis_store: Arc<dyn AnalysisStore>,
    /// Finding persistence (C2).
    pub finding_store: Arc<dyn FindingStore>,
    /// Append-only audit persistence (C9).
    pub audit_store: Arc<dyn AuditStore>,
    /// Artifact storage (C1).
    pub object_store: Arc<dyn ObjectStore>,
    /// Job broker, for enqueueing `process_document` (C3).
    pub job_broker: Arc<dyn JobBroker>,
    /// Report bytes renderer, external per §1 (C13 delegates to this).
    pub report_renderer: Arc<dyn ReportRenderer>,
    /// Operational diagnostics sink.
    pub diagnostics: Arc<dyn Diagnostics>,
    /// Strict, fail-closed configuration loaded at process start.
    pub config: Arc<AppConfig>,
    /// Per-identifier rate limiter shared across requests.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Builds application state from its collaborators and configuration,
    /// constructing the rate limiter from `config`'s own settings.
    #[must_use]
    #[allow(
        clippy::too_many_arguments,
        reason = "one constructor wiring every backend-agnostic collaborator is clearer than a builder for a state bundled once at process start"
    )]
    pub fn new(
        user_store: Arc<dyn UserStore>,
        task_store: Arc<dyn TaskStore>,
        analysis_store: Arc<dyn AnalysisStore>,
        finding_store: Arc<dyn FindingStore>,
        audit_store: Arc<dyn AuditStore>,
        object_store: Arc<dyn ObjectStore>,
        job_broker: Arc<dyn JobBroker>,
        report_renderer: Arc<dyn ReportRenderer>,
        diagnostics: Arc<dyn Diagnostics>,
        config: AppConfig,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_per_minute, config.rate_limit_enabled));
        Self {
            user_store,
            task_store,
            analysis_store,
            finding_store,
            audit_store,
            object_store,
            job_broker,
            report_renderer,
            diagnostics,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}
