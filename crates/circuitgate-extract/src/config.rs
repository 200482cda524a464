// circuitgate-extract/src/config.rs
// ============================================================================
// Module: Extraction Client Configuration
// Description: Endpoint, credentials, and retry limits for the HTTP-backed
//              extraction provider adapter.
// Purpose: Keep provider configuration in one small, `Default`-backed struct
//          rather than threading individual parameters through call sites.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Mirrors the teacher's `HttpProviderConfig` shape: one struct with a
//! conservative `Default`, constructed once and shared behind an `Arc`.

use std::time::Duration;

use url::Url;

/// Maximum attempts for a transient provider failure (§4.3: "max 3
/// attempts").
pub const MAX_PROVIDER_ATTEMPTS: u32 = 3;

/// Maximum attempts for a schema-validation failure, each re-prompting with
/// the validator's error text (§4.3: "also max 3 attempts").
pub const MAX_SCHEMA_ATTEMPTS: u32 = 3;

/// Backoff floor for transient provider retries (§4.3: "1-30 s").
const TRANSIENT_BACKOFF_FLOOR_SECONDS: u64 = 1;

/// Backoff ceiling for transient provider retries (§4.3: "1-30 s").
const TRANSIENT_BACKOFF_CEILING_SECONDS: u64 = 30;

/// Computes the backoff delay before the given (1-indexed) retry attempt.
#[must_use]
pub fn transient_backoff(attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(31);
    let seconds = TRANSIENT_BACKOFF_FLOOR_SECONDS.saturating_shl(shift);
    Duration::from_secs(seconds.min(TRANSIENT_BACKOFF_CEILING_SECONDS))
}

/// Configuration for [`crate::client::HttpExtractionClient`].
#[derive(Debug, Clone)]
pub struct HttpExtractionConfig {
    /// Base URL of the extraction provider's `extract` endpoint.
    pub endpoint: Url,
    /// Bearer credential presented to the provider.
    pub api_key: String,
    /// Model identifier passed through to the provider and echoed back in
    /// `ExtractionMetadata::model_version` when the provider does not
    /// report its own.
    pub model: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl HttpExtractionConfig {
    /// Builds a configuration pointed at `endpoint`, using `api_key` and
    /// `model`, with the crate's default timeout.
    #[must_use]
    pub fn new(endpoint: Url, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}
