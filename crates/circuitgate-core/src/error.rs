// circuitgate-core/src/error.rs
// ============================================================================
// Module: Circuitgate Error Taxonomy
// Description: The shared error enum every component resolves into.
// Purpose: Let the HTTP layer translate failures into stable status codes
//          without every crate re-deriving its own mapping.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! `AppError` is the taxonomy from the error-handling design: each variant
//! carries enough context for a safe, user-facing message while the
//! underlying cause (when present) stays out of band.

use thiserror::Error;

/// The error taxonomy shared across the workspace.
///
/// # Invariants
/// - Variants are stable for programmatic handling by the HTTP layer.
/// - Messages are safe to return to callers; never format internal details
///   (connection strings, stack traces) into a variant's message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or out-of-range user input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid authentication token.
    #[error("authentication required")]
    Authentication,

    /// Authenticated caller is not the resource owner.
    #[error("access denied")]
    Authorization,

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A precondition for the requested operation was not met.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The caller exceeded its rate limit.
    #[error("rate limit exceeded")]
    RateLimited,

    /// An upstream collaborator (object store, broker, LLM provider) failed.
    #[error("upstream failure: {0}")]
    External(String),

    /// An uncategorized failure; the message is a safe summary only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code this variant maps to.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Authentication => 401,
            Self::Authorization => 403,
            Self::NotFound(_) => 404,
            Self::InvalidState(_) => 400,
            Self::RateLimited => 429,
            Self::External(_) => 502,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_never_echo_raw_internals() {
        let err = AppError::Internal("safe summary".to_string());
        assert_eq!(err.to_string(), "internal error: safe summary");
    }
}
