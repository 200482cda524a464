// circuitgate-api/src/auth.rs
// ============================================================================
// Module: API Authentication
// Description: Password hashing, JWT issuance/verification, and the bearer-
//              token extractor every authenticated route depends on.
// Purpose: The minimal in-crate stand-in for the auth subsystem the spec
//          treats as an external collaborator (§1) — just enough to give
//          C11/C12 a real, verified caller identity end to end.
// Dependencies: circuitgate-core, argon2, jsonwebtoken, axum
// ============================================================================

//! ## Overview
//! Registration and login hash/verify with Argon2id; authenticated routes
//! extract a [`AuthUser`] from the `Authorization: Bearer <jwt>` header.
//! Token claims carry only the subject (`UserId`) and an expiry — no
//! scopes or tenant context, since multi-tenant isolation is a named
//! non-goal (§1).

use argon2::Argon2;
use argon2::PasswordHash;
use argon2::PasswordHasher;
use argon2::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use circuitgate_core::AppError;
use circuitgate_core::UserId;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::state::AppState;

/// Errors hashing or verifying a password.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The hash could not be parsed or computed.
    #[error("password hashing error: {0}")]
    Hash(String),
    /// The supplied password did not match the stored hash.
    #[error("password does not match")]
    Mismatch,
}

/// Hashes `password` with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if the underlying KDF call fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verifies `password` against a previously stored Argon2 hash.
///
/// # Errors
///
/// Returns [`PasswordError::Hash`] if `stored_hash` is malformed, or
/// [`PasswordError::Mismatch`] if the password does not match.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

/// JWT claims: subject and expiry only.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// The authenticated user's identifier, as a string.
    sub: String,
    /// Expiry, Unix seconds.
    exp: i64,
}

/// Issues a signed JWT for `user_id`, expiring after `expiry`.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if token encoding fails.
pub fn issue_token(user_id: UserId, secret: &str, expiry: std::time::Duration) -> Result<String, AppError> {
    let expires_at = time::OffsetDateTime::now_utc() + expiry;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at.unix_timestamp(),
    };
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("token issuance failed: {e}")))
}

/// Verifies a bearer token and returns the subject's [`UserId`].
///
/// # Errors
///
/// Returns [`AppError::Authentication`] when the token is malformed,
/// expired, or signed with the wrong key.
pub fn verify_token(token: &str, secret: &str) -> Result<UserId, AppError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Authentication)?;
    data.claims.sub.parse().map_err(|_| AppError::Authentication)
}

/// The authenticated caller's identity, extracted from a verified bearer
/// token. Every ownership check downstream compares against `self.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl AuthUser {
    /// The caller's identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = crate::error::ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Authentication)?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AppError::Authentication)?;
        let user_id = verify_token(token, &state.config.jwt_secret)?;
        Ok(Self(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("correct horse battery staple").expect("hashes");
        verify_password("correct horse battery staple", &hash).expect("verifies");
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct horse battery staple").expect("hashes");
        let result = verify_password("wrong password", &hash);
        assert!(matches!(result, Err(PasswordError::Mismatch)));
    }

    #[test]
    fn issued_token_verifies_back_to_the_same_user() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "a-sufficiently-long-test-secret", std::time::Duration::from_secs(60))
            .expect("issues");
        let verified = verify_token(&token, "a-sufficiently-long-test-secret").expect("verifies");
        assert_eq!(verified, user_id);
    }

    #[test]
    fn token_signed_with_a_different_secret_is_rejected() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "secret-one-long-enough", std::time::Duration::from_secs(60)).expect("issues");
        let result = verify_token(&token, "secret-two-long-enough");
        assert!(matches!(result, Err(AppError::Authentication)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "a-sufficiently-long-test-secret", std::time::Duration::from_secs(0))
            .expect("issues");
        std::thread::sleep(std::time::Duration::from_secs(1));
        let result = verify_token(&token, "a-sufficiently-long-test-secret");
        assert!(matches!(result, Err(AppError::Authentication)));
    }
}
