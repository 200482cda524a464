// circuitgate-api/src/routes/auth.rs
// ============================================================================
// Module: Auth Routes
// Description: `POST /api/auth/register`, `POST /api/auth/login`.
// Purpose: The minimal identity surface needed to exercise real ownership
//          checks across the rest of the API (§6).
// Dependencies: circuitgate-core, axum, serde
// ============================================================================

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use circuitgate_core::AppError;
use circuitgate_core::User;
use circuitgate_core::UserId;
use circuitgate_core::UserStoreError;
use serde::Deserialize;
use serde::Serialize;

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;

/// Minimum acceptable password length (§6 "weak" rejection).
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    token: String,
    user_id: String,
}

/// `POST /api/auth/register` — creates a user and returns a bearer token.
///
/// # Errors
///
/// Returns [`ApiError`] with a `400` status on a duplicate email or a
/// password shorter than [`MIN_PASSWORD_LEN`].
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<(StatusCode, Json<TokenBody>), ApiError> {
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::coded(
            AppError::InvalidInput(format!("password must be at least {MIN_PASSWORD_LEN} characters")),
            "AUTH_001",
        ));
    }
    let password_hash = auth::hash_password(&body.password)
        .map_err(|e| ApiError::coded(AppError::Internal(e.to_string()), "AUTH_002"))?;
    let user = User {
        id: UserId::new(),
        email: body.email,
        password_hash,
        active: true,
        created_at: time::OffsetDateTime::now_utc(),
    };
    state.user_store.create(&user).await.map_err(|e| match e {
        UserStoreError::DuplicateEmail(email) => {
            ApiError::coded(AppError::InvalidInput(format!("email already registered: {email}")), "AUTH_003")
        }
        UserStoreError::Io(message) => ApiError::new(AppError::Internal(message)),
    })?;
    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry)?;
    Ok((StatusCode::CREATED, Json(TokenBody { token, user_id: user.id.to_string() })))
}

/// `POST /api/auth/login` — exchanges credentials for a bearer token.
///
/// # Errors
///
/// Returns [`ApiError`] with a `401` status when the email is unknown, the
/// account is inactive, or the password does not match.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<TokenBody>, ApiError> {
    let user = state
        .user_store
        .get_by_email(&body.email)
        .await
        .map_err(|e| ApiError::new(AppError::Internal(e.to_string())))?
        .filter(|u| u.active)
        .ok_or_else(|| ApiError::coded(AppError::Authentication, "AUTH_004"))?;
    auth::verify_password(&body.password, &user.password_hash)
        .map_err(|_| ApiError::coded(AppError::Authentication, "AUTH_004"))?;
    let token = auth::issue_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry)?;
    Ok(Json(TokenBody { token, user_id: user.id.to_string() }))
}
