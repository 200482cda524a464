// circuitgate-api/src/config.rs
// ============================================================================
// Module: API Configuration
// Description: Strict, fail-closed environment-variable configuration for
//              the HTTP server — JWT signing, CORS, rate limiting, and the
//              default standard profile (§6 "Configuration").
// Purpose: One place every deployment-tunable value is read and validated,
//          rather than scattering `env::var` calls through the routes.
// Dependencies: circuitgate-core
// ============================================================================

//! ## Overview
//! Mirrors the teacher's strict-config idiom: every value has a named
//! constant default or bound, and a missing/invalid value fails closed
//! (an empty CORS allow-list, say, rather than a wildcard). Unlike the
//! teacher's TOML-file loader, these settings are small and operational
//! enough to read straight from the environment, the convention the
//! spec's §6 "Configuration (via environment)" section calls for.

use std::env;
use std::time::Duration;

use circuitgate_core::ProfileName;
use thiserror::Error;

/// Environment variable carrying the JWT signing key. Required.
pub const JWT_SECRET_ENV: &str = "CIRCUITGATE_JWT_SECRET";
/// Environment variable overriding the JWT expiry, in minutes.
pub const JWT_EXPIRY_MINUTES_ENV: &str = "CIRCUITGATE_JWT_EXPIRY_MINUTES";
/// Environment variable carrying a comma-separated CORS allow-list.
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CIRCUITGATE_CORS_ALLOWED_ORIGINS";
/// Environment variable overriding the per-identifier rate-limit cap.
pub const RATE_LIMIT_PER_MINUTE_ENV: &str = "CIRCUITGATE_RATE_LIMIT_PER_MINUTE";
/// Environment variable disabling rate limiting outright (`"false"`).
pub const RATE_LIMIT_ENABLED_ENV: &str = "CIRCUITGATE_RATE_LIMIT_ENABLED";
/// Environment variable selecting the default standard profile.
pub const DEFAULT_PROFILE_ENV: &str = "CIRCUITGATE_DEFAULT_PROFILE";
/// Environment variable overriding the HTTP bind address.
pub const BIND_ADDR_ENV: &str = "CIRCUITGATE_BIND_ADDR";

/// Default JWT expiry (§6: "JWT signing key and expiry (default 30 min)").
pub const DEFAULT_JWT_EXPIRY: Duration = Duration::from_secs(30 * 60);
/// Default per-identifier rate-limit cap (§5: "default 10").
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;
/// Default bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
/// Minimum accepted JWT secret length, to keep a deployment from signing
/// tokens with a trivially guessable key.
const MIN_JWT_SECRET_LEN: usize = 16;

/// Errors loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was absent.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    /// An environment variable's value failed validation.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Strict, fail-closed server configuration, loaded once at process start
/// and shared through [`crate::state::AppState`] (§9: "explicit
/// configuration... passed through the component graph").
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// JWT signing key. Never logged or echoed back to a caller.
    pub jwt_secret: String,
    /// JWT expiry.
    pub jwt_expiry: Duration,
    /// Explicit CORS allow-list. Never a wildcard when credentials are
    /// allowed (§6: "CORS allowed origins (explicit list, no wildcard
    /// with credentials)").
    pub cors_allowed_origins: Vec<String>,
    /// Per-identifier rate-limit cap, requests per minute.
    pub rate_limit_per_minute: u32,
    /// Whether the rate limiter is enabled at all.
    pub rate_limit_enabled: bool,
    /// The standard profile applied when a task does not name one.
    pub default_profile: ProfileName,
}

impl AppConfig {
    /// Loads configuration from the process environment, applying the
    /// documented defaults for every optional variable and failing closed
    /// on a missing or malformed required one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `CIRCUITGATE_JWT_SECRET` is
    /// absent, or [`ConfigError::Invalid`] when any variable present
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var(JWT_SECRET_ENV).map_err(|_| ConfigError::Missing(JWT_SECRET_ENV))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(
                JWT_SECRET_ENV,
                format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            ));
        }

        let jwt_expiry = match env::var(JWT_EXPIRY_MINUTES_ENV) {
            Ok(raw) => {
                let minutes: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid(JWT_EXPIRY_MINUTES_ENV, raw.clone()))?;
                if minutes == 0 {
                    return Err(ConfigError::Invalid(JWT_EXPIRY_MINUTES_ENV, raw));
                }
                Duration::from_secs(minutes * 60)
            }
            Err(_) => DEFAULT_JWT_EXPIRY,
        };

        let cors_allowed_origins = match env::var(CORS_ALLOWED_ORIGINS_ENV) {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        };
        if cors_allowed_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::Invalid(
                CORS_ALLOWED_ORIGINS_ENV,
                "wildcard origin is not permitted alongside credentialed requests".to_string(),
            ));
        }

        let rate_limit_per_minute = match env::var(RATE_LIMIT_PER_MINUTE_ENV) {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid(RATE_LIMIT_PER_MINUTE_ENV, raw))?,
            Err(_) => DEFAULT_RATE_LIMIT_PER_MINUTE,
        };

        let rate_limit_enabled = match env::var(RATE_LIMIT_ENABLED_ENV) {
            Ok(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(ConfigError::Invalid(RATE_LIMIT_ENABLED_ENV, raw)),
            },
            Err(_) => true,
        };

        let default_profile = match env::var(DEFAULT_PROFILE_ENV) {
            Ok(raw) => match raw.to_ascii_uppercase().as_str() {
                "NETA" => ProfileName::Neta,
                "MICROSOFT" => ProfileName::Microsoft,
                _ => return Err(ConfigError::Invalid(DEFAULT_PROFILE_ENV, raw)),
            },
            Err(_) => ProfileName::DEFAULT,
        };

        let bind_addr = env::var(BIND_ADDR_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_expiry,
            cors_allowed_origins,
            rate_limit_per_minute,
            rate_limit_enabled,
            default_profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            JWT_SECRET_ENV,
            JWT_EXPIRY_MINUTES_ENV,
            CORS_ALLOWED_ORIGINS_ENV,
            RATE_LIMIT_PER_MINUTE_ENV,
            RATE_LIMIT_ENABLED_ENV,
            DEFAULT_PROFILE_ENV,
            BIND_ADDR_ENV,
        ] {
            // SAFETY: tests are serialized by `ENV_LOCK`, so no other thread
            // observes the environment mid-mutation.
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn missing_jwt_secret_fails_closed() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        let result = AppConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing(JWT_SECRET_ENV))));
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        // SAFETY: serialized by `ENV_LOCK`.
        unsafe {
            env::set_var(JWT_SECRET_ENV, "0123456789abcdef0123456789abcdef");
            env::set_var(CORS_ALLOWED_ORIGINS_ENV, "*");
        }
        let result = AppConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(CORS_ALLOWED_ORIGINS_ENV, _))));
        clear_env();
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        // SAFETY: serialized by `ENV_LOCK`.
        unsafe {
            env::set_var(JWT_SECRET_ENV, "0123456789abcdef0123456789abcdef");
        }
        let config = AppConfig::from_env().expect("valid config");
        assert_eq!(config.jwt_expiry, DEFAULT_JWT_EXPIRY);
        assert_eq!(config.rate_limit_per_minute, DEFAULT_RATE_LIMIT_PER_MINUTE);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.default_profile, ProfileName::Neta);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        clear_env();
    }
}
