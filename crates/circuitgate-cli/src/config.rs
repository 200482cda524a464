// circuitgate-cli/src/config.rs
// ============================================================================
// Module: CLI Infrastructure Configuration
// Description: Strict, fail-closed environment loading for the pieces of
//              the component graph that are process-role-agnostic (the
//              domain store, the job queue, and object storage) plus the
//              worker-only extraction-provider and standard-profile
//              settings.
// Purpose: `serve` and `worker` share the same database and object store;
//          only `worker` additionally needs an LLM endpoint. Keeping both
//          in one strict loader mirrors `circuitgate_api::config::AppConfig`
//          rather than scattering `env::var` calls through `main.rs`.
// Dependencies: circuitgate-core, url
// ============================================================================

//! ## Overview
//! Every value here has a named default or is required; a missing or
//! malformed required value fails closed with [`ConfigError`], the same
//! shape `circuitgate_api::config::AppConfig::from_env` uses.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use circuitgate_core::ProfileName;
use thiserror::Error;
use url::Url;

/// Environment variable carrying the domain `SQLite` database path.
pub const DATABASE_PATH_ENV: &str = "CIRCUITGATE_DATABASE_PATH";
/// Environment variable carrying the job queue's `SQLite` database path.
pub const BROKER_DATABASE_PATH_ENV: &str = "CIRCUITGATE_BROKER_DATABASE_PATH";
/// Environment variable selecting the object store backend (`local` or
/// `s3`).
pub const OBJECT_STORE_BACKEND_ENV: &str = "CIRCUITGATE_OBJECT_STORE_BACKEND";
/// Environment variable carrying the local object store's root directory.
pub const OBJECT_STORE_ROOT_ENV: &str = "CIRCUITGATE_OBJECT_STORE_ROOT";
/// Environment variable carrying the S3 object store's bucket name.
pub const OBJECT_STORE_BUCKET_ENV: &str = "CIRCUITGATE_OBJECT_STORE_BUCKET";
/// Environment variable carrying the extraction provider's endpoint URL.
pub const LLM_ENDPOINT_ENV: &str = "CIRCUITGATE_LLM_ENDPOINT";
/// Environment variable carrying the extraction provider's API key.
pub const LLM_API_KEY_ENV: &str = "CIRCUITGATE_LLM_API_KEY";
/// Environment variable carrying the extraction provider's model id.
pub const LLM_MODEL_ENV: &str = "CIRCUITGATE_LLM_MODEL";
/// Environment variable selecting the default standard profile (§6).
pub const DEFAULT_PROFILE_ENV: &str = "CIRCUITGATE_DEFAULT_PROFILE";
/// Environment variable overriding the worker's job-poll interval, in
/// milliseconds.
pub const WORKER_POLL_INTERVAL_MS_ENV: &str = "CIRCUITGATE_WORKER_POLL_INTERVAL_MS";

/// Default domain database path.
pub const DEFAULT_DATABASE_PATH: &str = "circuitgate.sqlite3";
/// Default job-queue database path, deliberately a separate file from the
/// domain database (§4.2 / `circuitgate_broker::conn`).
pub const DEFAULT_BROKER_DATABASE_PATH: &str = "circuitgate-jobs.sqlite3";
/// Default local object store root directory.
pub const DEFAULT_OBJECT_STORE_ROOT: &str = "circuitgate-objects";
/// Default worker poll interval.
pub const DEFAULT_WORKER_POLL_INTERVAL: Duration = Duration::from_millis(500);

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

/// Which backend [`ObjectStoreConfig`] selects.
#[derive(Debug, Clone)]
pub enum ObjectStoreConfig {
    /// Local filesystem, rooted at the given directory.
    Local {
        /// Root directory artifacts are written under.
        root: PathBuf,
    },
    /// Amazon S3, using the process's default AWS configuration.
    S3 {
        /// Target bucket.
        bucket: String,
    },
}

impl ObjectStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env::var(OBJECT_STORE_BACKEND_ENV).unwrap_or_else(|_| "local".to_string());
        match backend.to_ascii_lowercase().as_str() {
            "local" => {
                let root = env::var(OBJECT_STORE_ROOT_ENV).unwrap_or_else(|_| DEFAULT_OBJECT_STORE_ROOT.to_string());
                Ok(Self::Local { root: PathBuf::from(root) })
            }
            "s3" => {
                let bucket = env::var(OBJECT_STORE_BUCKET_ENV).map_err(|_| ConfigError::Missing(OBJECT_STORE_BUCKET_ENV))?;
                Ok(Self::S3 { bucket })
            }
            other => Err(ConfigError::Invalid(OBJECT_STORE_BACKEND_ENV, other.to_string())),
        }
    }
}

/// Settings shared by every process role: where the domain store, job
/// queue, and object store live.
#[derive(Debug, Clone)]
pub struct InfraConfig {
    /// Domain `SQLite` database path (C2).
    pub database_path: PathBuf,
    /// Job queue `SQLite` database path (C3).
    pub broker_database_path: PathBuf,
    /// Object store backend selection (C1).
    pub object_store: ObjectStoreConfig,
}

impl InfraConfig {
    /// Loads shared infrastructure settings from the environment, applying
    /// documented defaults for every optional variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the object store backend is invalid or
    /// a backend-specific required variable is absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_path = env::var(DATABASE_PATH_ENV).unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        let broker_database_path =
            env::var(BROKER_DATABASE_PATH_ENV).unwrap_or_else(|_| DEFAULT_BROKER_DATABASE_PATH.to_string());
        Ok(Self {
            database_path: PathBuf::from(database_path),
            broker_database_path: PathBuf::from(broker_database_path),
            object_store: ObjectStoreConfig::from_env()?,
        })
    }
}

/// Settings only the `worker` process role needs: the extraction
/// provider and the default standard profile validation runs against.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Extraction provider endpoint (C4).
    pub llm_endpoint: Url,
    /// Extraction provider API key.
    pub llm_api_key: String,
    /// Extraction provider model id.
    pub llm_model: String,
    /// Standard profile applied to every task this worker processes
    /// (§B.1: resolved once at process startup, not per task).
    pub default_profile: ProfileName,
    /// Interval between successive queue polls.
    pub poll_interval: Duration,
}

impl WorkerConfig {
    /// Loads worker-only settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the LLM endpoint, API key, or
    /// model is absent, or [`ConfigError::Invalid`] when any present value
    /// fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint_raw = env::var(LLM_ENDPOINT_ENV).map_err(|_| ConfigError::Missing(LLM_ENDPOINT_ENV))?;
        let llm_endpoint = Url::parse(&endpoint_raw).map_err(|e| ConfigError::Invalid(LLM_ENDPOINT_ENV, e.to_string()))?;
        let llm_api_key = env::var(LLM_API_KEY_ENV).map_err(|_| ConfigError::Missing(LLM_API_KEY_ENV))?;
        let llm_model = env::var(LLM_MODEL_ENV).map_err(|_| ConfigError::Missing(LLM_MODEL_ENV))?;

        let default_profile = match env::var(DEFAULT_PROFILE_ENV) {
            Ok(raw) => match raw.to_ascii_uppercase().as_str() {
                "NETA" => ProfileName::Neta,
                "MICROSOFT" => ProfileName::Microsoft,
                _ => return Err(ConfigError::Invalid(DEFAULT_PROFILE_ENV, raw)),
            },
            Err(_) => ProfileName::DEFAULT,
        };

        let poll_interval = match env::var(WORKER_POLL_INTERVAL_MS_ENV) {
            Ok(raw) => {
                let millis: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid(WORKER_POLL_INTERVAL_MS_ENV, raw.clone()))?;
                if millis == 0 {
                    return Err(ConfigError::Invalid(WORKER_POLL_INTERVAL_MS_ENV, raw));
                }
                Duration::from_millis(millis)
            }
            Err(_) => DEFAULT_WORKER_POLL_INTERVAL,
        };

        Ok(Self {
            llm_endpoint,
            llm_api_key,
            llm_model,
            default_profile,
            poll_interval,
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
            DATABASE_PATH_ENV,
            BROKER_DATABASE_PATH_ENV,
            OBJECT_STORE_BACKEND_ENV,
            OBJECT_STORE_ROOT_ENV,
            OBJECT_STORE_BUCKET_ENV,
            LLM_ENDPOINT_ENV,
            LLM_API_KEY_ENV,
            LLM_MODEL_ENV,
            DEFAULT_PROFILE_ENV,
            WORKER_POLL_INTERVAL_MS_ENV,
        ] {
            // SAFETY: tests are serialized by `ENV_LOCK`.
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn infra_defaults_apply_when_unset() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        let config = InfraConfig::from_env().expect("valid config");
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.broker_database_path, PathBuf::from(DEFAULT_BROKER_DATABASE_PATH));
        assert!(matches!(config.object_store, ObjectStoreConfig::Local { .. }));
        clear_env();
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        // SAFETY: serialized by `ENV_LOCK`.
        unsafe { env::set_var(OBJECT_STORE_BACKEND_ENV, "s3") };
        let result = InfraConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing(OBJECT_STORE_BUCKET_ENV))));
        clear_env();
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        // SAFETY: serialized by `ENV_LOCK`.
        unsafe { env::set_var(OBJECT_STORE_BACKEND_ENV, "azure") };
        let result = InfraConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Invalid(OBJECT_STORE_BACKEND_ENV, _))));
        clear_env();
    }

    #[test]
    fn worker_config_requires_llm_settings() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        let result = WorkerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::Missing(LLM_ENDPOINT_ENV))));
        clear_env();
    }

    #[test]
    fn worker_config_loads_with_defaults() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        // SAFETY: serialized by `ENV_LOCK`.
        unsafe {
            env::set_var(LLM_ENDPOINT_ENV, "https://llm.example.com/extract");
            env::set_var(LLM_API_KEY_ENV, "sk-test");
            env::set_var(LLM_MODEL_ENV, "gpt-audit-1");
        }
        let config = WorkerConfig::from_env().expect("valid config");
        assert_eq!(config.default_profile, ProfileName::Neta);
        assert_eq!(config.poll_interval, DEFAULT_WORKER_POLL_INTERVAL);
        clear_env();
    }
}
