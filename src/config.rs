//! Runtime configuration.
//!
//! Built once at startup and passed explicitly into the extraction client and
//! the HTTP layer. Values come from the process environment; only the API key
//! is required.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

use crate::pipeline::governance::UnknownTypePolicy;

/// Application-level constants
pub const APP_NAME: &str = "FlashVerify";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "FLASHVERIFY_MODEL";
pub const ENV_API_BASE: &str = "FLASHVERIFY_API_BASE";
pub const ENV_BIND: &str = "FLASHVERIFY_BIND";
pub const ENV_TIMEOUT_SECS: &str = "FLASHVERIFY_TIMEOUT_SECS";
pub const ENV_MAX_CONCURRENT: &str = "FLASHVERIFY_MAX_CONCURRENT";
pub const ENV_MAX_UPLOAD_MB: &str = "FLASHVERIFY_MAX_UPLOAD_MB";
pub const ENV_UNKNOWN_TYPE_POLICY: &str = "FLASHVERIFY_UNKNOWN_TYPE_POLICY";

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_CONCURRENT: usize = 4;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "warn,flashverify_lib=info,flashverify=info"
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set. Export your Gemini API key before starting FlashVerify.")]
    MissingApiKey(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the service needs to run.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub max_upload_bytes: usize,
    pub unknown_type_policy: UnknownTypePolicy,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("unknown_type_policy", &self.unknown_type_policy)
            .finish()
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(ENV_API_KEY).ok_or(ConfigError::MissingApiKey(ENV_API_KEY))?;

        let bind_raw = get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: ENV_BIND,
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let request_timeout_secs =
            parse_positive(ENV_TIMEOUT_SECS, get(ENV_TIMEOUT_SECS), DEFAULT_TIMEOUT_SECS)?;
        let max_concurrent_requests = parse_positive(
            ENV_MAX_CONCURRENT,
            get(ENV_MAX_CONCURRENT),
            DEFAULT_MAX_CONCURRENT,
        )?;
        let max_upload_mb =
            parse_positive(ENV_MAX_UPLOAD_MB, get(ENV_MAX_UPLOAD_MB), DEFAULT_MAX_UPLOAD_MB)?;

        let unknown_type_policy = match get(ENV_UNKNOWN_TYPE_POLICY) {
            None => UnknownTypePolicy::default(),
            Some(raw) => {
                raw.parse::<UnknownTypePolicy>()
                    .map_err(|reason| ConfigError::InvalidValue {
                        key: ENV_UNKNOWN_TYPE_POLICY,
                        value: raw.clone(),
                        reason,
                    })?
            }
        };

        Ok(Self {
            api_key,
            model: get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: get(ENV_API_BASE)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_addr,
            request_timeout_secs,
            max_concurrent_requests,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            unknown_type_policy,
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: fmt::Display,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}
