//! Environment-driven runtime configuration.
//!
//! ```rust
//! use std::time::Duration;
//! use globetalk::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_lookup(|key| match key {
//!     "GLOBETALK_RETRY_ATTEMPTS" => Some("5".to_string()),
//!     "GLOBETALK_MEMORY" => Some("memory".to_string()),
//!     _ => None,
//! })
//! .expect("config should parse");
//!
//! assert_eq!(config.retry_attempts, 5);
//! assert_eq!(config.api_timeout, Duration::from_secs(10));
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::util::{MemoryKind, parse_memory_kind};
use crate::{
    DEFAULT_NAME_LIST_TTL, DEFAULT_RECORD_TTL, MemoryBackendConfig, RetryPolicy, RuntimeError,
};

pub const ENV_API_BASE_URL: &str = "GLOBETALK_API_BASE_URL";
pub const ENV_API_TIMEOUT_SECS: &str = "GLOBETALK_API_TIMEOUT_SECS";
pub const ENV_RETRY_ATTEMPTS: &str = "GLOBETALK_RETRY_ATTEMPTS";
pub const ENV_RETRY_BACKOFF_MS: &str = "GLOBETALK_RETRY_BACKOFF_MS";
pub const ENV_CACHE_TTL_SECS: &str = "GLOBETALK_CACHE_TTL_SECS";
pub const ENV_COUNTRY_LIST_TTL_SECS: &str = "GLOBETALK_COUNTRY_LIST_TTL_SECS";
pub const ENV_DATASET_PATH: &str = "GLOBETALK_DATASET_PATH";
pub const ENV_MEMORY: &str = "GLOBETALK_MEMORY";
pub const ENV_SQLITE_PATH: &str = "GLOBETALK_SQLITE_PATH";
pub const ENV_FS_ROOT: &str = "GLOBETALK_FS_ROOT";
pub const ENV_METRICS: &str = "GLOBETALK_METRICS";
pub const ENV_SESSION_IDLE_SECS: &str = "GLOBETALK_SESSION_IDLE_SECS";

pub const DEFAULT_API_BASE_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub cache_ttl: Duration,
    pub country_list_ttl: Duration,
    /// `None` uses the dataset compiled into gcountry.
    pub dataset_path: Option<PathBuf>,
    pub memory: MemoryBackendConfig,
    pub metrics_enabled: bool,
    /// Live sessions idle this long are evicted; zero keeps them until EXIT.
    pub session_idle_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_timeout: Duration::from_secs(10),
            retry_attempts: 3,
            retry_backoff: Duration::from_millis(1_000),
            cache_ttl: DEFAULT_RECORD_TTL,
            country_list_ttl: DEFAULT_NAME_LIST_TTL,
            dataset_path: None,
            memory: MemoryBackendConfig::default(),
            metrics_enabled: true,
            session_idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`; unset or blank keys keep their
    /// defaults, malformed values are rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RuntimeError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = read(ENV_API_BASE_URL) {
            config.api_base_url = url;
        }
        if let Some(raw) = read(ENV_API_TIMEOUT_SECS) {
            let secs = parse_positive::<u64>(ENV_API_TIMEOUT_SECS, &raw)?;
            config.api_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = read(ENV_RETRY_ATTEMPTS) {
            config.retry_attempts = parse_positive::<u32>(ENV_RETRY_ATTEMPTS, &raw)?;
        }
        if let Some(raw) = read(ENV_RETRY_BACKOFF_MS) {
            config.retry_backoff = Duration::from_millis(parse_number(ENV_RETRY_BACKOFF_MS, &raw)?);
        }
        if let Some(raw) = read(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_number(ENV_CACHE_TTL_SECS, &raw)?);
        }
        if let Some(raw) = read(ENV_COUNTRY_LIST_TTL_SECS) {
            config.country_list_ttl =
                Duration::from_secs(parse_number(ENV_COUNTRY_LIST_TTL_SECS, &raw)?);
        }
        config.dataset_path = read(ENV_DATASET_PATH).map(PathBuf::from);
        if let Some(raw) = read(ENV_METRICS) {
            config.metrics_enabled = parse_flag(ENV_METRICS, &raw)?;
        }
        if let Some(raw) = read(ENV_SESSION_IDLE_SECS) {
            config.session_idle_timeout =
                Duration::from_secs(parse_number(ENV_SESSION_IDLE_SECS, &raw)?);
        }

        let kind = match read(ENV_MEMORY) {
            Some(raw) => parse_memory_kind(&raw).ok_or_else(|| {
                RuntimeError::config(format!(
                    "{ENV_MEMORY} must be one of sqlite, filesystem, memory; got '{raw}'"
                ))
            })?,
            None => MemoryKind::Sqlite,
        };
        config.memory = match (kind, read(ENV_SQLITE_PATH), read(ENV_FS_ROOT)) {
            (MemoryKind::Sqlite, Some(path), _) => MemoryBackendConfig::Sqlite {
                path: PathBuf::from(path),
            },
            (MemoryKind::Filesystem, _, Some(root)) => MemoryBackendConfig::Filesystem {
                root: PathBuf::from(root),
            },
            (kind, _, _) => kind.default_config(),
        };

        Ok(config)
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_api_timeout(mut self, api_timeout: Duration) -> Self {
        self.api_timeout = api_timeout;
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn with_country_list_ttl(mut self, country_list_ttl: Duration) -> Self {
        self.country_list_ttl = country_list_ttl;
        self
    }

    pub fn with_dataset_path(mut self, dataset_path: impl Into<PathBuf>) -> Self {
        self.dataset_path = Some(dataset_path.into());
        self
    }

    pub fn with_memory(mut self, memory: MemoryBackendConfig) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_metrics(mut self, metrics_enabled: bool) -> Self {
        self.metrics_enabled = metrics_enabled;
        self
    }

    pub fn with_session_idle_timeout(mut self, session_idle_timeout: Duration) -> Self {
        self.session_idle_timeout = session_idle_timeout;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts).with_initial_backoff(self.retry_backoff)
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, RuntimeError> {
    raw.parse::<T>().map_err(|_| {
        RuntimeError::config(format!("{key} must be a non-negative integer; got '{raw}'"))
    })
}

fn parse_positive<T>(key: &str, raw: &str) -> Result<T, RuntimeError>
where
    T: FromStr + PartialEq + Default,
{
    let value = parse_number::<T>(key, raw)?;
    if value == T::default() {
        return Err(RuntimeError::config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, RuntimeError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RuntimeError::config(format!(
            "{key} must be a boolean flag; got '{raw}'"
        ))),
    }
}
