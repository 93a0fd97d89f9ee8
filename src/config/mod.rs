//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `CLAIMGUARD_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_EXPLAINER_MODEL,
    DEFAULT_L1_CAPACITY, DEFAULT_PRUNE_INTERVAL_SECS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_VERIFIER_MODELS,
};
use crate::memory::MemoryConfig;
use crate::retry::RetryPolicy;

/// Default DuckDuckGo region (worldwide).
pub const DEFAULT_SEARCH_REGION: &str = "wt-wt";

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CLAIMGUARD_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory for the durable cache. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Age after which cached analyses are ignored. Default: 24h.
    pub cache_ttl: Duration,

    /// Max entries in the in-memory hot tier. Default: `10_000`.
    pub l1_capacity: u64,

    /// Bound on each search, verifier and explanation call. Default: 20s.
    pub call_timeout: Duration,

    pub retry_attempts: u32,
    pub retry_backoff: Duration,

    /// Background prune period; zero disables it. Default: 1h.
    pub prune_interval: Duration,

    /// Verifier backends, in call order (tie-break order).
    pub verifier_models: Vec<String>,

    pub explainer_model: String,

    /// DuckDuckGo `kl` region code. Default: `wt-wt`.
    pub search_region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: PathBuf::from("./.data"),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            l1_capacity: DEFAULT_L1_CAPACITY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            prune_interval: Duration::from_secs(DEFAULT_PRUNE_INTERVAL_SECS),
            verifier_models: DEFAULT_VERIFIER_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            explainer_model: DEFAULT_EXPLAINER_MODEL.to_string(),
            search_region: DEFAULT_SEARCH_REGION.to_string(),
        }
    }
}

impl Config {
    pub const ENV_PORT: &'static str = "CLAIMGUARD_PORT";
    const ENV_BIND_ADDR: &'static str = "CLAIMGUARD_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "CLAIMGUARD_STORAGE_PATH";
    const ENV_CACHE_TTL_SECS: &'static str = "CLAIMGUARD_CACHE_TTL_SECS";
    const ENV_L1_CAPACITY: &'static str = "CLAIMGUARD_L1_CAPACITY";
    const ENV_CALL_TIMEOUT_SECS: &'static str = "CLAIMGUARD_CALL_TIMEOUT_SECS";
    const ENV_RETRY_ATTEMPTS: &'static str = "CLAIMGUARD_RETRY_ATTEMPTS";
    const ENV_RETRY_BACKOFF_MS: &'static str = "CLAIMGUARD_RETRY_BACKOFF_MS";
    const ENV_PRUNE_INTERVAL_SECS: &'static str = "CLAIMGUARD_PRUNE_INTERVAL_SECS";
    const ENV_VERIFIER_MODELS: &'static str = "CLAIMGUARD_VERIFIER_MODELS";
    const ENV_EXPLAINER_MODEL: &'static str = "CLAIMGUARD_EXPLAINER_MODEL";
    const ENV_SEARCH_REGION: &'static str = "CLAIMGUARD_SEARCH_REGION";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let cache_ttl = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_CACHE_TTL_SECS,
            defaults.cache_ttl.as_secs(),
        )?);
        let l1_capacity = Self::parse_number_from_env(Self::ENV_L1_CAPACITY, defaults.l1_capacity)?;
        let call_timeout = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_CALL_TIMEOUT_SECS,
            defaults.call_timeout.as_secs(),
        )?);
        let retry_attempts =
            Self::parse_number_from_env(Self::ENV_RETRY_ATTEMPTS, defaults.retry_attempts)?;
        let retry_backoff = Duration::from_millis(Self::parse_number_from_env(
            Self::ENV_RETRY_BACKOFF_MS,
            defaults.retry_backoff.as_millis() as u64,
        )?);
        let prune_interval = Duration::from_secs(Self::parse_number_from_env(
            Self::ENV_PRUNE_INTERVAL_SECS,
            defaults.prune_interval.as_secs(),
        )?);
        let verifier_models =
            Self::parse_list_from_env(Self::ENV_VERIFIER_MODELS, defaults.verifier_models);
        let explainer_model =
            Self::parse_string_from_env(Self::ENV_EXPLAINER_MODEL, defaults.explainer_model);
        let search_region =
            Self::parse_string_from_env(Self::ENV_SEARCH_REGION, defaults.search_region);

        Ok(Self {
            port,
            bind_addr,
            storage_path,
            cache_ttl,
            l1_capacity,
            call_timeout,
            retry_attempts,
            retry_backoff,
            prune_interval,
            verifier_models,
            explainer_model,
            search_region,
        })
    }

    /// Checks basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CACHE_TTL_SECS,
            });
        }

        if self.call_timeout.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_CALL_TIMEOUT_SECS,
            });
        }

        if self.retry_attempts == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_RETRY_ATTEMPTS,
            });
        }

        if self.l1_capacity == 0 {
            return Err(ConfigError::ZeroValue {
                name: Self::ENV_L1_CAPACITY,
            });
        }

        if self.verifier_models.is_empty() {
            return Err(ConfigError::NoVerifiers);
        }

        if self.explainer_model.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_EXPLAINER_MODEL,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn memory_config(&self) -> MemoryConfig {
        MemoryConfig::new(self.storage_path.clone())
            .with_ttl(self.cache_ttl)
            .with_hot_capacity(self.l1_capacity)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_backoff)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    /// Comma-separated list; blank items are dropped.
    fn parse_list_from_env(var_name: &str, default: Vec<String>) -> Vec<String> {
        match env::var(var_name) {
            Ok(value) => value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => default,
        }
    }

    fn parse_number_from_env<T: FromStr>(var_name: &'static str, default: T) -> Result<T, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                }),
            Err(_) => Ok(default),
        }
    }
}
