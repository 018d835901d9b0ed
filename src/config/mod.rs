//! Manager configuration: TOML loading, defaults and the sanitized view
//! handed to collaborators.

mod logging;
pub mod validation;

pub use logging::LoggingConfig;
pub use validation::validate;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Environment variable that supplies the backend credential.
///
/// Takes precedence over any `credential` key in the config file.
pub const CREDENTIAL_ENV: &str = "POOLGATE_CREDENTIAL";

/// Largest pool the manager will build.
pub const MAX_POOL_SIZE: usize = 20;

/// Configuration for a [`ConnectionManager`](crate::manager::ConnectionManager).
///
/// Immutable once the manager has been initialized. Every tunable has a
/// default, so a config file only needs `endpoint` (and the credential,
/// usually from [`CREDENTIAL_ENV`]).
#[derive(Clone, Deserialize)]
pub struct ManagerConfig {
    /// Base URL of the hosted data backend. Must be HTTPS.
    #[serde(default)]
    pub endpoint: String,
    /// API credential sent with every request.
    #[serde(default)]
    pub credential: String,
    /// Attempts per operation before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff unit between attempts (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Per-attempt timeout (milliseconds).
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    /// Number of pooled clients, 1 to [`MAX_POOL_SIZE`].
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Cadence of the background health probe (milliseconds).
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// Requests allowed per identifier per window.
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,
    /// Rate-limit window length (milliseconds).
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,
    /// How often expired rate-limit windows are swept (milliseconds).
    #[serde(default = "default_rate_limit_sweep_interval_ms")]
    pub rate_limit_sweep_interval_ms: u64,
    /// Longest a caller waits for a free pooled client (milliseconds).
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    /// Longest `cleanup` waits for in-flight leases (milliseconds).
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
    /// Host suffix the endpoint must match.
    #[serde(default = "default_host_suffix")]
    pub host_suffix: String,
    /// Prefix every valid credential starts with.
    #[serde(default = "default_credential_prefix")]
    pub credential_prefix: String,
    /// Emit the manager's own diagnostic log lines.
    #[serde(default = "default_logging_enabled")]
    pub logging_enabled: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_retry_delay_ms() -> u64 {
    1000
}

const fn default_operation_timeout_ms() -> u64 {
    10_000
}

const fn default_pool_size() -> usize {
    5
}

const fn default_health_check_interval_ms() -> u64 {
    30_000
}

const fn default_rate_limit_requests() -> u32 {
    100
}

const fn default_rate_limit_window_ms() -> u64 {
    60_000
}

const fn default_rate_limit_sweep_interval_ms() -> u64 {
    60_000
}

const fn default_acquire_timeout_ms() -> u64 {
    5000
}

const fn default_drain_timeout_ms() -> u64 {
    5000
}

fn default_host_suffix() -> String {
    ".supabase.co".into()
}

fn default_credential_prefix() -> String {
    "eyJ".into()
}

const fn default_logging_enabled() -> bool {
    true
}

impl ManagerConfig {
    /// Build a config with every tunable at its default.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credential: credential.into(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
            pool_size: default_pool_size(),
            health_check_interval_ms: default_health_check_interval_ms(),
            rate_limit_requests: default_rate_limit_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            rate_limit_sweep_interval_ms: default_rate_limit_sweep_interval_ms(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
            host_suffix: default_host_suffix(),
            credential_prefix: default_credential_prefix(),
            logging_enabled: default_logging_enabled(),
            logging: LoggingConfig::default(),
        }
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// The environment is not consulted; see [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(validate(&config)?)
    }

    /// Load configuration from a TOML file.
    ///
    /// The credential is taken from [`CREDENTIAL_ENV`] when that variable is
    /// set, so secrets can stay out of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config: Self = toml::from_str(&content).map_err(ConfigError::Parse)?;
        if let Ok(credential) = std::env::var(CREDENTIAL_ENV) {
            config.credential = credential;
        }
        Ok(validate(&config)?)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_sweep_interval_ms)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Copy of this config without the credential.
    #[must_use]
    pub fn sanitized(&self) -> SanitizedConfig {
        SanitizedConfig {
            endpoint: self.endpoint.clone(),
            credential_set: !self.credential.is_empty(),
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            operation_timeout_ms: self.operation_timeout_ms,
            pool_size: self.pool_size,
            health_check_interval_ms: self.health_check_interval_ms,
            rate_limit_requests: self.rate_limit_requests,
            rate_limit_window_ms: self.rate_limit_window_ms,
            acquire_timeout_ms: self.acquire_timeout_ms,
            logging_enabled: self.logging_enabled,
        }
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("operation_timeout_ms", &self.operation_timeout_ms)
            .field("pool_size", &self.pool_size)
            .field("health_check_interval_ms", &self.health_check_interval_ms)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_ms", &self.rate_limit_window_ms)
            .field("logging_enabled", &self.logging_enabled)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a [`ManagerConfig`] that is safe to log or serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedConfig {
    pub endpoint: String,
    pub credential_set: bool,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub operation_timeout_ms: u64,
    pub pool_size: usize,
    pub health_check_interval_ms: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_ms: u64,
    pub acquire_timeout_ms: u64,
    pub logging_enabled: bool,
}
