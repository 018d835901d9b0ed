use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("rate limit exceeded for '{identifier}'")]
    RateLimitExceeded { identifier: String },

    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The wrapped operation's own failure, passed through untouched.
    #[error(transparent)]
    Operation(anyhow::Error),

    #[error("connection manager is not initialized")]
    NotInitialized,

    #[error("no pooled client became available within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    #[error("failed to construct client: {0}")]
    ClientConstruction(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the retry executor should spend another attempt on this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Operation(_) | Self::PoolExhausted { .. } | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
