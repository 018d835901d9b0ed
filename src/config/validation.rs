//! Manager configuration validation.
//!
//! Pure: no I/O and no timers. Runs before any pooled client exists so the
//! manager never starts from a partially valid config.

use url::Url;

use super::{ManagerConfig, MAX_POOL_SIZE};
use crate::error::ConfigError;

/// Validate `config` and return its normalized form.
///
/// Normalization trims whitespace around the endpoint and credential and
/// strips trailing slashes from the endpoint.
///
/// # Errors
///
/// Returns the first violated constraint, checked in this order: endpoint
/// present, endpoint parses, HTTPS scheme, host pattern, credential present,
/// credential prefix, then the numeric ranges.
pub fn validate(config: &ManagerConfig) -> Result<ManagerConfig, ConfigError> {
    let mut normalized = config.clone();
    normalized.endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
    normalized.credential = config.credential.trim().to_string();

    validate_endpoint(&normalized.endpoint, &normalized.host_suffix)?;
    validate_credential(&normalized.credential, &normalized.credential_prefix)?;
    validate_ranges(&normalized)?;

    Ok(normalized)
}

fn validate_endpoint(endpoint: &str, host_suffix: &str) -> Result<(), ConfigError> {
    if endpoint.is_empty() {
        return Err(ConfigError::MissingField { field: "endpoint" });
    }

    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::invalid("endpoint", format!("not a valid URL: {e}")))?;

    if url.scheme() != "https" {
        return Err(ConfigError::invalid("endpoint", "must use https"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::invalid("endpoint", "missing host"))?;

    if !host_matches(host, host_suffix) {
        return Err(ConfigError::invalid(
            "endpoint",
            format!("host '{host}' does not match '*{host_suffix}'"),
        ));
    }

    Ok(())
}

/// `*.example.co` style matching; an empty suffix accepts any host.
fn host_matches(host: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }
    let bare = suffix.trim_start_matches('.');
    (host.ends_with(suffix) && host.len() > suffix.len()) || host == bare
}

fn validate_credential(credential: &str, prefix: &str) -> Result<(), ConfigError> {
    if credential.is_empty() {
        return Err(ConfigError::MissingField {
            field: "credential",
        });
    }
    if !credential.starts_with(prefix) {
        return Err(ConfigError::invalid(
            "credential",
            format!("expected a credential starting with '{prefix}'"),
        ));
    }
    Ok(())
}

fn validate_ranges(config: &ManagerConfig) -> Result<(), ConfigError> {
    if config.pool_size == 0 || config.pool_size > MAX_POOL_SIZE {
        return Err(ConfigError::invalid(
            "pool_size",
            format!("must be between 1 and {MAX_POOL_SIZE}"),
        ));
    }
    if config.max_retries == 0 {
        return Err(ConfigError::invalid("max_retries", "must be >= 1"));
    }
    if config.operation_timeout_ms == 0 {
        return Err(ConfigError::invalid("operation_timeout_ms", "must be > 0"));
    }
    if config.health_check_interval_ms == 0 {
        return Err(ConfigError::invalid(
            "health_check_interval_ms",
            "must be > 0",
        ));
    }
    if config.rate_limit_requests == 0 {
        return Err(ConfigError::invalid("rate_limit_requests", "must be >= 1"));
    }
    if config.rate_limit_window_ms == 0 {
        return Err(ConfigError::invalid("rate_limit_window_ms", "must be > 0"));
    }
    if config.rate_limit_sweep_interval_ms == 0 {
        return Err(ConfigError::invalid(
            "rate_limit_sweep_interval_ms",
            "must be > 0",
        ));
    }
    if config.acquire_timeout_ms == 0 {
        return Err(ConfigError::invalid("acquire_timeout_ms", "must be > 0"));
    }
    Ok(())
}
