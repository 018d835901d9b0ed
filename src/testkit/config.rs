//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::config::ManagerConfig;

/// Endpoint that passes validation under the default host pattern.
pub const ENDPOINT: &str = "https://testkit.supabase.co";

/// Credential that passes validation under the default prefix.
pub const CREDENTIAL: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.testkit";

/// Manager config with the given pool size and millisecond-scale timings.
///
/// Logging is off so test output stays quiet. Override individual fields
/// on the returned struct for timing-specific tests.
pub fn manager(pool_size: usize) -> ManagerConfig {
    let mut config = ManagerConfig::new(ENDPOINT, CREDENTIAL);
    config.pool_size = pool_size;
    config.max_retries = 3;
    config.retry_delay_ms = 10;
    config.operation_timeout_ms = 1000;
    config.health_check_interval_ms = 1000;
    config.acquire_timeout_ms = 1000;
    config.drain_timeout_ms = 1000;
    config.logging_enabled = false;
    config
}
