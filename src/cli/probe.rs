//! Handler for the `probe` command.

use std::sync::Arc;

use crate::adapter::HttpBackend;
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::manager::ConnectionManager;
use crate::port::LogNotifier;

/// Run one health check against the backend and print the resulting metrics.
///
/// Returns whether the probe passed. The manager is always cleaned up, even
/// when the probe itself errors.
pub async fn execute(config: ManagerConfig) -> Result<bool> {
    let manager = ConnectionManager::<HttpBackend>::http(config).with_notifier(Arc::new(LogNotifier));
    manager.initialize().await?;

    let outcome = manager.perform_health_check().await;
    let snapshot = manager.metrics();
    manager.cleanup().await;

    let healthy = outcome?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(healthy)
}
