//! Handler for the `run` command.

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use crate::adapter::HttpBackend;
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::manager::ConnectionManager;
use crate::port::LogNotifier;

/// Keep a manager alive until ctrl-c, logging metrics every health interval.
pub async fn execute(config: ManagerConfig) -> Result<()> {
    let every = config.health_check_interval();
    let manager = ConnectionManager::<HttpBackend>::http(config).with_notifier(Arc::new(LogNotifier));
    manager.initialize().await?;
    info!(endpoint = %manager.config().endpoint, "poolgate running");

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let m = manager.metrics();
                info!(
                    healthy = manager.is_healthy(),
                    active = m.active_connections,
                    total = m.total_connections,
                    requests = m.request_count,
                    errors = m.error_count,
                    avg_ms = m.average_response_time_ms,
                    uptime_ms = m.uptime_ms,
                    "Metrics"
                );
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    manager.cleanup().await;
    info!("poolgate stopped");
    Ok(())
}
