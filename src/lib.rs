//! Poolgate - pooled, rate-limited, health-checked access to a hosted data
//! backend.
//!
//! A service builds one [`ConnectionManager`](manager::ConnectionManager),
//! initializes it, and routes every backend call through
//! [`execute`](manager::ConnectionManager::execute). The manager bounds
//! concurrency with a fixed pool of clients, throttles each caller
//! identifier, retries transient failures with linear backoff, and probes
//! the backend on a timer.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration, defaults and validation
//! - [`manager`] - The composition root and only public entry point
//! - [`pool`] - Fixed-size client pool with lease-checked release
//! - [`limiter`] - Per-identifier fixed-window rate limiting
//! - [`retry`] - Timed attempts with bounded linear backoff
//! - [`health`] - Periodic backend probing
//! - [`metrics`] - Counters, latency average and snapshots
//! - [`port`] - Backend client and notifier traits
//! - [`adapter`] - `reqwest` implementation of the backend client
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use poolgate::config::ManagerConfig;
//! use poolgate::manager::ConnectionManager;
//!
//! # async fn demo() -> poolgate::error::Result<()> {
//! let config = ManagerConfig::load("config.toml")?;
//! let manager = ConnectionManager::http(config);
//! manager.initialize().await?;
//!
//! let status = manager
//!     .execute("user-42", |client| async move {
//!         let response = client.get("rest/v1/items?select=id").send().await?;
//!         Ok(response.status().as_u16())
//!     })
//!     .await?;
//!
//! manager.cleanup().await;
//! # let _ = status;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod limiter;
pub mod manager;
pub mod metrics;
pub mod pool;
pub mod port;
pub mod retry;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
