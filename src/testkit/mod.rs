//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`client`] - Mock [`BackendClient`](crate::port::BackendClient) with
//!   switchable health, plus `ScriptedOperation` for retry scenarios.
//! - [`notifier`] - `RecordingNotifier` capturing emitted events.
//! - [`config`] - Canonical test configurations with fast timings.
//! - [`trace`] - `EventCounter` for asserting on emitted log events.

pub mod client;
pub mod config;
pub mod notifier;
pub mod trace;
