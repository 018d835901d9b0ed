//! Implementations of ports.

pub mod http;

pub use http::HttpBackend;
