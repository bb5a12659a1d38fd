//! Runtime bootstrap: tracing, metric descriptions and the shared HTTP client.

pub mod error;
pub mod http;
pub mod telemetry;
