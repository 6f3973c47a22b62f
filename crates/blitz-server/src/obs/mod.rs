//! Observability: logging setup and the Prometheus registry.

pub mod logging;
pub mod metrics;

pub use metrics::Telemetry;
