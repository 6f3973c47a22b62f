//! Startup and lifecycle error type shared by Blitz crates.

use std::net::SocketAddr;

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, BlitzError>;

/// Errors that abort startup or end the serve loop.
///
/// Request-scoped failures never surface here; the HTTP layer turns them into
/// responses instead.
#[derive(Debug, Error)]
pub enum BlitzError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}

impl BlitzError {
    /// Stable short name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            BlitzError::Config(_) => "CONFIG",
            BlitzError::Bind { .. } => "BIND",
            BlitzError::Serve(_) => "SERVE",
            BlitzError::Telemetry(_) => "TELEMETRY",
        }
    }
}
