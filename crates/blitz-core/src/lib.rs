//! Blitz core: transport-agnostic pieces shared by the server crate.
//!
//! This crate holds the startup error surface and the in-memory request stats
//! collector. It carries no HTTP or runtime dependencies so the collector can
//! be driven from any middleware stack (and from plain unit tests).
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod stats;

pub use error::{BlitzError, Result};
pub use stats::{InFlight, RequestStats, StatsSnapshot};
