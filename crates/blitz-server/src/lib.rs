//! Blitz server library entry.
//!
//! This crate wires configuration, shared state, the middleware chain, and the
//! HTTP handlers into an axum application. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod debug;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod obs;
pub mod ops;
pub mod pages;
pub mod router;
pub mod server;
