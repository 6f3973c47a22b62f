//! Blitz server binary.
//!
//! - `GET /`        : landing page
//! - `GET /stats`   : request stats (JSON)
//! - `GET /healthz` : liveness
//! - `/debug/*`     : process introspection
//! - `GET /metrics` : Prometheus scrape endpoint

use std::process::ExitCode;

use blitz_core::error::Result;
use blitz_server::{app_state, config, obs, router, server};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = obs::logging::init_tracing() {
        eprintln!("blitz-server: {e}");
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "blitz-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let listen = cfg.server.listen_addr()?;
    let drain_timeout = cfg.server.shutdown_timeout();

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    let listener = server::bind(listen).await?;
    tracing::info!(%listen, "server starting");

    server::serve(listener, app, drain_timeout, server::shutdown_signal()).await
}
