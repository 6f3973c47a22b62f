//! Listener lifecycle: bind, serve, graceful shutdown.
//!
//! On the shutdown signal the listener stops accepting, in-flight requests
//! get up to the drain timeout to finish, and whatever is still open after
//! that is dropped.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use blitz_core::error::{BlitzError, Result};

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| BlitzError::Bind { addr, source })
}

/// Serve `app` until `signal` resolves, then drain for at most `drain_timeout`.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    drain_timeout: Duration,
    signal: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future();
    tokio::pin!(server);
    tokio::pin!(signal);

    tokio::select! {
        res = &mut server => return res.map_err(BlitzError::Serve),
        () = &mut signal => {}
    }

    tracing::info!(?drain_timeout, "shutdown signal received, draining connections");
    let _ = stop_tx.send(());

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(res) => res.map_err(BlitzError::Serve)?,
        Err(_) => {
            tracing::warn!(?drain_timeout, "drain timeout elapsed, dropping open connections")
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on the first SIGINT (Ctrl-C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
