//! Shared application state for the Blitz server.
//!
//! Everything the middleware and handlers share is built here once at startup
//! and handed out by cheap `Arc` clones; there are no process-global
//! registries or collectors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use blitz_core::error::Result;
use blitz_core::RequestStats;

use crate::config::BlitzConfig;
use crate::oauth::OAuthConfig;
use crate::obs::Telemetry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: BlitzConfig,
    stats: RequestStats,
    telemetry: Telemetry,
    oauth: Option<OAuthConfig>,
    started: Instant,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: BlitzConfig) -> Result<Self> {
        let stats = RequestStats::new();
        let telemetry = Telemetry::new()?;

        let oauth = cfg.oauth.resolve();
        match &oauth {
            Some(o) => tracing::info!(
                client_id = %o.client_id(),
                redirect_url = %o.redirect_url(),
                "oauth client configured"
            ),
            None => tracing::info!("oauth client not configured"),
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                stats,
                telemetry,
                oauth,
                started: Instant::now(),
            }),
        })
    }

    pub fn cfg(&self) -> &BlitzConfig {
        &self.inner.cfg
    }

    pub fn stats(&self) -> &RequestStats {
        &self.inner.stats
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.inner.telemetry
    }

    pub fn oauth(&self) -> Option<&OAuthConfig> {
        self.inner.oauth.as_ref()
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started.elapsed()
    }
}
