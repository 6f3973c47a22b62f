//! Axum router wiring.
//!
//! Routes are registered on a stateful router first, then wrapped in the
//! middleware chain by [`middleware::apply`](crate::middleware::apply).

use axum::{routing::get, Router};

use crate::{app_state::AppState, debug, middleware, ops, pages};

pub fn build_router(state: AppState) -> Router {
    middleware::apply(routes(), state)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/stats", get(ops::stats))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .merge(debug::router())
}
