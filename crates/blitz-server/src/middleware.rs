//! The fixed middleware chain wrapped around every route.
//!
//! Order, outermost first (the order has importance):
//!
//! | # | Layer | Why here |
//! |---|---|---|
//! | 1 | request stats | times the whole chain, sees every final status |
//! | 2 | Prometheus instrumentation | same, labelled by matched route |
//! | 3 | request-id assignment | must precede logging |
//! | 4 | request logging | span per request, tagged with the request id |
//! | 5 | request-id propagation | echoes `x-request-id` on the response |
//! | 6 | panic recovery | turns panics below it into a 500 |
//! | 7 | CORS | answers preflights before any handler runs |

use std::any::Any;

use axum::{
    body::HttpBody,
    extract::{MatchedPath, Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use crate::app_state::AppState;
use crate::config::CorsSection;
use crate::error::AppError;
use crate::obs::logging::RequestSpan;

/// Label used for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Wrap `routes` in the middleware chain and bind the state.
pub fn apply(routes: Router<AppState>, state: AppState) -> Router {
    let stack = ServiceBuilder::new()
        .layer(from_fn_with_state(state.clone(), track_stats))
        .layer(from_fn_with_state(state.clone(), instrument))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RequestSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::custom(recover))
        .layer(cors_layer(&state.cfg().cors));

    routes.layer(stack).with_state(state)
}

async fn track_stats(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let in_flight = state.stats().begin();
    let response = next.run(req).await;

    let bytes = response.body().size_hint().exact().unwrap_or(0);
    in_flight.finish(response.status().as_u16(), bytes);
    response
}

async fn instrument(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());

    let timer = state.telemetry().http().start();
    let response = next.run(req).await;
    timer.finish(&method, &path, response.status().as_u16());
    response
}

fn recover(panic: Box<dyn Any + Send + 'static>) -> Response {
    let msg = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %msg, "handler panicked, recovered");
    AppError::Panic.into_response()
}

/// Permissive defaults: simple methods, simple headers, no credentials.
fn cors_layer(cfg: &CorsSection) -> CorsLayer {
    let origin = if cfg.allows_any() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cfg.allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::HEAD])
        .allow_headers([
            header::ORIGIN,
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
        ])
}
