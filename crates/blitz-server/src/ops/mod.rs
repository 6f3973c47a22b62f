//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness (constant `Ok`)
//! - `/stats`   : request stats collector as indented JSON
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::error::AppError;

// No dependency checks yet; answering at all means alive.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "Ok")
}

pub async fn stats(State(state): State<AppState>) -> Result<Response, AppError> {
    let mut body = serde_json::to_vec_pretty(&state.stats().snapshot()).map_err(|e| {
        tracing::error!(error = %e, "encoding stats failed");
        AppError::Encode(e.to_string())
    })?;
    body.push(b'\n');

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    let (body, content_type) = state.telemetry().render().map_err(|e| {
        tracing::error!(error = %e, "encoding metrics failed");
        AppError::Encode(e.to_string())
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        body,
    )
        .into_response())
}
