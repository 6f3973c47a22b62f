//! Request-scoped failures and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("profile failed: {0}")]
    Profile(String),

    #[error("handler panicked")]
    Panic,
}

impl AppError {
    pub fn client_code(&self) -> &'static str {
        match self {
            AppError::Render(_) => "RENDER",
            AppError::Encode(_) => "ENCODE",
            AppError::Profile(_) => "PROFILE",
            AppError::Panic => "INTERNAL",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every variant is a server-side fault; details stay in the logs.
        let body = Json(json!({
            "error": self.client_code(),
            "message": "internal server error",
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
