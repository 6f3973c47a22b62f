//! Process-wide logging setup and the per-request span.

use axum::http::Request;
use tower_http::request_id::RequestId;
use tower_http::trace::MakeSpan;
use tracing::{Span, Subscriber};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use blitz_core::error::{BlitzError, Result};

pub const LOG_FORMAT_ENV: &str = "BLITZ_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON lines; anything else is plain text.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// Build the subscriber `init_tracing` installs, writing to `writer`.
/// Spans are included in every event, so request fields reach each line.
pub fn subscriber<W>(
    filter: EnvFilter,
    format: LogFormat,
    ansi: bool,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => Box::new(registry.with(fmt::layer().json().with_writer(writer))),
        LogFormat::Text => {
            Box::new(registry.with(fmt::layer().with_ansi(ansi).with_writer(writer)))
        }
    }
}

/// Install the global subscriber. `RUST_LOG` filters (default `info`);
/// `BLITZ_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_env_value(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    subscriber(filter, format, true, std::io::stdout)
        .try_init()
        .map_err(|e| BlitzError::Telemetry(format!("tracing init: {e}")))
}

/// One span per request carrying the assigned request id, so every event
/// logged while the request is handled is tagged with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}
