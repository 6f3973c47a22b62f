//! Debug routes under `/debug`.
//!
//! Process introspection in the spirit of pprof/expvar, plus an on-demand
//! CPU profile sampled by `pprof` (unix only).
//!
//! - `/debug`, `/debug/`, `/debug/pprof` : 301 to the index
//! - `/debug/pprof/`                     : HTML index
//! - `/debug/pprof/cmdline`              : command line, NUL separated
//! - `/debug/pprof/profile?seconds=N`    : CPU profile, pprof protobuf
//! - `/debug/vars`                       : JSON process and runtime vars

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::app_state::AppState;

pub const INDEX_PATH: &str = "/debug/pprof/";

/// Routes use absolute paths; merge this into the root router.
pub fn router() -> Router<AppState> {
    let router = Router::new()
        .route("/debug", get(to_index))
        .route("/debug/", get(to_index))
        .route("/debug/pprof", get(to_index))
        .route(INDEX_PATH, get(index))
        .route("/debug/pprof/cmdline", get(cmdline))
        .route("/debug/vars", get(vars));

    #[cfg(unix)]
    let router = router.route("/debug/pprof/profile", get(profile::profile));

    router
}

async fn to_index() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, INDEX_PATH)])
}

async fn index() -> Html<&'static str> {
    Html(
        "<html>\n<head>\n<title>/debug/pprof/</title>\n</head>\n<body>\n\
         <p>Available endpoints:</p>\n<ul>\n\
         <li><a href=\"/debug/pprof/cmdline\">cmdline</a>: \
         the running program's command line</li>\n\
         <li><a href=\"/debug/pprof/profile\">profile</a>: CPU profile; \
         <code>?seconds=N</code> sets the duration (default 30)</li>\n\
         <li><a href=\"/debug/vars\">vars</a>: process and runtime variables (JSON)</li>\n\
         </ul>\n</body>\n</html>\n",
    )
}

fn args() -> Vec<String> {
    std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

async fn cmdline() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        args().join("\0"),
    )
}

async fn vars(State(state): State<AppState>) -> Json<Value> {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let m = handle.metrics();
            json!({
                "workers": m.num_workers(),
                "alive_tasks": m.num_alive_tasks(),
            })
        }
        Err(_) => Value::Null,
    };

    Json(json!({
        "cmdline": args(),
        "pid": std::process::id(),
        "uptime_sec": state.uptime().as_secs_f64(),
        "runtime": runtime,
    }))
}

#[cfg(unix)]
mod profile {
    use std::time::Duration;

    use axum::{
        extract::Query,
        http::header,
        response::{IntoResponse, Response},
    };
    use pprof::protos::Message;
    use serde::Deserialize;

    use crate::error::AppError;

    pub const DEFAULT_SECONDS: u64 = 30;
    pub const MAX_SECONDS: u64 = 300;
    const FREQUENCY_HZ: i32 = 100;

    #[derive(Debug, Deserialize)]
    pub struct ProfileParams {
        seconds: Option<u64>,
    }

    /// Sample the whole process for `seconds` (clamped to 1..=300).
    pub async fn profile(Query(params): Query<ProfileParams>) -> Result<Response, AppError> {
        let seconds = params
            .seconds
            .unwrap_or(DEFAULT_SECONDS)
            .clamp(1, MAX_SECONDS);
        tracing::info!(seconds, "cpu profile requested");

        // The guard sleeps on the blocking pool; runtime workers keep serving.
        let body = tokio::task::spawn_blocking(move || sample(Duration::from_secs(seconds)))
            .await
            .map_err(|e| AppError::Profile(format!("profile task: {e}")))
            .and_then(std::convert::identity)
            .inspect_err(|e| tracing::error!(error = %e, "cpu profile failed"))?;

        Ok((
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"profile\""),
            ],
            body,
        )
            .into_response())
    }

    fn sample(duration: Duration) -> Result<Vec<u8>, AppError> {
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(FREQUENCY_HZ)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(|e| AppError::Profile(e.to_string()))?;

        std::thread::sleep(duration);

        let report = guard
            .report()
            .build()
            .map_err(|e| AppError::Profile(e.to_string()))?;
        let profile = report
            .pprof()
            .map_err(|e| AppError::Profile(e.to_string()))?;

        let mut body = Vec::new();
        profile
            .encode(&mut body)
            .map_err(|e| AppError::Encode(e.to_string()))?;
        Ok(body)
    }
}
