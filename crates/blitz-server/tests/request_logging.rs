#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

use blitz_server::{
    app_state::AppState,
    config::BlitzConfig,
    middleware,
    obs::logging::{self, LogFormat},
    router,
};

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// `#[tokio::test]` runs on the current thread, so the scoped subscriber sees
// every event emitted while the request is served.
fn capture_logs(format: LogFormat) -> (Capture, DefaultGuard) {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = logging::subscriber(
        EnvFilter::new("info"),
        format,
        false,
        move || writer.clone(),
    );
    (capture, tracing::subscriber::set_default(subscriber))
}

async fn send_with_id(app: Router, uri: &str, request_id: &str) -> StatusCode {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .header("x-request-id", request_id)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

async fn boom() -> &'static str {
    panic!("boom")
}

#[tokio::test]
async fn every_request_log_line_carries_the_request_id() {
    let (capture, _guard) = capture_logs(LogFormat::Text);

    let app = router::build_router(AppState::new(BlitzConfig::default()).expect("state"));
    assert_eq!(send_with_id(app, "/healthz", "req-42").await, StatusCode::OK);

    let logs = capture.text();
    let request_lines: Vec<&str> = logs
        .lines()
        .filter(|l| l.contains("processing request"))
        .collect();

    assert_eq!(request_lines.len(), 2, "started + finished lines: {logs}");
    for line in request_lines {
        assert!(line.contains("request_id=req-42"), "missing request id: {line}");
    }
}

#[tokio::test]
async fn json_lines_carry_the_request_id_in_the_span() {
    let (capture, _guard) = capture_logs(LogFormat::Json);

    let app = router::build_router(AppState::new(BlitzConfig::default()).expect("state"));
    assert_eq!(send_with_id(app, "/healthz", "req-7").await, StatusCode::OK);

    let logs = capture.text();
    let events: Vec<serde_json::Value> = logs
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .filter(|v: &serde_json::Value| {
            v["fields"]["message"]
                .as_str()
                .is_some_and(|m| m.contains("processing request"))
        })
        .collect();

    assert_eq!(events.len(), 2, "started + finished events: {logs}");
    for event in events {
        assert_eq!(event["span"]["name"], "request");
        assert_eq!(event["span"]["request_id"], "req-7", "{event}");
    }
}

#[tokio::test]
async fn recovered_panic_is_logged_with_the_request_id() {
    let (capture, _guard) = capture_logs(LogFormat::Text);

    let state = AppState::new(BlitzConfig::default()).expect("state");
    let app = middleware::apply(router::routes().route("/boom", get(boom)), state);
    assert_eq!(
        send_with_id(app, "/boom", "req-9").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let logs = capture.text();
    let panic_line = logs
        .lines()
        .find(|l| l.contains("handler panicked"))
        .unwrap_or_else(|| panic!("no panic line: {logs}"));
    assert!(panic_line.contains("request_id=req-9"), "{panic_line}");
    assert!(panic_line.contains("panic=boom"), "{panic_line}");
}
