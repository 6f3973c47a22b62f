//! Prometheus registry for the server.
//!
//! One `Registry` is built per [`Telemetry`] and owned by the application
//! state; nothing is registered in the process-global default registry. The
//! registry carries the process collector (Linux), a tokio runtime collector,
//! and the HTTP instrumentation driven by the middleware chain. Latency
//! buckets are in seconds, the Prometheus convention.

use std::time::Instant;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use blitz_core::error::{BlitzError, Result};

const LATENCY_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

fn telemetry_err(e: prometheus::Error) -> BlitzError {
    BlitzError::Telemetry(e.to_string())
}

/// Request instrumentation registered by [`Telemetry::new`].
#[derive(Clone)]
pub struct HttpMetrics {
    requests: IntCounterVec,
    duration: HistogramVec,
    in_flight: IntGauge,
}

impl HttpMetrics {
    fn new() -> Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served"),
            &["method", "path", "status"],
        )
        .map_err(telemetry_err)?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["method", "path"],
        )
        .map_err(telemetry_err)?;
        let in_flight = IntGauge::new("http_requests_in_flight", "HTTP requests being served")
            .map_err(telemetry_err)?;

        Ok(Self {
            requests,
            duration,
            in_flight,
        })
    }

    /// Mark a request in flight until the returned timer is finished or dropped.
    pub fn start(&self) -> HttpTimer<'_> {
        self.in_flight.inc();
        HttpTimer {
            metrics: self,
            started: Instant::now(),
        }
    }
}

#[must_use = "dropping the timer discards the request's labels and latency"]
pub struct HttpTimer<'a> {
    metrics: &'a HttpMetrics,
    started: Instant,
}

impl HttpTimer<'_> {
    pub fn finish(self, method: &str, path: &str, status: u16) {
        let status = status.to_string();
        self.metrics
            .requests
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.metrics
            .duration
            .with_label_values(&[method, path])
            .observe(self.started.elapsed().as_secs_f64());
    }
}

impl Drop for HttpTimer<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.dec();
    }
}

/// Tokio runtime gauges, sampled at scrape time.
pub struct RuntimeCollector {
    workers: IntGauge,
    alive_tasks: IntGauge,
    descs: Vec<Desc>,
}

impl RuntimeCollector {
    pub fn new() -> Result<Self> {
        let workers = IntGauge::new("tokio_workers", "Worker threads in the tokio runtime")
            .map_err(telemetry_err)?;
        let alive_tasks = IntGauge::new("tokio_alive_tasks", "Tasks alive in the tokio runtime")
            .map_err(telemetry_err)?;

        let descs = workers
            .desc()
            .into_iter()
            .chain(alive_tasks.desc())
            .cloned()
            .collect();

        Ok(Self {
            workers,
            alive_tasks,
            descs,
        })
    }
}

impl Collector for RuntimeCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        // Outside a runtime the gauges keep their last sampled values.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let m = handle.metrics();
            self.workers.set(m.num_workers() as i64);
            self.alive_tasks.set(m.num_alive_tasks() as i64);
        }
        let mut out = self.workers.collect();
        out.extend(self.alive_tasks.collect());
        out
    }
}

pub struct Telemetry {
    registry: Registry,
    http: HttpMetrics,
}

impl Telemetry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(telemetry_err)?;

        registry
            .register(Box::new(RuntimeCollector::new()?))
            .map_err(telemetry_err)?;

        let http = HttpMetrics::new()?;
        registry
            .register(Box::new(http.requests.clone()))
            .map_err(telemetry_err)?;
        registry
            .register(Box::new(http.duration.clone()))
            .map_err(telemetry_err)?;
        registry
            .register(Box::new(http.in_flight.clone()))
            .map_err(telemetry_err)?;

        Ok(Self { registry, http })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn http(&self) -> &HttpMetrics {
        &self.http
    }

    /// Encode every registered collector in the text exposition format.
    /// Returns the body and its content type.
    pub fn render(&self) -> std::result::Result<(Vec<u8>, String), prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&self.registry().gather(), &mut buf)?;
        Ok((buf, encoder.format_type().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_includes_http_and_runtime_families() {
        let t = Telemetry::new().expect("telemetry");
        t.http().start().finish("GET", "/healthz", 200);

        let (body, content_type) = t.render().expect("render");
        let text = String::from_utf8(body).expect("utf8");

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains(
            "http_requests_total{method=\"GET\",path=\"/healthz\",status=\"200\"} 1"
        ));
        assert!(text.contains("http_request_duration_seconds_bucket"));
        assert!(text.contains("http_requests_in_flight 0"));
        assert!(text.contains("tokio_workers"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_collector_is_registered() {
        let t = Telemetry::new().expect("telemetry");
        assert!(!t.registry().gather().is_empty());

        let (body, _) = t.render().expect("render");
        let text = String::from_utf8(body).expect("utf8");
        assert!(text.contains("process_cpu_seconds_total"));
        assert!(text.contains("process_resident_memory_bytes"));
    }

    #[tokio::test]
    async fn render_emits_every_gathered_family() {
        let t = Telemetry::new().expect("telemetry");
        t.http().start().finish("GET", "/stats", 200);

        let (body, _) = t.render().expect("render");
        let text = String::from_utf8(body).expect("utf8");
        let families = t.registry().gather().len();
        let typed = text.lines().filter(|l| l.starts_with("# TYPE ")).count();
        assert_eq!(typed, families);
    }

    #[test]
    fn registries_are_independent() {
        let a = Telemetry::new().expect("first");
        let b = Telemetry::new().expect("second");
        a.http().start().finish("GET", "/", 200);

        let (body, _) = b.render().expect("render");
        let text = String::from_utf8(body).expect("utf8");
        assert!(!text.contains("http_requests_total{"));
    }
}
