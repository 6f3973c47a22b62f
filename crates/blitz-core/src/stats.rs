//! In-memory request stats collector.
//!
//! Counters are plain atomics; status-code buckets live in a `DashMap` keyed by
//! the numeric code so concurrent requests never serialize on a single lock.
//! A snapshot reads each counter independently, so totals observed together
//! may be off by the requests racing the read. Nothing is persisted; the
//! collector starts from zero with the process.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;

pub struct RequestStats {
    pid: u32,
    started: Instant,
    total: AtomicU64,
    completed: AtomicU64,
    in_flight: AtomicI64,
    status_codes: DashMap<u16, AtomicU64>,
    response_micros: AtomicU64,
    response_bytes: AtomicU64,
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            pid: std::process::id(),
            started: Instant::now(),
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            in_flight: AtomicI64::new(0),
            status_codes: DashMap::new(),
            response_micros: AtomicU64::new(0),
            response_bytes: AtomicU64::new(0),
        }
    }

    /// Count a request on entry. The returned guard keeps it in flight until
    /// it is finished or dropped.
    pub fn begin(&self) -> InFlight<'_> {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        InFlight {
            stats: self,
            started: Instant::now(),
        }
    }

    fn record(&self, status: u16, elapsed: Duration, bytes: u64) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.status_codes
            .entry(status)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.response_micros.fetch_add(micros, Ordering::Relaxed);
        self.response_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let now = Utc::now();
        let uptime = self.started.elapsed();

        let completed = self.completed.load(Ordering::Relaxed);
        let total_time = Duration::from_micros(self.response_micros.load(Ordering::Relaxed));
        let total_bytes = self.response_bytes.load(Ordering::Relaxed);
        let (avg_time, avg_bytes) = match completed {
            0 => (Duration::ZERO, 0),
            n => (
                Duration::from_secs_f64(total_time.as_secs_f64() / n as f64),
                total_bytes / n,
            ),
        };

        let total_status_code_count = self
            .status_codes
            .iter()
            .map(|r| (r.key().to_string(), r.value().load(Ordering::Relaxed)))
            .collect();

        StatsSnapshot {
            pid: self.pid,
            uptime: format!("{uptime:?}"),
            uptime_sec: uptime.as_secs_f64(),
            time: now.to_rfc3339(),
            unixtime: now.timestamp(),
            total_count: self.total.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            total_status_code_count,
            total_response_time: format!("{total_time:?}"),
            total_response_time_sec: total_time.as_secs_f64(),
            average_response_time: format!("{avg_time:?}"),
            average_response_time_sec: avg_time.as_secs_f64(),
            total_response_size: total_bytes,
            average_response_size: avg_bytes,
        }
    }
}

/// A request that has been counted but not yet completed.
#[must_use = "dropping the guard discards the request's status and latency"]
pub struct InFlight<'a> {
    stats: &'a RequestStats,
    started: Instant,
}

impl InFlight<'_> {
    /// Record the outcome of the request.
    pub fn finish(self, status: u16, bytes: u64) {
        self.stats.record(status, self.started.elapsed(), bytes);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the collector, serialized by the `/stats` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub pid: u32,
    pub uptime: String,
    pub uptime_sec: f64,
    pub time: String,
    pub unixtime: i64,
    pub total_count: u64,
    pub in_flight: i64,
    pub total_status_code_count: BTreeMap<String, u64>,
    pub total_response_time: String,
    pub total_response_time_sec: f64,
    pub average_response_time: String,
    pub average_response_time_sec: f64,
    pub total_response_size: u64,
    pub average_response_size: u64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn counts_on_entry_and_buckets_on_finish() {
        let stats = RequestStats::new();

        let first = stats.begin();
        let snap = stats.snapshot();
        assert_eq!(snap.total_count, 1);
        assert_eq!(snap.in_flight, 1);
        assert!(snap.total_status_code_count.is_empty());

        first.finish(200, 2);
        stats.begin().finish(404, 0);
        stats.begin().finish(200, 4);

        let snap = stats.snapshot();
        assert_eq!(snap.total_count, 3);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.total_status_code_count.get("200"), Some(&2));
        assert_eq!(snap.total_status_code_count.get("404"), Some(&1));
        assert_eq!(snap.total_response_size, 6);
        assert_eq!(snap.average_response_size, 2);
    }

    #[test]
    fn dropped_guard_leaves_no_status() {
        let stats = RequestStats::new();
        drop(stats.begin());

        let snap = stats.snapshot();
        assert_eq!(snap.total_count, 1);
        assert_eq!(snap.in_flight, 0);
        assert!(snap.total_status_code_count.is_empty());
        assert_eq!(snap.average_response_time_sec, 0.0);
    }

    #[test]
    fn average_response_time_divides_total_by_completed() {
        let stats = RequestStats::new();
        stats.record(200, Duration::from_micros(1), 10);
        stats.record(200, Duration::from_micros(2), 20);
        stats.record(500, Duration::from_micros(4), 0);

        let snap = stats.snapshot();
        assert!((snap.total_response_time_sec - 7e-6).abs() < 1e-12);
        assert!((snap.average_response_time_sec - 7e-6 / 3.0).abs() < 1e-9);
        assert_eq!(snap.average_response_size, 10);
    }
}
