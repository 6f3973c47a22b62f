#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::thread;

use blitz_core::RequestStats;

#[test]
fn snapshot_serializes_expected_fields() {
    let stats = RequestStats::new();
    stats.begin().finish(200, 10);

    let v = serde_json::to_value(stats.snapshot()).expect("serialize");
    for key in [
        "pid",
        "uptime",
        "uptime_sec",
        "time",
        "unixtime",
        "total_count",
        "in_flight",
        "total_status_code_count",
        "total_response_time",
        "total_response_time_sec",
        "average_response_time",
        "average_response_time_sec",
        "total_response_size",
        "average_response_size",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert_eq!(v["pid"], std::process::id());
    assert_eq!(v["total_status_code_count"]["200"], 1);
}

#[test]
fn concurrent_requests_are_all_counted() {
    let stats = Arc::new(RequestStats::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                for _ in 0..250 {
                    let status = if i % 2 == 0 { 200 } else { 500 };
                    stats.begin().finish(status, 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let snap = stats.snapshot();
    assert_eq!(snap.total_count, 2000);
    assert_eq!(snap.in_flight, 0);
    assert_eq!(snap.total_status_code_count["200"], 1000);
    assert_eq!(snap.total_status_code_count["500"], 1000);
    assert_eq!(snap.total_response_size, 2000);
}
