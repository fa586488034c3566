//! Metrics and observability utilities
//!
//! Counters and histograms go through the `metrics` facade; nothing is
//! recorded until the host installs a recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::{Duration, Instant};

/// Metrics prefix for all OfficeHub metrics
pub const METRICS_PREFIX: &str = "officehub";

/// Register all metric descriptions
pub fn register_metrics() {
    // Remote service metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of record service requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Record service request latency in seconds"
    );

    // Check-in metrics
    describe_counter!(
        format!("{}_checkins_total", METRICS_PREFIX),
        Unit::Count,
        "Check-in attempts by outcome"
    );

    // Refresh metrics
    describe_counter!(
        format!("{}_refreshes_total", METRICS_PREFIX),
        Unit::Count,
        "Attendance board refreshes by outcome"
    );

    describe_histogram!(
        format!("{}_refresh_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Combined summary and records refresh latency in seconds"
    );

    tracing::debug!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    operation: &'static str,
    method: &'static str,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &'static str, operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            method,
        }
    }

    /// Record request completion; `status` is 0 when no response arrived
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method,
            "operation" => self.operation,
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "operation" => self.operation
        )
        .record(duration);
    }
}

/// Helper to record a check-in outcome
pub fn record_checkin(outcome: &'static str) {
    counter!(
        format!("{}_checkins_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);
}

/// Helper to record refresh metrics
pub fn record_refresh(duration: Duration, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_refreshes_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_refresh_duration_seconds", METRICS_PREFIX),
        "status" => status
    )
    .record(duration.as_secs_f64());
}
