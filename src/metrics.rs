//! Prometheus metrics for bridge attempts
//!
//! Counters and histograms only; exposition is the embedding service's
//! concern. [`encode_metrics`] renders the registry in text format for
//! whatever endpoint the host wires up.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    pub static ref ATTEMPTS_STARTED: CounterVec = register_counter_vec!(
        "bridge_attempts_started_total",
        "Total bridge attempts started",
        &["dest_chain"]
    )
    .unwrap();

    pub static ref ATTEMPTS_COMPLETED: CounterVec = register_counter_vec!(
        "bridge_attempts_completed_total",
        "Total bridge attempts completed successfully",
        &["dest_chain"]
    )
    .unwrap();

    pub static ref ATTEMPTS_FAILED: CounterVec = register_counter_vec!(
        "bridge_attempts_failed_total",
        "Total bridge attempts failed, by stage reached",
        &["dest_chain", "stage"]
    )
    .unwrap();

    pub static ref ATTEMPT_DURATION: HistogramVec = register_histogram_vec!(
        "bridge_attempt_duration_seconds",
        "End-to-end duration of successful bridge attempts",
        &["dest_chain"],
        vec![1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]
    )
    .unwrap();
}

pub fn record_attempt_started(dest_chain: &str) {
    ATTEMPTS_STARTED.with_label_values(&[dest_chain]).inc();
}

pub fn record_attempt_completed(dest_chain: &str, duration_secs: f64) {
    ATTEMPTS_COMPLETED.with_label_values(&[dest_chain]).inc();
    ATTEMPT_DURATION
        .with_label_values(&[dest_chain])
        .observe(duration_secs);
}

pub fn record_attempt_failed(dest_chain: &str, stage: &str) {
    ATTEMPTS_FAILED
        .with_label_values(&[dest_chain, stage])
        .inc();
}

/// Render all registered metrics in Prometheus text format
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        record_attempt_started("17000");
        record_attempt_failed("17000", "awaiting_release");
        record_attempt_completed("17000", 12.5);

        let rendered = encode_metrics();
        assert!(rendered.contains("bridge_attempts_started_total"));
        assert!(rendered.contains("bridge_attempts_failed_total"));
        assert!(rendered.contains("awaiting_release"));
    }
}
