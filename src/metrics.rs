//! Process-global metrics, registered once against the default registry.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

pub static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "webhook_events_total",
        "Total webhook events received, partitioned by outcome",
        &["result"]
    )
    .expect("webhook_events_total registration")
});

pub static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "webhook_queue_depth",
        "Current number of events in the processing queue"
    )
    .expect("webhook_queue_depth registration")
});

pub static PROCESSING_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "webhook_processing_duration_seconds",
        "Event processing duration in seconds",
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("webhook_processing_duration_seconds registration")
});

pub static PROCESSING_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "webhook_processing_errors_total",
        "Total number of processing errors"
    )
    .expect("webhook_processing_errors_total registration")
});

/// Forces registration of every metric. Call once at startup so `/metrics`
/// reports zero-valued series before any traffic arrives.
pub fn init() {
    Lazy::force(&EVENTS_TOTAL);
    Lazy::force(&QUEUE_DEPTH);
    Lazy::force(&PROCESSING_DURATION);
    Lazy::force(&PROCESSING_ERRORS_TOTAL);
}

/// Renders the current registry in Prometheus text exposition format.
pub fn encode() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    encoder
        .encode(&families, &mut buf)
        .expect("metrics encoding");
    String::from_utf8(buf).expect("metrics output is valid utf8")
}
