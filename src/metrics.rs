use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::time::Instant;

use crate::{Result, SerieslyError};

lazy_static! {
    // Outbound store requests
    pub static ref STORE_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "seriesly_requests_total",
        "Total number of requests issued to the seriesly store",
        &["operation"]
    ).unwrap();

    pub static ref STORE_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "seriesly_request_duration_seconds",
        "Seriesly request duration in seconds",
        &["operation"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]
    ).unwrap();

    pub static ref STORE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "seriesly_request_failures_total",
        "Total number of failed seriesly requests",
        &["operation"]
    ).unwrap();

    // Series shaping
    pub static ref MISSING_SAMPLES: IntCounter = register_int_counter!(
        "seriesly_missing_samples_total",
        "Samples filled with NaN because the store had no entry"
    ).unwrap();

    pub static ref EMPTY_RESPONSES: IntCounter = register_int_counter!(
        "seriesly_empty_responses_total",
        "Queries answered with an empty body"
    ).unwrap();
}

pub fn init_metrics() {
    // Touch the statics so every series shows up on the first scrape.
    lazy_static::initialize(&STORE_REQUESTS);
    lazy_static::initialize(&STORE_REQUEST_DURATION);
    lazy_static::initialize(&STORE_FAILURES);
    lazy_static::initialize(&MISSING_SAMPLES);
    lazy_static::initialize(&EMPTY_RESPONSES);
}

/// Counts a store request on creation and observes its duration on drop.
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(operation: &'static str) -> Self {
        STORE_REQUESTS.with_label_values(&[operation]).inc();
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn observe<T>(self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            STORE_FAILURES.with_label_values(&[self.operation]).inc();
        }
        result
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        STORE_REQUEST_DURATION
            .with_label_values(&[self.operation])
            .observe(duration);
    }
}

pub fn record_missing_samples(count: usize) {
    MISSING_SAMPLES.inc_by(count as u64);
}

pub fn record_empty_response() {
    EMPTY_RESPONSES.inc();
}

/// Renders the default registry in the Prometheus text format.
pub fn gather_text() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| SerieslyError::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| SerieslyError::Internal(format!("Metrics are not UTF-8: {}", e)))
}
