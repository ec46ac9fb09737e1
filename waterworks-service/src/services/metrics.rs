//! Prometheus metrics for waterworks-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};

/// Bill counter by customer type.
pub static BILLS_ENCODED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "waterworks_bills_encoded_total",
        "Total number of bills encoded by customer type",
        &["type"]
    )
    .expect("Failed to register bills_encoded_total")
});

/// Settlement counter by outcome.
pub static PAYMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "waterworks_payments_total",
        "Total number of settlements by outcome",
        &["outcome"] // exact, overpaid, underpaid
    )
    .expect("Failed to register payments_total")
});

/// Total amount collected across settlements.
pub static PAYMENT_AMOUNT_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "waterworks_payment_amount_total",
        "Total tendered payment amount"
    )
    .expect("Failed to register payment_amount_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "waterworks_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "waterworks_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&BILLS_ENCODED_TOTAL);
    Lazy::force(&PAYMENTS_TOTAL);
    Lazy::force(&PAYMENT_AMOUNT_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
