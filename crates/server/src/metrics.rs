use axum::http::StatusCode;
use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static TOPUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("portal_topups_total", "Credited top-ups by method", &["method"])
        .expect("register topups_total")
});

pub static TOPUP_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("portal_topup_rejected_total", "Top-up requests that were not credited")
        .expect("register topup_rejected_total")
});

pub static LOGINS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!("portal_logins_total", "OAuth callbacks by outcome", &["outcome"])
        .expect("register logins_total")
});

pub async fn metrics_handler() -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}"));
    }
    (StatusCode::OK, String::from_utf8(buffer).unwrap_or_default())
}
