use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};

use crate::errors::ServiceError;

// Prometheus metrics (default registry)
pub static CASTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("farcaster_relay_casts_total", "Total casts published through Neynar")
        .expect("register casts_total")
});

pub static SIGNERS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "farcaster_relay_signers_created_total",
        "Total signers created and registered with a signed key"
    )
    .expect("register signers_created_total")
});

pub static SIGNER_CACHED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "farcaster_relay_signer_cached_total",
        "Total approved signers written to the signer cache"
    )
    .expect("register signer_cached_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "farcaster_relay_upstream_errors_total",
        "Total failed Neynar calls by operation",
        &["op"]
    )
    .expect("register upstream_errors_total")
});

pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "farcaster_relay_upstream_duration_seconds",
        "Neynar call duration in seconds by operation",
        &["op"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register upstream_duration")
});

/// Touch every metric so `/metrics` lists them before the first request.
pub fn init() {
    Lazy::force(&CASTS_TOTAL);
    Lazy::force(&SIGNERS_CREATED_TOTAL);
    Lazy::force(&SIGNER_CACHED_TOTAL);
    Lazy::force(&UPSTREAM_ERRORS_TOTAL);
    Lazy::force(&UPSTREAM_DURATION);
}

pub fn encode_metrics() -> Result<String, ServiceError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ServiceError::Metrics(format!("encode error: {e}")))?;
    String::from_utf8(buffer).map_err(|e| ServiceError::Metrics(format!("non-utf8 exposition: {e}")))
}
