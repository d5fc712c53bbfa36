//! Prometheus metrics for repair-service.
//!
//! HTTP request metrics come from the `metrics` facade (see
//! `repair_core::middleware::metrics`) and are rendered through the installed
//! recorder. Domain counters live in the default `prometheus` registry.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec, TextEncoder};

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Payments recorded, by outcome.
pub static PAYMENTS_RECORDED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "repair_payments_recorded_total",
        "Total payments recorded against jobs",
        &["outcome"] // ok, rejected
    )
    .expect("Failed to register payments_recorded_total")
});

pub static PAYMENTS_AMENDED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "repair_payments_amended_total",
        "Total payment amendments",
        &["outcome"]
    )
    .expect("Failed to register payments_amended_total")
});

pub static JOBS_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "repair_jobs_created_total",
        "Total jobs created, by whether ad-hoc parts were attached",
        &["with_parts"]
    )
    .expect("Failed to register jobs_created_total")
});

/// Optimistic-concurrency retries, by operation.
pub static CONFLICT_RETRIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "repair_conflict_retries_total",
        "Versioned writes retried after losing a race",
        &["operation"]
    )
    .expect("Failed to register conflict_retries_total")
});

pub static ROLLBACKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "repair_unit_of_work_rollbacks_total",
        "Units of work aborted before commit",
        &["operation"]
    )
    .expect("Failed to register unit_of_work_rollbacks_total")
});

/// Install the `metrics` recorder and force registration of domain counters.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;
    if METRICS_HANDLE.set(handle).is_err() {
        anyhow::bail!("metrics recorder already initialized");
    }

    Lazy::force(&PAYMENTS_RECORDED_TOTAL);
    Lazy::force(&PAYMENTS_AMENDED_TOTAL);
    Lazy::force(&JOBS_CREATED_TOTAL);
    Lazy::force(&CONFLICT_RETRIES_TOTAL);
    Lazy::force(&ROLLBACKS_TOTAL);
    Ok(())
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    output.push_str(&encoder.encode_to_string(&metric_families).unwrap_or_default());
    output
}
