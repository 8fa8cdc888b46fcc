//! Prometheus metrics for the critic server.
//!
//! The `/metrics` endpoint is unauthenticated to allow scraping. Metrics carry
//! no user, project or file identifiers, only aggregate counts.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Resource metrics
pub static PROJECTS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "critic_projects_created_total",
        "Total number of projects created",
    )
    .expect("metric creation failed")
});

pub static PROJECTS_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "critic_projects_deleted_total",
        "Total number of projects deleted",
    )
    .expect("metric creation failed")
});

pub static FILES_UPSERTED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "critic_files_upserted_total",
        "Total number of file create-or-replace writes",
    )
    .expect("metric creation failed")
});

// Archive ingestion metrics
pub static ARCHIVE_ENTRIES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "critic_archive_entries_total",
            "Archive entries processed by outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static ARCHIVES_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "critic_archives_rejected_total",
            "Archive uploads rejected before ingestion by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

// Analysis metrics
pub static ANALYSES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "critic_analyses_total",
            "File analyses by analyzer kind and summary class",
        ),
        &["kind", "result"],
    )
    .expect("metric creation failed")
});

pub static ANALYSIS_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "critic_analysis_duration_seconds",
            "Wall time of a single file analysis by analyzer kind",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        &["kind"],
    )
    .expect("metric creation failed")
});

// Auth metrics
pub static AUTH_FAILURES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "critic_auth_failures_total",
            "Rejected credentials and ownership checks by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent: calls after the first are no-ops, so several routers may be
/// built in one process (as integration tests do).
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(PROJECTS_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PROJECTS_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILES_UPSERTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ARCHIVE_ENTRIES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ARCHIVES_REJECTED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ANALYSES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ANALYSIS_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(AUTH_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a rejected credential or ownership check.
pub fn record_auth_failure(reason: &str) {
    AUTH_FAILURES.with_label_values(&[reason]).inc();
}

/// Record a finished analysis.
pub fn record_analysis(kind: &str, clean: bool, elapsed: std::time::Duration) {
    let result = if clean { "clean" } else { "findings" };
    ANALYSES.with_label_values(&[kind, result]).inc();
    ANALYSIS_DURATION
        .with_label_values(&[kind])
        .observe(elapsed.as_secs_f64());
}
