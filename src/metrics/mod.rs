//! Prometheus metrics for the scrape and ingest pipeline
//!
//! This module tracks:
//! - Extraction: draws extracted per game/strategy, dropped blocks per reason
//! - Rendering: render duration and failures per game
//! - Ingestion: stored, skipped and failed records
//! - Notifications and API requests
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all pipeline metrics
struct PipelineMetrics {
    draws_extracted: CounterVec,
    blocks_skipped: CounterVec,
    render_duration: HistogramVec,
    render_failures: CounterVec,
    ingest_records: CounterVec,
    notifications: CounterVec,
    api_requests: CounterVec,
    api_duration: HistogramVec,
}

/// Global storage for pipeline metrics
static PIPELINE_METRICS: OnceLock<PipelineMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = pickdraw::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = PipelineMetrics {
        draws_extracted: register_counter_vec!(
            "pickdraw_draws_extracted_total",
            "Draw records extracted from rendered pages",
            &["game", "strategy"]
        )?,
        blocks_skipped: register_counter_vec!(
            "pickdraw_blocks_skipped_total",
            "Candidate draw blocks dropped during extraction",
            &["game", "reason"]
        )?,
        render_duration: register_histogram_vec!(
            "pickdraw_render_duration_seconds",
            "Time spent rendering a results page",
            &["game"],
            vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0]
        )?,
        render_failures: register_counter_vec!(
            "pickdraw_render_failures_total",
            "Results page renders that failed",
            &["game", "kind"]
        )?,
        ingest_records: register_counter_vec!(
            "pickdraw_ingest_records_total",
            "Ingested records by outcome (stored, skipped, failed)",
            &["outcome"]
        )?,
        notifications: register_counter_vec!(
            "pickdraw_notifications_total",
            "Summary notifications by channel and delivery status",
            &["channel", "status"]
        )?,
        api_requests: register_counter_vec!(
            "pickdraw_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "pickdraw_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0]
        )?,
    };

    PIPELINE_METRICS
        .set(metrics)
        .map_err(|_| "Pipeline metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    PIPELINE_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record draws extracted from one document
pub fn record_draws_extracted(game: &str, strategy: &str, count: usize) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.draws_extracted
            .with_label_values(&[game, strategy])
            .inc_by(count as f64);
    }
}

/// Record a dropped candidate block
pub fn record_block_skipped(game: &str, reason: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.blocks_skipped.with_label_values(&[game, reason]).inc();
    }
}

/// Record a failed render
pub fn record_render_failure(game: &str, kind: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.render_failures.with_label_values(&[game, kind]).inc();
    }
}

/// Record the outcome of one ingested record
pub fn record_ingest_outcome(outcome: &str) {
    if let Some(m) = PIPELINE_METRICS.get() {
        m.ingest_records.with_label_values(&[outcome]).inc();
    }
}

/// Record a notification delivery attempt
pub fn record_notification(channel: &str, success: bool) {
    if let Some(m) = PIPELINE_METRICS.get() {
        let status = if success { "success" } else { "failure" };
        m.notifications.with_label_values(&[channel, status]).inc();
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = PIPELINE_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[endpoint, status_str.as_str()])
        .inc();
    m.api_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn new(timer: prometheus::HistogramTimer) -> Self {
        Self { timer: Some(timer) }
    }

    /// Create a no-op timer when metrics are not initialized
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop_and_record();
        }
    }
}

/// Start a render timer for a game
pub fn start_render_timer(game: &str) -> MetricsTimer {
    match PIPELINE_METRICS.get() {
        Some(m) => MetricsTimer::new(m.render_duration.with_label_values(&[game]).start_timer()),
        None => MetricsTimer::noop(),
    }
}

// ============================================================================
// Tests
// ============================================================================
