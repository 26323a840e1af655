//! Prometheus metrics for pipeline runs

use crate::error::{AppError, Result};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec,
    register_histogram_vec, Counter, CounterVec, Encoder, Gauge, GaugeVec, HistogramVec,
    TextEncoder,
};
use std::path::Path;

/// Pipeline metrics collection
pub struct PipelineMetrics {
    /// Completed runs by outcome ("success" / "failure")
    pub runs_total: CounterVec,

    /// Rows scored across all successful runs
    pub rows_scored_total: Counter,

    /// Stage duration in seconds
    pub stage_duration: HistogramVec,

    /// Rows per priority tier in the latest schedule
    pub rows_by_priority: GaugeVec,

    /// Unix timestamp of the last successful run
    pub last_success: Gauge,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            runs_total: register_counter_vec!(
                "pipeline_runs_total",
                "Total number of pipeline runs",
                &["outcome"]
            )
            .unwrap(),

            rows_scored_total: register_counter!(
                "pipeline_rows_scored_total",
                "Total number of rows scored"
            )
            .unwrap(),

            stage_duration: register_histogram_vec!(
                "pipeline_stage_duration_seconds",
                "Pipeline stage duration in seconds",
                &["stage"],
                vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
            )
            .unwrap(),

            rows_by_priority: register_gauge_vec!(
                "pipeline_rows_by_priority",
                "Rows per priority tier in the latest schedule",
                &["priority"]
            )
            .unwrap(),

            last_success: register_gauge!(
                "pipeline_last_success_timestamp",
                "Unix timestamp of the last successful run"
            )
            .unwrap(),
        }
    }

    /// Record a stage duration
    pub fn record_stage(&self, stage: &str, duration_secs: f64) {
        self.stage_duration
            .with_label_values(&[stage])
            .observe(duration_secs);
    }

    /// Record a successful run
    pub fn record_success(&self, rows: usize, tiers: &[(&str, usize)]) {
        self.runs_total.with_label_values(&["success"]).inc();
        self.rows_scored_total.inc_by(rows as f64);
        for (priority, count) in tiers {
            self.rows_by_priority
                .with_label_values(&[priority])
                .set(*count as f64);
        }
        self.last_success.set(chrono::Utc::now().timestamp() as f64);
    }

    /// Record a failed run
    pub fn record_failure(&self) {
        self.runs_total.with_label_values(&["failure"]).inc();
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global pipeline metrics instance
    pub static ref PIPELINE_METRICS: PipelineMetrics = PipelineMetrics::new();
}

/// Initialize pipeline metrics (idempotent)
pub fn init_pipeline_metrics() {
    lazy_static::initialize(&PIPELINE_METRICS);
}

/// Write every registered metric in text exposition format
pub fn export_metrics(path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| AppError::Internal(format!("failed to encode metrics: {}", e)))?;

    std::fs::write(path, buffer)
        .map_err(|e| AppError::Persist(format!("{}: {}", path.display(), e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_pipeline_metrics() {
        init_pipeline_metrics();
        PIPELINE_METRICS.record_stage("load", 0.01);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.prom");
        export_metrics(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("pipeline_stage_duration_seconds"));
    }
}
