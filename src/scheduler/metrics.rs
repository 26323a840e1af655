//! Prometheus metrics for scheduled job executions

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec, CounterVec,
    Gauge, GaugeVec, HistogramVec,
};

/// Scheduler metrics collection
pub struct SchedulerMetrics {
    /// Number of registered jobs
    pub jobs_registered: Gauge,

    /// Job executions by outcome ("success" / "failure")
    pub executions_total: CounterVec,

    /// Job execution duration in seconds
    pub execution_duration: HistogramVec,

    /// Executions currently in flight
    pub running_jobs: GaugeVec,

    /// Unix timestamp of the last execution
    pub last_execution: GaugeVec,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            jobs_registered: register_gauge!(
                "scheduler_jobs_registered",
                "Number of registered scheduled jobs"
            )
            .unwrap(),

            executions_total: register_counter_vec!(
                "scheduler_executions_total",
                "Total number of job executions",
                &["job_name", "outcome"]
            )
            .unwrap(),

            execution_duration: register_histogram_vec!(
                "scheduler_execution_duration_seconds",
                "Job execution duration in seconds",
                &["job_name"],
                vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]
            )
            .unwrap(),

            running_jobs: register_gauge_vec!(
                "scheduler_running_jobs",
                "Number of currently running jobs",
                &["job_name"]
            )
            .unwrap(),

            last_execution: register_gauge_vec!(
                "scheduler_last_execution_timestamp",
                "Unix timestamp of last job execution",
                &["job_name"]
            )
            .unwrap(),
        }
    }

    /// Record job execution start
    pub fn record_execution_start(&self, job_name: &str) {
        self.running_jobs.with_label_values(&[job_name]).inc();
    }

    /// Record job execution completion
    pub fn record_execution_complete(&self, job_name: &str, success: bool, duration_secs: f64) {
        self.running_jobs.with_label_values(&[job_name]).dec();

        let outcome = if success { "success" } else { "failure" };
        self.executions_total
            .with_label_values(&[job_name, outcome])
            .inc();

        self.execution_duration
            .with_label_values(&[job_name])
            .observe(duration_secs);

        self.last_execution
            .with_label_values(&[job_name])
            .set(chrono::Utc::now().timestamp() as f64);
    }

    pub fn set_registered(&self, count: usize) {
        self.jobs_registered.set(count as f64);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global scheduler metrics instance
    pub static ref SCHEDULER_METRICS: SchedulerMetrics = SchedulerMetrics::new();
}

/// Initialize scheduler metrics (idempotent)
pub fn init_scheduler_metrics() {
    lazy_static::initialize(&SCHEDULER_METRICS);
}
