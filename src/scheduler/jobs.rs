//! Job definitions and execution bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Unique identifier for a scheduled job
pub type JobId = Uuid;

/// Status of a scheduled job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting for its next trigger
    Scheduled,
    /// Currently executing
    Running,
    /// Last execution succeeded
    Completed,
    /// Last execution failed
    Failed,
}

/// Metadata and execution history of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    pub id: JobId,
    pub name: String,
    pub description: Option<String>,

    /// Cron expression
    pub schedule: String,

    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,

    pub run_count: u64,
    pub success_count: u64,
    pub failure_count: u64,

    /// Average execution duration in milliseconds
    pub avg_duration_ms: f64,

    /// Error message of the most recent failed run
    pub last_error: Option<String>,

    /// Job parameters (e.g. input/output paths)
    pub params: serde_json::Value,
}

impl JobMetadata {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            schedule: schedule.into(),
            status: JobStatus::Scheduled,
            created_at: now,
            updated_at: now,
            last_run: None,
            run_count: 0,
            success_count: 0,
            failure_count: 0,
            avg_duration_ms: 0.0,
            last_error: None,
            params: serde_json::Value::Null,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    /// Fold one execution into the counters and running average
    pub fn record_execution(&mut self, result: &Result<(), String>, duration_ms: u64) {
        self.run_count += 1;
        match result {
            Ok(()) => {
                self.success_count += 1;
                self.status = JobStatus::Completed;
            }
            Err(e) => {
                self.failure_count += 1;
                self.status = JobStatus::Failed;
                self.last_error = Some(e.clone());
            }
        }

        let previous = self.avg_duration_ms * (self.run_count - 1) as f64;
        self.avg_duration_ms = (previous + duration_ms as f64) / self.run_count as f64;

        let now = Utc::now();
        self.last_run = Some(now);
        self.updated_at = now;
    }

    pub fn success_rate(&self) -> f64 {
        if self.run_count == 0 {
            0.0
        } else {
            (self.success_count as f64 / self.run_count as f64) * 100.0
        }
    }
}

/// Snapshot of a job's metadata handed to its body
#[derive(Debug, Clone)]
pub struct JobContext {
    pub metadata: JobMetadata,
}

impl JobContext {
    pub fn new(metadata: JobMetadata) -> Self {
        Self { metadata }
    }

    /// Look up a string parameter
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.metadata.params.get(key).and_then(|v| v.as_str())
    }
}

type JobFuture = Pin<Box<dyn Future<Output = Result<(), String>> + Send>>;
type JobFn = Arc<dyn Fn(JobContext) -> JobFuture + Send + Sync>;

/// A scheduled job: metadata plus an async body
///
/// Executions of the same job never overlap; a trigger that fires while a
/// run is in flight waits for it to finish.
pub struct Job {
    metadata: Arc<RwLock<JobMetadata>>,
    body: JobFn,
    run_lock: Mutex<()>,
}

impl Job {
    pub fn new<F, Fut>(metadata: JobMetadata, body: F) -> Self
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        Self {
            metadata: Arc::new(RwLock::new(metadata)),
            body: Arc::new(move |ctx| Box::pin(body(ctx))),
            run_lock: Mutex::new(()),
        }
    }

    pub async fn get_metadata(&self) -> JobMetadata {
        self.metadata.read().await.clone()
    }

    /// Run the body once and record the outcome
    pub async fn execute(&self) -> Result<(), String> {
        let _guard = self.run_lock.lock().await;

        let ctx = {
            let mut metadata = self.metadata.write().await;
            metadata.status = JobStatus::Running;
            metadata.updated_at = Utc::now();
            JobContext::new(metadata.clone())
        };

        let start = std::time::Instant::now();
        let result = (self.body)(ctx).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.metadata
            .write()
            .await
            .record_execution(&result, duration_ms);

        result
    }
}
