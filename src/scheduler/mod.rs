//! Daily re-run of the maintenance pipeline
//!
//! Wraps tokio-cron-scheduler with a registry of jobs that carry their own
//! execution history. Cron expressions use six fields (seconds first) and
//! are evaluated in UTC.
//!
//! # Example
//!
//! ```no_run
//! use smart_asset_scheduler::config::Config;
//! use smart_asset_scheduler::scheduler::{maintenance_pipeline_job, SchedulerService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let mut scheduler = SchedulerService::new(config.scheduler.clone()).await?;
//!
//!     scheduler.add_job(maintenance_pipeline_job(&config)).await?;
//!     scheduler.start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     scheduler.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod service;
mod error;
mod jobs;
mod metrics;
mod tasks;

pub use self::config::{SchedulerConfig, SchedulerConfigBuilder};
pub use service::{SchedulerService, SchedulerStats};
pub use error::{SchedulerError, SchedulerResult};
pub use jobs::{Job, JobContext, JobId, JobMetadata, JobStatus};
pub use metrics::{init_scheduler_metrics, SCHEDULER_METRICS};
pub use tasks::{maintenance_pipeline_job, run_maintenance_pipeline, MAINTENANCE_PIPELINE_JOB};
