//! Batch scoring pipeline
//!
//! One run executes the linear stages
//! `Load -> Encode -> Fit -> Predict -> Prioritize -> Explain -> Persist`.
//! Any stage error aborts the run and leaves the previous output untouched.
//!
//! # Example
//!
//! ```no_run
//! use smart_asset_scheduler::config::Config;
//! use smart_asset_scheduler::pipeline::Pipeline;
//!
//! let config = Config::load()?;
//! let report = Pipeline::from_config(&config).run()?;
//! println!("scored {} rows", report.rows);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod io;
mod metrics;
mod orchestrator;

pub use io::{
    load_readings, load_scored, load_table, write_scored, SensorTable, INPUT_COLUMNS,
    OUTPUT_COLUMNS, SCORE_COLUMNS,
};
pub use metrics::{export_metrics, init_pipeline_metrics, PIPELINE_METRICS};
pub use orchestrator::{run_pipeline, score, Pipeline, PipelineReport, PipelineStage, StageTiming};
