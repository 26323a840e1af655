//! Scheduled tasks

use super::jobs::{Job, JobContext, JobMetadata};
use crate::config::{Config, ModelConfig};
use crate::pipeline::run_pipeline;
use std::path::PathBuf;
use tracing::info;

/// Name of the daily pipeline job
pub const MAINTENANCE_PIPELINE_JOB: &str = "maintenance_pipeline";

/// Build the daily pipeline job from configuration
///
/// Input and output paths travel in the job parameters; the model
/// hyperparameters are captured by the job body.
pub fn maintenance_pipeline_job(config: &Config) -> Job {
    let metadata = JobMetadata::new(MAINTENANCE_PIPELINE_JOB, config.scheduler.schedule.clone())
        .with_description("Re-score every asset and rewrite the maintenance schedule")
        .with_params(serde_json::json!({
            "input_path": config.pipeline.input_path.display().to_string(),
            "output_path": config.pipeline.output_path.display().to_string(),
        }));

    let model = config.model.clone();
    Job::new(metadata, move |ctx| run_maintenance_pipeline(ctx, model.clone()))
}

/// Run the full pipeline once
///
/// The pipeline is synchronous, so it runs on the blocking pool. A failed
/// run leaves the previous schedule file in place.
///
/// Default schedule: daily at midnight (`0 0 0 * * *`)
pub async fn run_maintenance_pipeline(ctx: JobContext, model: ModelConfig) -> Result<(), String> {
    let input = ctx
        .param_str("input_path")
        .map(PathBuf::from)
        .ok_or_else(|| "missing job parameter 'input_path'".to_string())?;
    let output = ctx
        .param_str("output_path")
        .map(PathBuf::from)
        .ok_or_else(|| "missing job parameter 'output_path'".to_string())?;

    info!(
        input = %input.display(),
        output = %output.display(),
        "Starting scheduled pipeline run"
    );

    let report = tokio::task::spawn_blocking(move || run_pipeline(&input, &output, model))
        .await
        .map_err(|e| format!("pipeline task panicked: {}", e))?
        .map_err(|e| format!("[{}] {}", e.error_code(), e))?;

    info!(
        run_id = %report.run_id,
        rows = report.rows,
        urgent = report.priority_counts.urgent,
        "Scheduled pipeline run completed"
    );

    Ok(())
}
