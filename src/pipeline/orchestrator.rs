//! Sequencing of the pipeline stages

use crate::config::{Config, ModelConfig, PipelineConfig};
use crate::error::{AppError, Result};
use crate::maintenance::{ExplanationGenerator, PriorityCounts};
use crate::ml::{encode, FailureClassifier, FailureModel, ModelMetadata};
use crate::models::{ScoredReading, SensorReading};
use crate::pipeline::io::{load_table, write_scored};
use crate::pipeline::metrics::PIPELINE_METRICS;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use strum::{Display, IntoStaticStr};
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Stages of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStage {
    Load,
    Encode,
    Fit,
    Predict,
    Prioritize,
    Explain,
    Persist,
}

/// Wall-clock duration of one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub duration_ms: f64,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Rows read and written (always equal)
    pub rows: usize,

    /// Distinct assets in the input
    pub assets: usize,

    /// Rows with `Predicted_Failure = true`
    pub predicted_failures: usize,

    pub priority_counts: PriorityCounts,
    pub stages: Vec<StageTiming>,
    pub model: ModelMetadata,
}

/// Batch scoring pipeline over one input file
#[derive(Debug, Clone)]
pub struct Pipeline {
    paths: PipelineConfig,
    model: ModelConfig,
}

impl Pipeline {
    pub fn new(paths: PipelineConfig, model: ModelConfig) -> Self {
        Self { paths, model }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pipeline.clone(), config.model.clone())
    }

    pub fn input_path(&self) -> &Path {
        &self.paths.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.paths.output_path
    }

    /// Execute every stage; the output file is only replaced if all succeed
    pub fn run(&self) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", run_id = %run_id);
        let _guard = span.enter();

        info!(
            input = %self.paths.input_path.display(),
            output = %self.paths.output_path.display(),
            "Starting pipeline run"
        );

        match self.execute(run_id) {
            Ok(report) => {
                let tiers = [
                    ("Low", report.priority_counts.low),
                    ("Medium", report.priority_counts.medium),
                    ("Urgent", report.priority_counts.urgent),
                ];
                PIPELINE_METRICS.record_success(report.rows, &tiers);
                info!(
                    rows = report.rows,
                    urgent = report.priority_counts.urgent,
                    medium = report.priority_counts.medium,
                    low = report.priority_counts.low,
                    "Pipeline run completed"
                );
                Ok(report)
            }
            Err(e) => {
                PIPELINE_METRICS.record_failure();
                error!(error_code = e.error_code(), error = %e, "Pipeline run failed");
                Err(e)
            }
        }
    }

    fn execute(&self, run_id: Uuid) -> Result<PipelineReport> {
        let started_at = Utc::now();
        let mut timer = StageTimer::default();

        let table = timer.time(PipelineStage::Load, || load_table(&self.paths.input_path))?;
        let readings = table.readings();

        let (encoder, features) = timer.time(PipelineStage::Encode, || Ok(encode(readings)))?;
        let labels: Vec<u8> = readings.iter().map(|r| r.failure).collect();
        let assets = encoder.len();

        let model = timer.time(PipelineStage::Fit, || {
            FailureClassifier::new(self.model.clone()).fit_encoded(encoder, &features, &labels)
        })?;

        // Every row is scored, including the ones the ensemble was fitted on.
        let probabilities =
            timer.time(PipelineStage::Predict, || model.predict_features(&features))?;

        let mut scored = timer.time(PipelineStage::Prioritize, || {
            score(readings, &probabilities)
        })?;

        timer.time(PipelineStage::Explain, || {
            ExplanationGenerator::new().apply(&mut scored);
            Ok(())
        })?;

        timer.time(PipelineStage::Persist, || {
            write_scored(&self.paths.output_path, &table, &scored)
        })?;

        let model_metadata = model.metadata().clone();

        Ok(PipelineReport {
            run_id,
            input_path: self.paths.input_path.clone(),
            output_path: self.paths.output_path.clone(),
            started_at,
            finished_at: Utc::now(),
            rows: scored.len(),
            assets,
            predicted_failures: scored.iter().filter(|r| r.predicted_failure).count(),
            priority_counts: PriorityCounts::from_scored(&scored),
            stages: timer.into_timings(),
            model: model_metadata,
        })
    }
}

/// Run the pipeline once over explicit paths
pub fn run_pipeline(input: &Path, output: &Path, model: ModelConfig) -> Result<PipelineReport> {
    let paths = PipelineConfig {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
    };
    Pipeline::new(paths, model).run()
}

/// Pair each reading with its probability and derive flag and tier.
/// Explanations are left empty for the explain stage.
pub fn score(readings: &[SensorReading], probabilities: &[f64]) -> Result<Vec<ScoredReading>> {
    if readings.len() != probabilities.len() {
        return Err(AppError::Inference(format!(
            "{} probabilities for {} readings",
            probabilities.len(),
            readings.len()
        )));
    }

    if let Some(p) = probabilities.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(AppError::Inference(format!(
            "probability {} outside [0, 1]",
            p
        )));
    }

    Ok(readings
        .iter()
        .zip(probabilities)
        .map(|(reading, &p)| ScoredReading::from_reading(reading.clone(), p))
        .collect())
}

#[derive(Default)]
struct StageTimer {
    timings: Vec<StageTiming>,
}

impl StageTimer {
    fn time<T>(&mut self, stage: PipelineStage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        let stage_name: &'static str = stage.into();
        PIPELINE_METRICS.record_stage(stage_name, elapsed.as_secs_f64());

        if let Err(e) = &result {
            error!(stage = stage_name, error = %e, "Pipeline stage failed");
        } else {
            info!(
                stage = stage_name,
                duration_ms = elapsed.as_secs_f64() * 1000.0,
                "Pipeline stage completed"
            );
        }

        self.timings.push(StageTiming {
            stage,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
        });

        result
    }

    fn into_timings(self) -> Vec<StageTiming> {
        self.timings
    }
}
