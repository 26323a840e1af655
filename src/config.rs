use crate::scheduler::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input/output locations for a pipeline run
    pub pipeline: PipelineConfig,

    /// Failure classifier hyperparameters
    #[serde(default)]
    pub model: ModelConfig,

    /// Daily trigger configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Dashboard report configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from `$CONFIG_PATH` (default `config/local.toml`)
    /// and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration from an optional override file and environment
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: SMART_SCHED_)
            .add_source(
                config::Environment::with_prefix("SMART_SCHED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            model: ModelConfig::default(),
            scheduler: SchedulerConfig::default(),
            dashboard: DashboardConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sensor readings CSV
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,

    /// Scored schedule CSV (replaced on every run)
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of trees in the ensemble
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Fraction of rows held out from training
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the split and bootstrap resampling
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: u16,

    /// Minimum samples required to split a node
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            test_size: default_test_size(),
            seed: default_seed(),
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Where the rendered report goes
    #[serde(default = "default_dashboard_path")]
    pub output_path: PathBuf,

    /// "json" or "html"
    #[serde(default = "default_dashboard_format")]
    pub format: String,

    /// Size of the explanation frequency table
    #[serde(default = "default_top_explanations")]
    pub top_explanations: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            output_path: default_dashboard_path(),
            format: default_dashboard_format(),
            top_explanations: default_top_explanations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,

    /// Write the metrics registry in text exposition format here after each
    /// command (for a node-exporter textfile collector)
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            prometheus_enabled: true,
            metrics_path: None,
        }
    }
}

// Default value functions
fn default_input_path() -> PathBuf {
    PathBuf::from("data/synthetic_asset_data.csv")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/final_schedule.csv")
}

fn default_n_trees() -> usize {
    100
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_max_depth() -> u16 {
    30
}

fn default_min_samples_split() -> usize {
    2
}

fn default_dashboard_path() -> PathBuf {
    PathBuf::from("data/dashboard.html")
}

fn default_dashboard_format() -> String {
    "html".to_string()
}

fn default_top_explanations() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
