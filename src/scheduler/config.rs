//! Configuration for the scheduler module

use serde::{Deserialize, Serialize};

/// Configuration for the daily pipeline trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Six-field cron expression (sec min hour day month weekday), UTC
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Run the pipeline once as soon as the scheduler starts
    #[serde(default)]
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            schedule: default_schedule(),
            run_on_start: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_schedule() -> String {
    "0 0 0 * * *".to_string() // Daily at midnight
}

/// Builder for SchedulerConfig
pub struct SchedulerConfigBuilder {
    config: SchedulerConfig,
}

impl SchedulerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn schedule(mut self, schedule: impl Into<String>) -> Self {
        self.config.schedule = schedule.into();
        self
    }

    pub fn run_on_start(mut self, run_on_start: bool) -> Self {
        self.config.run_on_start = run_on_start;
        self
    }

    pub fn build(self) -> SchedulerConfig {
        self.config
    }
}

impl Default for SchedulerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
