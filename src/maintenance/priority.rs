//! Threshold rule from failure probability to maintenance tier

use crate::models::{Priority, ScoredReading};
use serde::{Deserialize, Serialize};

/// Bucket a probability: `> 0.85` Urgent, `> 0.70` Medium, otherwise Low
pub fn classify(probability: f64) -> Priority {
    Priority::from_probability(probability)
}

/// Number of rows per tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub urgent: usize,
}

impl PriorityCounts {
    pub fn from_scored(rows: &[ScoredReading]) -> Self {
        rows.iter().fold(Self::default(), |mut counts, row| {
            counts.record(row.priority);
            counts
        })
    }

    pub fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::Urgent => self.urgent += 1,
        }
    }

    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::Urgent => self.urgent,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.urgent
    }
}
