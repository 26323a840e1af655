//! Templated explanations for scored readings

use crate::models::{Priority, ScoredReading};

/// Human-readable reason for a tier, naming the asset verbatim
pub fn explain(asset_id: &str, priority: Priority) -> String {
    match priority {
        Priority::Urgent => format!(
            "{} shows high risk of failure based on usage and temp. Immediate maintenance required.",
            asset_id
        ),
        Priority::Medium => format!(
            "{} is under moderate stress. Maintenance needed soon.",
            asset_id
        ),
        Priority::Low => format!("{} is operating normally.", asset_id),
    }
}

/// Fills the explanation column of scored rows
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplanationGenerator;

impl ExplanationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Explain a single row from its asset and tier
    pub fn explain_row(&self, row: &ScoredReading) -> String {
        explain(&row.asset_id, row.priority)
    }

    /// Attach explanations to every row in place
    pub fn apply(&self, rows: &mut [ScoredReading]) {
        for row in rows.iter_mut() {
            row.explanation = self.explain_row(row);
        }
    }
}
