use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Probability above which a row is flagged as a predicted failure
pub const PREDICTED_FAILURE_THRESHOLD: f64 = 0.5;

/// Probability above which a row is Urgent
pub const URGENT_THRESHOLD: f64 = 0.85;

/// Probability above which a row is at least Medium
pub const MEDIUM_THRESHOLD: f64 = 0.70;

/// Maintenance priority tier, ordered `Low < Medium < Urgent`
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    EnumIter,
    Display,
)]
pub enum Priority {
    Low,
    Medium,
    Urgent,
}

impl Priority {
    /// Bucket a failure probability into a tier.
    ///
    /// Both cut points are strict: 0.85 is Medium and 0.70 is Low.
    pub fn from_probability(probability: f64) -> Self {
        if probability > URGENT_THRESHOLD {
            Priority::Urgent
        } else if probability > MEDIUM_THRESHOLD {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Whether a probability counts as a predicted failure (strict `>`)
pub fn predicted_failure(probability: f64) -> bool {
    probability > PREDICTED_FAILURE_THRESHOLD
}
