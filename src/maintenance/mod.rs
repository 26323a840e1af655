//! Maintenance rules applied to scored readings
//!
//! - [`priority`]: threshold rule from failure probability to tier
//! - [`explanation`]: templated text per tier and asset

pub mod explanation;
pub mod priority;

pub use explanation::{explain, ExplanationGenerator};
pub use priority::{classify, PriorityCounts};
