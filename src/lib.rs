//! Predictive maintenance scheduling for monitored assets.
//!
//! Sensor readings are scored by a bagged decision-tree classifier, bucketed
//! into maintenance tiers, explained, and written back out as a schedule.
//! The [`scheduler`] re-runs the [`pipeline`] daily and [`analytics`] turns
//! both datasets into dashboard data.

pub mod analytics;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod ml;
pub mod models;
pub mod pipeline;
pub mod scheduler;

pub use crate::config::Config;
pub use error::{AppError, Result};
