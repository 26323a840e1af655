//! Failure classification for sensor readings
//!
//! This module provides:
//! - Sorted label encoding of asset identifiers
//! - Fixed four-column feature matrices
//! - A seeded 80/20 train/held-out split
//! - A bagged ensemble of Gini decision trees producing failure probabilities

pub mod classifier;
pub mod features;
pub mod models;

pub use classifier::{FailureClassifier, FailureModel, TrainedModel};
pub use features::{encode, AssetEncoder, FeatureMatrix, FEATURE_NAMES};
pub use models::{ModelMetadata, ModelMetrics, ModelType, TrainingSplit};
