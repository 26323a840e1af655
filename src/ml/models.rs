use crate::error::{AppError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seeded partition of row indices into a training and a held-out subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSplit {
    /// Rows the ensemble is fitted on, in shuffled order
    pub train: Vec<usize>,

    /// Rows held out from fitting (not scored separately)
    pub held_out: Vec<usize>,
}

impl TrainingSplit {
    /// Shuffle `0..n_samples` with a seeded RNG and hold out
    /// `ceil(n_samples * test_size)` rows from the front of the permutation.
    pub fn new(n_samples: usize, test_size: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_size) {
            return Err(AppError::Configuration(format!(
                "test_size must be in [0, 1), got {}",
                test_size
            )));
        }

        let n_test = (n_samples as f64 * test_size).ceil() as usize;
        if n_test >= n_samples {
            return Err(AppError::Training(format!(
                "{} rows leave nothing to train on with test_size {}",
                n_samples, test_size
            )));
        }

        let mut permutation: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        permutation.shuffle(&mut rng);

        let train = permutation.split_off(n_test);

        Ok(Self {
            train,
            held_out: permutation,
        })
    }

    pub fn n_train(&self) -> usize {
        self.train.len()
    }

    pub fn n_held_out(&self) -> usize {
        self.held_out.len()
    }
}

/// Binary classification metrics on the training subset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support: 0,
        }
    }

    /// Compute metrics for the positive (failure) class
    pub fn from_predictions(y_true: &[u8], y_pred: &[bool]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::new();
        }

        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_count = 0usize;
        let mut correct = 0usize;

        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            let actual = truth == 1;
            if actual == pred {
                correct += 1;
            }
            match (actual, pred) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_count += 1,
                (false, false) => {}
            }
        }

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };

        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };

        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: correct as f64 / n_samples as f64,
            precision,
            recall,
            f1_score,
            support: tp + fn_count,
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Rows the ensemble was fitted on
    pub n_training_samples: usize,

    /// Rows held out by the split
    pub n_held_out_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Number of distinct assets seen at fit time
    pub n_assets: usize,

    /// Metrics on the training subset
    pub training_metrics: ModelMetrics,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Bootstrap-aggregated Gini trees; every split sees all features
    BaggedTrees,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::BaggedTrees => write!(f, "Bagged Decision Trees"),
        }
    }
}
