use crate::error::{AppError, Result};
use crate::models::SensorReading;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Feature columns, in matrix order
pub const FEATURE_NAMES: [&str; 4] = ["Asset_ID_Code", "Usage_Hours", "Temperature", "Pressure"];

/// Sorted label encoding of asset identifiers.
///
/// Codes are assigned `0..n` in lexicographic order of the distinct ids seen
/// at fit time. The fitted encoder travels with the trained model so
/// inference reuses exactly the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEncoder {
    codes: BTreeMap<String, usize>,
}

impl AssetEncoder {
    /// Fit the encoder on the distinct asset ids of `readings`
    pub fn fit(readings: &[SensorReading]) -> Self {
        let ids: BTreeSet<&str> = readings.iter().map(|r| r.asset_id.as_str()).collect();

        let codes = ids
            .into_iter()
            .enumerate()
            .map(|(code, id)| (id.to_string(), code))
            .collect();

        Self { codes }
    }

    /// Code for an asset id, if it was seen at fit time
    pub fn code(&self, asset_id: &str) -> Option<usize> {
        self.codes.get(asset_id).copied()
    }

    /// Known asset ids in code order
    pub fn classes(&self) -> Vec<&str> {
        self.codes.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Encode readings into a feature matrix, rejecting unseen asset ids
    pub fn transform(&self, readings: &[SensorReading]) -> Result<FeatureMatrix> {
        let mut features = Array2::zeros((readings.len(), FEATURE_NAMES.len()));

        for (i, reading) in readings.iter().enumerate() {
            let code = self.code(&reading.asset_id).ok_or_else(|| {
                AppError::Inference(format!(
                    "asset '{}' was not seen when the model was trained",
                    reading.asset_id
                ))
            })?;
            fill_row(&mut features, i, code, reading);
        }

        Ok(FeatureMatrix { features })
    }
}

/// Row-major `n_samples x 4` matrix of encoded features
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    features: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.features
    }

    /// One row as a slice-backed vector
    pub fn row(&self, index: usize) -> Vec<f64> {
        self.features.row(index).to_vec()
    }

    /// Flatten the given rows, in order, into a row-major buffer
    pub fn gather_rows(&self, indices: &[usize]) -> Vec<f64> {
        let mut data = Vec::with_capacity(indices.len() * self.n_features());
        for &i in indices {
            data.extend(self.features.row(i).iter().copied());
        }
        data
    }
}

/// Fit an encoder on `readings` and encode them in a single pass
pub fn encode(readings: &[SensorReading]) -> (AssetEncoder, FeatureMatrix) {
    let encoder = AssetEncoder::fit(readings);
    let mut features = Array2::zeros((readings.len(), FEATURE_NAMES.len()));

    for (i, reading) in readings.iter().enumerate() {
        // Every id is present: the encoder was fitted on these rows.
        let code = encoder.codes[reading.asset_id.as_str()];
        fill_row(&mut features, i, code, reading);
    }

    (encoder, FeatureMatrix { features })
}

fn fill_row(features: &mut Array2<f64>, i: usize, code: usize, reading: &SensorReading) {
    features[[i, 0]] = code as f64;
    features[[i, 1]] = reading.usage_hours;
    features[[i, 2]] = reading.temperature;
    features[[i, 3]] = reading.pressure;
}
