use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::ml::features::{encode, AssetEncoder, FeatureMatrix, FEATURE_NAMES};
use crate::ml::models::{ModelMetadata, ModelMetrics, ModelType, TrainingSplit};
use crate::models::{predicted_failure, SensorReading};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Anything that can turn sensor readings into failure probabilities
pub trait FailureModel {
    /// Probability that the failure flag is set, one per reading
    fn predict_proba(&self, readings: &[SensorReading]) -> Result<Vec<f64>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;
}

/// Fits the bagged decision-tree ensemble.
///
/// Each member is a smartcore Gini tree fitted on a bootstrap sample of the
/// training rows. Unlike a random forest there is no per-split feature
/// subsampling, and the probability is the fraction of members voting
/// "failure" rather than an average of leaf class frequencies.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    config: ModelConfig,
}

impl FailureClassifier {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Train on all rows' labels.
    ///
    /// Rows are split 80/20 with the configured seed; only the training
    /// subset is bootstrapped into the trees.
    pub fn fit(&self, readings: &[SensorReading]) -> Result<TrainedModel> {
        let (encoder, features) = encode(readings);
        let labels: Vec<u8> = readings.iter().map(|r| r.failure).collect();
        self.fit_encoded(encoder, &features, &labels)
    }

    /// Train on a matrix produced by `encoder`; the encoder is kept in the
    /// returned model for inference.
    pub fn fit_encoded(
        &self,
        encoder: AssetEncoder,
        features: &FeatureMatrix,
        labels: &[u8],
    ) -> Result<TrainedModel> {
        if features.is_empty() {
            return Err(AppError::Training(
                "No sensor readings provided for training".to_string(),
            ));
        }

        if labels.len() != features.n_samples() {
            return Err(AppError::Training(format!(
                "{} labels for {} feature rows",
                labels.len(),
                features.n_samples()
            )));
        }

        if let Some((row, bad)) = labels.iter().enumerate().find(|&(_, &l)| l > 1) {
            return Err(AppError::Training(format!(
                "Failure label must be 0 or 1, got {} at row {}",
                bad, row
            )));
        }

        if self.config.n_trees == 0 {
            return Err(AppError::Configuration(
                "n_trees must be at least 1".to_string(),
            ));
        }

        let split = TrainingSplit::new(features.n_samples(), self.config.test_size, self.config.seed)?;
        let targets: Vec<i32> = labels.iter().map(|&l| i32::from(l)).collect();

        info!(
            n_samples = features.n_samples(),
            n_train = split.n_train(),
            n_held_out = split.n_held_out(),
            n_assets = encoder.len(),
            n_trees = self.config.n_trees,
            "Training failure classifier"
        );

        let params = DecisionTreeClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_max_depth(self.config.max_depth)
            .with_min_samples_split(self.config.min_samples_split);

        // Bootstrap draws use their own stream so the split stays comparable
        // across ensemble sizes.
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));
        let n_train = split.n_train();
        let mut trees = Vec::with_capacity(self.config.n_trees);

        for tree_index in 0..self.config.n_trees {
            let sample: Vec<usize> = (0..n_train)
                .map(|_| split.train[rng.gen_range(0..n_train)])
                .collect();
            let member = Self::fit_member(features, &targets, &sample, &params)?;
            if let Member::Constant(label) = &member {
                debug!(tree_index, label, "Bootstrap sample has a single class");
            }
            trees.push(member);
        }

        let mut model = TrainedModel {
            metadata: self.metadata(&split, encoder.len()),
            encoder,
            trees,
        };

        let train_probs = model.vote(features, &split.train)?;
        let train_labels: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
        let train_preds: Vec<bool> = train_probs.iter().map(|&p| predicted_failure(p)).collect();
        model.metadata.training_metrics = ModelMetrics::from_predictions(&train_labels, &train_preds);

        info!(
            accuracy = model.metadata.training_metrics.accuracy,
            f1_score = model.metadata.training_metrics.f1_score,
            "Failure classifier trained"
        );

        Ok(model)
    }

    fn fit_member(
        features: &FeatureMatrix,
        labels: &[i32],
        sample: &[usize],
        params: &DecisionTreeClassifierParameters,
    ) -> Result<Member> {
        let y: Vec<i32> = sample.iter().map(|&i| labels[i]).collect();

        // A tree cannot be grown on a single class; it always votes that class.
        let first = y[0];
        if y.iter().all(|&label| label == first) {
            return Ok(Member::Constant(first));
        }

        let x = DenseMatrix::new(
            sample.len(),
            features.n_features(),
            features.gather_rows(sample),
            false,
        );

        let tree = DecisionTreeClassifier::fit(&x, &y, params.clone())
            .map_err(|e| AppError::Training(format!("Failed to train decision tree: {}", e)))?;

        Ok(Member::Tree(tree))
    }

    fn metadata(&self, split: &TrainingSplit, n_assets: usize) -> ModelMetadata {
        let hyperparameters: BTreeMap<String, String> = [
            ("n_trees", self.config.n_trees.to_string()),
            ("test_size", self.config.test_size.to_string()),
            ("seed", self.config.seed.to_string()),
            ("max_depth", self.config.max_depth.to_string()),
            ("min_samples_split", self.config.min_samples_split.to_string()),
            ("criterion", "gini".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        ModelMetadata {
            name: "Failure Classifier".to_string(),
            model_type: ModelType::BaggedTrees,
            trained_at: chrono::Utc::now(),
            n_training_samples: split.n_train(),
            n_held_out_samples: split.n_held_out(),
            n_features: FEATURE_NAMES.len(),
            n_assets,
            training_metrics: ModelMetrics::new(),
            hyperparameters,
        }
    }
}

enum Member {
    Tree(Tree),
    Constant(i32),
}

/// A fitted ensemble together with the asset encoding it was trained with
pub struct TrainedModel {
    metadata: ModelMetadata,
    encoder: AssetEncoder,
    trees: Vec<Member>,
}

impl TrainedModel {
    /// The asset encoding fixed at fit time
    pub fn encoder(&self) -> &AssetEncoder {
        &self.encoder
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Probabilities for an already encoded matrix
    pub fn predict_features(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if features.n_features() != self.metadata.n_features {
            return Err(AppError::Inference(format!(
                "Model expects {} features, got {}",
                self.metadata.n_features,
                features.n_features()
            )));
        }

        let rows: Vec<usize> = (0..features.n_samples()).collect();
        self.vote(features, &rows)
    }

    /// Fraction of ensemble members voting "failure" for each selected row
    fn vote(&self, features: &FeatureMatrix, rows: &[usize]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let x = DenseMatrix::new(
            rows.len(),
            features.n_features(),
            features.gather_rows(rows),
            false,
        );

        let mut votes = vec![0u32; rows.len()];
        for member in &self.trees {
            match member {
                Member::Constant(1) => votes.iter_mut().for_each(|v| *v += 1),
                Member::Constant(_) => {}
                Member::Tree(tree) => {
                    let predictions = tree
                        .predict(&x)
                        .map_err(|e| AppError::Inference(format!("Prediction failed: {}", e)))?;
                    for (vote, label) in votes.iter_mut().zip(predictions) {
                        if label == 1 {
                            *vote += 1;
                        }
                    }
                }
            }
        }

        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| f64::from(v) / n_trees).collect())
    }
}

impl FailureModel for TrainedModel {
    fn predict_proba(&self, readings: &[SensorReading]) -> Result<Vec<f64>> {
        let features = self.encoder.transform(readings)?;
        self.predict_features(&features)
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}

impl std::fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainedModel")
            .field("metadata", &self.metadata)
            .field("encoder", &self.encoder)
            .field("n_trees", &self.trees.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    /// Two assets; hot readings fail, cool readings don't.
    fn create_test_readings(n_days: usize) -> Vec<SensorReading> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut readings = Vec::new();
        for day in 0..n_days {
            let date = start + Duration::days(day as i64);
            for (asset, offset) in [("A1", 0.0), ("A2", 5.0)] {
                let hot = day % 4 == 0;
                readings.push(SensorReading::new(
                    asset,
                    date,
                    100.0 + day as f64 * 3.0 + offset,
                    if hot { 95.0 + offset } else { 60.0 + offset },
                    if hot { 45.0 } else { 30.0 },
                    u8::from(hot),
                ));
            }
        }
        readings
    }

    fn small_config() -> ModelConfig {
        ModelConfig {
            n_trees: 15,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_fit_records_split_in_metadata() {
        let readings = create_test_readings(50);
        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();

        let metadata = model.metadata();
        assert_eq!(metadata.n_training_samples, 80);
        assert_eq!(metadata.n_held_out_samples, 20);
        assert_eq!(metadata.n_features, 4);
        assert_eq!(metadata.n_assets, 2);
        assert_eq!(model.n_trees(), 15);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let readings = create_test_readings(40);
        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();
        let probs = model.predict_proba(&readings).unwrap();

        assert_eq!(probs.len(), readings.len());
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_separable_data_is_learned() {
        let readings = create_test_readings(60);
        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();
        let probs = model.predict_proba(&readings).unwrap();

        let (mut failed, mut healthy) = (Vec::new(), Vec::new());
        for (reading, p) in readings.iter().zip(&probs) {
            if reading.failed() {
                failed.push(*p);
            } else {
                healthy.push(*p);
            }
        }
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;

        assert!(mean(&failed) > 0.8, "failed rows mean {}", mean(&failed));
        assert!(mean(&healthy) < 0.2, "healthy rows mean {}", mean(&healthy));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let readings = create_test_readings(30);
        let classifier = FailureClassifier::new(small_config());

        let a = classifier.fit(&readings).unwrap().predict_proba(&readings).unwrap();
        let b = classifier.fit(&readings).unwrap().predict_proba(&readings).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_training_data() {
        let readings: Vec<SensorReading> = create_test_readings(20)
            .into_iter()
            .map(|mut r| {
                r.failure = 0;
                r
            })
            .collect();

        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();
        let probs = model.predict_proba(&readings).unwrap();

        assert!(probs.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let result = FailureClassifier::new(small_config()).fit(&[]);
        assert!(matches!(result, Err(AppError::Training(_))));
    }

    #[test]
    fn test_fit_rejects_invalid_labels() {
        let mut readings = create_test_readings(10);
        readings[3].failure = 2;

        let result = FailureClassifier::new(small_config()).fit(&readings);
        assert!(matches!(result, Err(AppError::Training(_))));
    }

    #[test]
    fn test_predict_rejects_unseen_asset() {
        let readings = create_test_readings(10);
        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();

        let mut unseen = readings[0].clone();
        unseen.asset_id = "Z9".to_string();

        let result = model.predict_proba(&[unseen]);
        assert!(matches!(result, Err(AppError::Inference(_))));
    }

    #[test]
    fn test_predict_empty_rows() {
        let readings = create_test_readings(10);
        let model = FailureClassifier::new(small_config()).fit(&readings).unwrap();

        assert!(model.predict_proba(&[]).unwrap().is_empty());
    }
}
