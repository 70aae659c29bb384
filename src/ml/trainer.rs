//! Classifier training: deterministic split, scaling, forest fit

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use smartcore::api::{Transformer, UnsupervisedEstimator};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::{Array, Array2};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::preprocessing::numerical::{StandardScaler, StandardScalerParameters};
use std::fmt;

use super::features::TrainingSet;
use crate::config::TrainerConfig;
use crate::error::{PredictorError, Result};

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Winning class and its probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    pub label: u32,
    pub probability: f64,
}

/// Fitted scaler and forest, kept for the lifetime of an engine
pub struct TrainedModel {
    scaler: StandardScaler<f64>,
    forest: Forest,
    /// Draw value for each forest label; the forest is fitted on indices into this
    classes: Vec<u32>,
    trees: usize,
    training_rows: usize,
    holdout_rows: usize,
    holdout_accuracy: Option<f64>,
    trained_at: DateTime<Utc>,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("classes", &self.classes)
            .field("trees", &self.trees)
            .field("training_rows", &self.training_rows)
            .field("holdout_accuracy", &self.holdout_accuracy)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub classes: usize,
    pub trees: usize,
    pub training_rows: usize,
    pub holdout_rows: usize,
    /// Informational only, never gates use of the model
    pub holdout_accuracy: Option<f64>,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Scale `features` with the training-time scaler and classify
    pub fn predict(&self, features: &[f64]) -> Result<ClassPrediction> {
        let proba = self.predict_proba(features)?;
        best_class(&self.classes, &proba).ok_or_else(|| PredictorError::ModelUnavailable {
            reason: "classifier has no classes".to_string(),
        })
    }

    /// Class probabilities aligned with [`Self::classes`]
    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        let mut rows = self.probabilities(&[features.to_vec()])?;
        Ok(rows.pop().unwrap_or_default())
    }

    /// Sorted distinct draw values seen in the training partition
    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.holdout_accuracy
    }

    /// Apply the training-time scaler to `rows`
    pub fn scale(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        Ok(matrix_rows(&scale_matrix(&self.scaler, rows)?))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            classes: self.classes.len(),
            trees: self.trees,
            training_rows: self.training_rows,
            holdout_rows: self.holdout_rows,
            holdout_accuracy: self.holdout_accuracy,
            trained_at: self.trained_at,
        }
    }

    fn probabilities(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let scaled = scale_matrix(&self.scaler, rows)?;
        let proba = self.forest.predict_proba(&scaled).map_err(unavailable)?;

        let (n_rows, n_classes) = proba.shape();
        if n_classes != self.classes.len() {
            return Err(PredictorError::ModelUnavailable {
                reason: format!(
                    "classifier returned {} class columns for {} classes",
                    n_classes,
                    self.classes.len()
                ),
            });
        }

        Ok((0..n_rows)
            .map(|i| (0..n_classes).map(|j| *proba.get((i, j))).collect())
            .collect())
    }

    /// Fraction of `rows` classified as their target, `None` when there are no rows
    fn score(&self, rows: &[Vec<f64>], targets: &[u32]) -> Result<Option<f64>> {
        if rows.is_empty() {
            return Ok(None);
        }
        let hits = self
            .probabilities(rows)?
            .iter()
            .zip(targets)
            .filter(|&(proba, &target)| {
                best_class(&self.classes, proba).map(|p| p.label) == Some(target)
            })
            .count();
        Ok(Some(hits as f64 / rows.len() as f64))
    }
}

/// Fits [`TrainedModel`]s from window features
#[derive(Debug, Clone, Default)]
pub struct ClassifierTrainer {
    config: TrainerConfig,
}

impl ClassifierTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Split, scale on the training part only, fit the forest, score the held-out part.
    pub fn train(&self, set: &TrainingSet) -> Result<TrainedModel> {
        let (train_idx, test_idx) = split_indices(set.len(), self.config.test_ratio, self.config.seed);

        if train_idx.len() < self.config.min_training_rows.max(1) {
            tracing::warn!(
                rows = set.len(),
                training_rows = train_idx.len(),
                "Not enough rows to train classifier"
            );
            return Err(PredictorError::InsufficientTrainingData {
                available: train_idx.len(),
                required: self.config.min_training_rows.max(1),
            });
        }

        let pick = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<u32>) {
            idx.iter()
                .map(|&i| (set.features[i].clone(), set.targets[i]))
                .unzip()
        };
        let (train_x, train_y) = pick(&train_idx);
        let (test_x, test_y) = pick(&test_idx);

        let mut classes = train_y.clone();
        classes.sort_unstable();
        classes.dedup();
        let labels: Vec<i32> = train_y
            .iter()
            .map(|t| classes.binary_search(t).unwrap_or_default() as i32)
            .collect();

        let scaler = fit_scaler(&train_x)?;
        let parameters = RandomForestClassifierParameters::default()
            .with_n_trees(u16::try_from(self.config.n_trees.max(1)).unwrap_or(u16::MAX))
            .with_max_depth(u16::try_from(self.config.max_depth).unwrap_or(u16::MAX))
            .with_min_samples_split(self.config.min_samples_split)
            .with_seed(self.config.seed);

        tracing::debug!(
            training_rows = train_x.len(),
            trees = self.config.n_trees,
            "Fitting random forest"
        );
        let forest = RandomForestClassifier::fit(&scale_matrix(&scaler, &train_x)?, &labels, parameters)
            .map_err(unavailable)?;

        let mut model = TrainedModel {
            scaler,
            forest,
            classes,
            trees: self.config.n_trees.max(1),
            training_rows: train_x.len(),
            holdout_rows: test_x.len(),
            holdout_accuracy: None,
            trained_at: Utc::now(),
        };
        model.holdout_accuracy = model.score(&test_x, &test_y)?;

        tracing::info!(
            training_rows = model.training_rows,
            holdout_rows = model.holdout_rows,
            classes = model.classes.len(),
            "Classifier trained, held-out accuracy: {}",
            model
                .holdout_accuracy
                .map(|a| format!("{:.2}%", a * 100.0))
                .unwrap_or_else(|| "n/a".to_string())
        );

        Ok(model)
    }
}

/// Seeded shuffle of `0..n`; the first `ceil(n * test_ratio)` indices are held out.
/// Returns (training, held-out).
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let ratio = test_ratio.clamp(0.0, 1.0);
    let n_test = ((n as f64 * ratio).ceil() as usize).min(n);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Arg-max over `proba`; equal probabilities resolve to the smaller class value
pub(crate) fn best_class(classes: &[u32], proba: &[f64]) -> Option<ClassPrediction> {
    let mut best: Option<(u32, f64)> = None;
    for (&label, &p) in classes.iter().zip(proba) {
        let better = match best {
            None => true,
            Some((best_label, best_p)) => p > best_p || (p == best_p && label < best_label),
        };
        if better {
            best = Some((label, p));
        }
    }
    best.map(|(label, p)| ClassPrediction {
        label,
        probability: p.clamp(0.0, 1.0),
    })
}

/// Standardization fitted on `rows` only
pub(crate) fn fit_scaler(rows: &[Vec<f64>]) -> Result<StandardScaler<f64>> {
    StandardScaler::fit(&to_matrix(rows), StandardScalerParameters::default()).map_err(unavailable)
}

/// Scale `rows`; non-finite results from zero-variance columns come out as 0
pub(crate) fn scale_matrix(scaler: &StandardScaler<f64>, rows: &[Vec<f64>]) -> Result<DenseMatrix<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    let scaled = scaler.transform(&to_matrix(rows)).map_err(unavailable)?;
    let scaled = &scaled;
    Ok(DenseMatrix::from_iterator(
        (0..rows.len()).flat_map(move |i| {
            (0..width).map(move |j| {
                let v = *scaled.get((i, j));
                if v.is_finite() {
                    v
                } else {
                    0.0
                }
            })
        }),
        rows.len(),
        width,
        0,
    ))
}

fn to_matrix(rows: &[Vec<f64>]) -> DenseMatrix<f64> {
    let width = rows.first().map_or(0, Vec::len);
    DenseMatrix::from_iterator(rows.iter().flatten().copied(), rows.len(), width, 0)
}

fn matrix_rows(matrix: &DenseMatrix<f64>) -> Vec<Vec<f64>> {
    let (n_rows, n_cols) = matrix.shape();
    (0..n_rows)
        .map(|i| (0..n_cols).map(|j| *matrix.get((i, j))).collect())
        .collect()
}

fn unavailable(err: Failed) -> PredictorError {
    PredictorError::ModelUnavailable {
        reason: err.to_string(),
    }
}
