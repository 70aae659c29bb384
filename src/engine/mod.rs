//! Prediction engine
//!
//! Wires the history loader, statistical analyzer, feature builder and
//! classifier trainer together and arbitrates between the two estimates.
//!
//! ```text
//! ObservationStore → HistoryLoader → StatisticalAnalyzer ─┐
//!                                  → FeatureBuilder → ClassifierTrainer ─┤→ arbitration → PredictionStore
//! ```
//!
//! Trained state lives on the engine instance. Operations that may train take
//! `&mut self`; share an instance across tasks only behind a lock.

pub mod evaluation;
pub mod loader;
pub mod result;


pub use evaluation::{Evaluation, EvaluationReport, EvaluationTracker};
pub use loader::HistoryLoader;
pub use result::{
    Candidate, CombinedEstimate, ErrorReport, GeneratedPrediction, MlEstimate, PredictionResult,
    StatisticalEstimate,
};

use std::sync::Arc;

use crate::analysis::{self, StatisticalAnalyzer, Statistics};
use crate::config::{Config, EngineConfig};
use crate::error::{PredictorError, Result};
use crate::ml::{ClassifierTrainer, FeatureBuilder, ModelSummary, TrainedModel};
use crate::storage::{ObservationStore, PredictionStore};
use crate::types::{History, Method, NewPrediction};

/// Most frequent value among the last `recent_window` draws.
///
/// Confidence is `count(mode) / K` with `K = min(recent_window, len)`.
pub fn frequency_estimate(values: &[u32], recent_window: usize) -> Option<StatisticalEstimate> {
    let k = recent_window.min(values.len());
    if k == 0 {
        return None;
    }
    let recent = &values[values.len() - k..];
    analysis::mode(recent).map(|entry| StatisticalEstimate {
        value: entry.value,
        confidence: entry.count as f64 / k as f64,
        window: k,
        occurrences: entry.count,
    })
}

/// Stateful predictor owning its trained model
pub struct PredictionEngine {
    config: EngineConfig,
    loader: HistoryLoader,
    predictions: Arc<dyn PredictionStore>,
    analyzer: StatisticalAnalyzer,
    features: FeatureBuilder,
    trainer: ClassifierTrainer,
    model: Option<TrainedModel>,
}

impl PredictionEngine {
    pub fn new(
        observations: Arc<dyn ObservationStore>,
        predictions: Arc<dyn PredictionStore>,
        config: &Config,
    ) -> Self {
        Self {
            config: config.engine.clone(),
            loader: HistoryLoader::new(observations),
            predictions,
            analyzer: StatisticalAnalyzer::new(config.engine.min_samples),
            features: FeatureBuilder::new(config.engine.window),
            trainer: ClassifierTrainer::new(config.trainer.clone()),
            model: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_summary(&self) -> Option<ModelSummary> {
        self.model.as_ref().map(TrainedModel::summary)
    }

    /// Drop the trained model; the next ML request trains a fresh one
    pub fn reset_model(&mut self) {
        self.model = None;
    }

    /// Descriptive statistics over the most recent `statistics_limit` draws
    pub async fn statistics(&self) -> Result<Statistics> {
        let history = self.loader.load(self.config.statistics_limit).await?;
        self.analyzer.analyze(&history.values)
    }

    /// Train (or retrain) the classifier on the current history
    pub async fn train(&mut self) -> Result<ModelSummary> {
        let history = self.loader.load(self.config.history_limit).await?;
        self.analyzer.ensure_enough(history.len())?;

        let model = self.trainer.train(&self.features.build(&history.values))?;
        let summary = model.summary();
        self.model = Some(model);
        Ok(summary)
    }

    /// Run one estimation method against freshly loaded history.
    ///
    /// Never returns `PredictionResult::Error`; failures come back as `Err`.
    pub async fn predict(&mut self, method: Method) -> Result<PredictionResult> {
        let history = self.load_checked().await?;
        self.predict_from(method, &history)
    }

    /// Predict, record the result, and fold every failure into a structured result.
    ///
    /// A combined request whose classifier cannot be produced falls back to the
    /// statistical estimate when `fallback_to_statistical` is set.
    pub async fn generate_prediction(&mut self, method: Method, save: bool) -> GeneratedPrediction {
        let history = match self.load_checked().await {
            Ok(history) => history,
            Err(e) => return Self::failed(method, &e),
        };

        let result = match self.predict_from(method, &history) {
            Ok(result) => result,
            Err(e @ PredictorError::ModelUnavailable { .. })
                if method == Method::Combined && self.config.fallback_to_statistical =>
            {
                tracing::warn!("Combined prediction degraded to statistical: {}", e);
                match self.predict_from(Method::Statistical, &history) {
                    Ok(result) => result,
                    Err(e) => return Self::failed(method, &e),
                }
            }
            Err(e) => return Self::failed(method, &e),
        };

        let prediction_id = if save { self.record(&result).await } else { Ok(None) };

        match prediction_id {
            Ok(prediction_id) => GeneratedPrediction { result, prediction_id },
            Err(e) => Self::failed(method, &e),
        }
    }

    /// Hit rate of predictions from the last `days` days
    pub async fn evaluate(&self, days: i64) -> Result<Evaluation> {
        self.evaluator().evaluate(days).await
    }

    pub fn evaluator(&self) -> EvaluationTracker {
        EvaluationTracker::new(self.predictions.clone())
    }

    async fn load_checked(&self) -> Result<History> {
        let history = self.loader.load(self.config.history_limit).await?;
        self.analyzer.ensure_enough(history.len())?;
        Ok(history)
    }

    fn predict_from(&mut self, method: Method, history: &History) -> Result<PredictionResult> {
        match method {
            Method::Statistical => Ok(PredictionResult::Statistical(self.statistical(history)?)),
            Method::Ml => Ok(PredictionResult::Ml(self.ml(history)?)),
            Method::Combined => {
                let statistical = self.statistical(history)?;
                let ml = self.ml(history)?;
                let combined = CombinedEstimate::arbitrate(&statistical, &ml);
                tracing::debug!(
                    winner = %combined.winner,
                    statistical = statistical.confidence,
                    ml = ml.confidence,
                    "Combined prediction arbitrated"
                );
                Ok(PredictionResult::Combined(combined))
            }
        }
    }

    fn statistical(&self, history: &History) -> Result<StatisticalEstimate> {
        frequency_estimate(&history.values, self.config.recent_window).ok_or(
            PredictorError::InsufficientData {
                available: history.len(),
                required: self.analyzer.min_samples().max(1),
            },
        )
    }

    fn ml(&mut self, history: &History) -> Result<MlEstimate> {
        if self.model.is_none() {
            let set = self.features.build(&history.values);
            let model = self.trainer.train(&set).map_err(|e| PredictorError::ModelUnavailable {
                reason: e.to_string(),
            })?;
            self.model = Some(model);
        }

        let model = self.model.as_ref().ok_or_else(|| PredictorError::ModelUnavailable {
            reason: "no trained model".to_string(),
        })?;

        let features = self.features.latest(&history.values).ok_or_else(|| {
            PredictorError::ModelUnavailable {
                reason: format!(
                    "history of {} draws is shorter than the feature window of {}",
                    history.len(),
                    self.features.window()
                ),
            }
        })?;

        let prediction = model.predict(&features)?;

        Ok(MlEstimate {
            value: prediction.label,
            confidence: prediction.probability,
            holdout_accuracy: model.holdout_accuracy(),
        })
    }

    async fn record(&self, result: &PredictionResult) -> Result<Option<i64>> {
        let (Some(value), Some(confidence), Some(method)) =
            (result.value(), result.confidence(), result.method())
        else {
            return Ok(None);
        };

        let id = self
            .predictions
            .record_prediction(NewPrediction::new(value, confidence, method))
            .await
            .map_err(|e| {
                tracing::warn!("Failed to record prediction: {}", e);
                PredictorError::from(e)
            })?;

        tracing::info!(id, value, confidence, method = %method, "Prediction recorded");
        Ok(Some(id))
    }

    fn failed(method: Method, err: &PredictorError) -> GeneratedPrediction {
        tracing::warn!(method = %method, "Prediction failed: {}", err);
        GeneratedPrediction {
            result: PredictionResult::from(err),
            prediction_id: None,
        }
    }
}
