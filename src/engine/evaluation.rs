//! Trailing-window hit rate of recorded predictions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::storage::PredictionStore;

/// Outcome of an evaluation over a trailing period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Evaluation {
    /// No predictions were issued in the period
    NoData { period_days: i64 },
    Scored(EvaluationReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub period_days: i64,
    pub total: usize,
    pub correct: usize,
    /// Predictions whose outcome is known, correct or not
    pub resolved: usize,
    /// `correct / total`; unresolved predictions count as misses
    pub hit_rate: f64,
}

impl Evaluation {
    pub fn hit_rate(&self) -> Option<f64> {
        match self {
            Evaluation::NoData { .. } => None,
            Evaluation::Scored(report) => Some(report.hit_rate),
        }
    }
}

/// Aggregates correctness flags set by whoever resolves predictions
#[derive(Clone)]
pub struct EvaluationTracker {
    store: Arc<dyn PredictionStore>,
}

impl EvaluationTracker {
    pub fn new(store: Arc<dyn PredictionStore>) -> Self {
        Self { store }
    }

    pub async fn evaluate(&self, days: i64) -> Result<Evaluation> {
        self.evaluate_at(days, Utc::now()).await
    }

    /// Evaluate predictions issued at or after `now - days`
    pub async fn evaluate_at(&self, days: i64, now: DateTime<Utc>) -> Result<Evaluation> {
        let since = Duration::try_days(days.max(0))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let predictions = self.store.predictions_since(since).await?;

        let total = predictions.len();
        if total == 0 {
            tracing::debug!(days, "No predictions to evaluate");
            return Ok(Evaluation::NoData { period_days: days });
        }

        let correct = predictions.iter().filter(|p| p.correct == Some(true)).count();
        let resolved = predictions.iter().filter(|p| p.is_resolved()).count();

        Ok(Evaluation::Scored(EvaluationReport {
            period_days: days,
            total,
            correct,
            resolved,
            hit_rate: correct as f64 / total as f64,
        }))
    }
}
