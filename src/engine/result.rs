//! Tagged prediction results

use serde::{Deserialize, Serialize};

use crate::error::PredictorError;
use crate::types::Method;

/// Frequency-based estimate over the recent window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalEstimate {
    pub value: u32,
    /// `occurrences / window`
    pub confidence: f64,
    /// Number of recent draws considered (K)
    pub window: usize,
    pub occurrences: usize,
}

/// Classifier-based estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MlEstimate {
    pub value: u32,
    /// Highest class probability
    pub confidence: f64,
    pub holdout_accuracy: Option<f64>,
}

/// One of the estimates considered by the combined method
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub kind: Method,
    pub value: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedEstimate {
    pub value: u32,
    /// max of the candidate confidences
    pub confidence: f64,
    /// Which candidate supplied `value`
    pub winner: Method,
    pub candidates: Vec<Candidate>,
}

impl CombinedEstimate {
    /// Pick the higher-confidence candidate; equal confidence goes to the classifier
    pub fn arbitrate(statistical: &StatisticalEstimate, ml: &MlEstimate) -> Self {
        let (winner, value) = if ml.confidence >= statistical.confidence {
            (Method::Ml, ml.value)
        } else {
            (Method::Statistical, statistical.value)
        };

        Self {
            value,
            confidence: statistical.confidence.max(ml.confidence),
            winner,
            candidates: vec![
                Candidate {
                    kind: Method::Statistical,
                    value: statistical.value,
                    confidence: statistical.confidence,
                },
                Candidate {
                    kind: Method::Ml,
                    value: ml.value,
                    confidence: ml.confidence,
                },
            ],
        }
    }
}

/// Structured failure carried in place of an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
    pub available: Option<usize>,
    pub required: Option<usize>,
}

impl From<&PredictorError> for ErrorReport {
    fn from(err: &PredictorError) -> Self {
        let counts = err.counts();
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            available: counts.map(|(available, _)| available),
            required: counts.map(|(_, required)| required),
        }
    }
}

/// Result of a prediction request, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PredictionResult {
    Statistical(StatisticalEstimate),
    Ml(MlEstimate),
    Combined(CombinedEstimate),
    Error(ErrorReport),
}

impl PredictionResult {
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Statistical(e) => Some(e.value),
            Self::Ml(e) => Some(e.value),
            Self::Combined(e) => Some(e.value),
            Self::Error(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Self::Statistical(e) => Some(e.confidence),
            Self::Ml(e) => Some(e.confidence),
            Self::Combined(e) => Some(e.confidence),
            Self::Error(_) => None,
        }
    }

    /// Method that produced the result, `None` for errors
    pub fn method(&self) -> Option<Method> {
        match self {
            Self::Statistical(_) => Some(Method::Statistical),
            Self::Ml(_) => Some(Method::Ml),
            Self::Combined(_) => Some(Method::Combined),
            Self::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<&PredictorError> for PredictionResult {
    fn from(err: &PredictorError) -> Self {
        Self::Error(ErrorReport::from(err))
    }
}

/// Output of `generate_prediction`: the result plus the stored prediction id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPrediction {
    #[serde(flatten)]
    pub result: PredictionResult,
    /// Set when the prediction was recorded
    pub prediction_id: Option<i64>,
}
