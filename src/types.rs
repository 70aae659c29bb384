//! Core domain types: observations, predictions and method labels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source label used for hand-entered draws
pub const MANUAL_SOURCE: &str = "manual";

/// A single persisted draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub value: u32,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub draw_name: Option<String>,
    pub draw_time: Option<String>,
}

/// A draw that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewObservation {
    pub value: u32,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub draw_name: Option<String>,
    pub draw_time: Option<String>,
}

impl NewObservation {
    pub fn new(value: u32, source: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            source: source.into(),
            draw_name: None,
            draw_time: None,
        }
    }

    pub fn with_draw(mut self, name: Option<String>, time: Option<String>) -> Self {
        self.draw_name = name;
        self.draw_time = time;
        self
    }
}

/// Estimation method requested by a caller and recorded on a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Most frequent value in the recent window
    Statistical,
    /// Random forest classifier over sliding-window features
    Ml,
    /// Higher-confidence of the two above
    Combined,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Statistical => "statistical",
            Method::Ml => "ml",
            Method::Combined => "combined",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "statistical" | "stat" => Ok(Method::Statistical),
            "ml" => Ok(Method::Ml),
            "combined" => Ok(Method::Combined),
            other => Err(format!("unknown method '{}', expected statistical, ml or combined", other)),
        }
    }
}

/// A persisted prediction, possibly resolved against the real draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    pub predicted_value: u32,
    /// Self-reported certainty in [0, 1]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub method: Method,
    pub actual_value: Option<u32>,
    /// Unknown until resolved, then set exactly once
    pub correct: Option<bool>,
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        self.correct.is_some()
    }
}

/// A prediction about to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPrediction {
    pub predicted_value: u32,
    pub confidence: f64,
    pub method: Method,
    pub timestamp: DateTime<Utc>,
}

impl NewPrediction {
    pub fn new(predicted_value: u32, confidence: f64, method: Method) -> Self {
        Self {
            predicted_value,
            confidence: confidence.clamp(0.0, 1.0),
            method,
            timestamp: Utc::now(),
        }
    }
}

/// Chronologically ascending snapshot of recent draws
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub values: Vec<u32>,
    pub timestamps: Vec<DateTime<Utc>>,
}

impl History {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
