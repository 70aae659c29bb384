//! Draw Predictor
//!
//! Predicts the next value of a sequence of bounded integer draws from its
//! history, using frequency statistics, a random forest classifier, or the
//! more confident of the two.
//!
//! ## Architecture
//!
//! ```text
//! Storage (SQLite / memory) → HistoryLoader → StatisticalAnalyzer ──┐
//!                                           → FeatureBuilder → ClassifierTrainer ─┤
//!                                                                                 ↓
//!                                                   PredictionEngine (arbitration)
//!                                                                                 ↓
//!                                        PredictionStore ← EvaluationTracker (hit rate)
//! ```

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod ml;
pub mod storage;
pub mod types;

pub use engine::PredictionEngine;
pub use error::{PredictorError, Result};

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
