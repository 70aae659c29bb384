//! Machine Learning prediction module
//!
//! Provides the learned half of the engine:
//! - Sliding-window feature construction
//! - Standardization fitted on training rows only
//! - Seeded smartcore random forest (one class per observed value)
//! - Training with a reproducible held-out split

pub mod features;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use features::{FeatureBuilder, TrainingSet, DEFAULT_WINDOW, DERIVED_FEATURES};
pub use trainer::{split_indices, ClassPrediction, ClassifierTrainer, ModelSummary, TrainedModel};
