//! Error types for the prediction engine

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, PredictorError>;

/// Errors surfaced by analysis, training and prediction
#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Insufficient data: need at least {required} observations, got {available}")]
    InsufficientData { available: usize, required: usize },

    #[error("Insufficient training data: need at least {required} training rows, got {available}")]
    InsufficientTrainingData { available: usize, required: usize },

    #[error("Model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PredictorError {
    /// Stable machine-readable code for structured error results
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
            Self::InsufficientTrainingData { .. } => "insufficient_training_data",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Config(_) => "config",
        }
    }

    /// (available, required) counts, when the error carries them
    pub fn counts(&self) -> Option<(usize, usize)> {
        match self {
            Self::InsufficientData { available, required }
            | Self::InsufficientTrainingData { available, required } => Some((*available, *required)),
            _ => None,
        }
    }
}

/// Persistence errors from the observation and prediction stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Value {value} exceeds the configured bound of {max}")]
    ValueOutOfRange { value: u32, max: u32 },

    #[error("Prediction {0} not found")]
    NotFound(i64),

    #[error("Prediction {0} has already been resolved")]
    AlreadyResolved(i64),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
