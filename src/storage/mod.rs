//! Persistence collaborators
//!
//! The engine only talks to the two store traits below. `Database` backs them
//! with SQLite; `MemoryStore` keeps everything in process for tests and
//! embedders that bring their own persistence.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::Database;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::types::{NewObservation, NewPrediction, Observation, Prediction};

/// Append-only store of draws
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Persist one draw and return its id
    async fn append_observation(&self, observation: NewObservation) -> StoreResult<i64>;

    /// Persist a batch atomically: either every draw is stored or none is
    async fn append_observations(&self, observations: Vec<NewObservation>) -> StoreResult<Vec<i64>>;

    /// Newest first, ordered by timestamp then id
    async fn recent_observations(&self, limit: usize, offset: usize) -> StoreResult<Vec<Observation>>;

    async fn count_observations(&self) -> StoreResult<usize>;
}

/// Store of issued predictions and their later resolution
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn record_prediction(&self, prediction: NewPrediction) -> StoreResult<i64>;

    /// Predictions with `timestamp >= since`, oldest first
    async fn predictions_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Prediction>>;

    /// Set the actual value and correctness flag; fails if already set
    async fn update_prediction(&self, id: i64, actual_value: u32, correct: bool) -> StoreResult<()>;

    async fn get_prediction(&self, id: i64) -> StoreResult<Option<Prediction>>;

    /// Newest first
    async fn recent_predictions(&self, limit: usize) -> StoreResult<Vec<Prediction>>;

    async fn count_predictions(&self) -> StoreResult<usize>;
}

/// Compare a stored prediction with the real draw and record the outcome once.
pub async fn resolve_prediction(
    store: &dyn PredictionStore,
    id: i64,
    actual_value: u32,
) -> StoreResult<Prediction> {
    let prediction = store
        .get_prediction(id)
        .await?
        .ok_or(StoreError::NotFound(id))?;

    if prediction.is_resolved() {
        return Err(StoreError::AlreadyResolved(id));
    }

    let correct = prediction.predicted_value == actual_value;
    store.update_prediction(id, actual_value, correct).await?;

    tracing::info!(
        id,
        predicted = prediction.predicted_value,
        actual = actual_value,
        correct,
        "Prediction resolved"
    );

    Ok(Prediction {
        actual_value: Some(actual_value),
        correct: Some(correct),
        ..prediction
    })
}

pub(crate) fn check_bound(value: u32, max_value: Option<u32>) -> StoreResult<()> {
    match max_value {
        Some(max) if value > max => Err(StoreError::ValueOutOfRange { value, max }),
        _ => Ok(()),
    }
}
