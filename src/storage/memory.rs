//! In-process stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{check_bound, ObservationStore, PredictionStore};
use crate::error::{StoreError, StoreResult};
use crate::types::{NewObservation, NewPrediction, Observation, Prediction};

#[derive(Debug, Default)]
struct Inner {
    observations: Vec<Observation>,
    predictions: Vec<Prediction>,
    next_observation_id: i64,
    next_prediction_id: i64,
}

/// Memory-backed implementation of both store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    max_value: Option<u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_value(mut self, max_value: Option<u32>) -> Self {
        self.max_value = max_value;
        self
    }

    fn insert(inner: &mut Inner, observation: NewObservation) -> i64 {
        inner.next_observation_id += 1;
        let id = inner.next_observation_id;
        inner.observations.push(Observation {
            id,
            value: observation.value,
            timestamp: observation.timestamp,
            source: observation.source,
            draw_name: observation.draw_name,
            draw_time: observation.draw_time,
        });
        id
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn append_observation(&self, observation: NewObservation) -> StoreResult<i64> {
        check_bound(observation.value, self.max_value)?;
        Ok(Self::insert(&mut self.inner.write(), observation))
    }

    async fn append_observations(&self, observations: Vec<NewObservation>) -> StoreResult<Vec<i64>> {
        // Validate everything before touching state so a rejected batch leaves nothing behind
        for observation in &observations {
            check_bound(observation.value, self.max_value)?;
        }

        let mut inner = self.inner.write();
        Ok(observations
            .into_iter()
            .map(|observation| Self::insert(&mut inner, observation))
            .collect())
    }

    async fn recent_observations(&self, limit: usize, offset: usize) -> StoreResult<Vec<Observation>> {
        let mut observations = self.inner.read().observations.clone();
        observations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(observations.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_observations(&self) -> StoreResult<usize> {
        Ok(self.inner.read().observations.len())
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn record_prediction(&self, prediction: NewPrediction) -> StoreResult<i64> {
        let mut inner = self.inner.write();
        inner.next_prediction_id += 1;
        let id = inner.next_prediction_id;
        inner.predictions.push(Prediction {
            id,
            predicted_value: prediction.predicted_value,
            confidence: prediction.confidence,
            timestamp: prediction.timestamp,
            method: prediction.method,
            actual_value: None,
            correct: None,
        });
        Ok(id)
    }

    async fn predictions_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Prediction>> {
        let mut predictions: Vec<Prediction> = self
            .inner
            .read()
            .predictions
            .iter()
            .filter(|p| p.timestamp >= since)
            .cloned()
            .collect();
        predictions.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Ok(predictions)
    }

    async fn update_prediction(&self, id: i64, actual_value: u32, correct: bool) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let prediction = inner
            .predictions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if prediction.is_resolved() {
            return Err(StoreError::AlreadyResolved(id));
        }

        prediction.actual_value = Some(actual_value);
        prediction.correct = Some(correct);
        Ok(())
    }

    async fn get_prediction(&self, id: i64) -> StoreResult<Option<Prediction>> {
        Ok(self.inner.read().predictions.iter().find(|p| p.id == id).cloned())
    }

    async fn recent_predictions(&self, limit: usize) -> StoreResult<Vec<Prediction>> {
        let mut predictions = self.inner.read().predictions.clone();
        predictions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        predictions.truncate(limit);
        Ok(predictions)
    }

    async fn count_predictions(&self) -> StoreResult<usize> {
        Ok(self.inner.read().predictions.len())
    }
}
