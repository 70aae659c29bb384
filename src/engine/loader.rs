//! History loading from the observation store

use std::sync::Arc;

use crate::error::Result;
use crate::storage::ObservationStore;
use crate::types::History;

/// Reads the most recent draws as an ascending snapshot
#[derive(Clone)]
pub struct HistoryLoader {
    store: Arc<dyn ObservationStore>,
}

impl HistoryLoader {
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self { store }
    }

    /// At most `limit` most recent draws, oldest first
    pub async fn load(&self, limit: usize) -> Result<History> {
        let mut observations = self.store.recent_observations(limit, 0).await?;
        observations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        tracing::debug!(requested = limit, loaded = observations.len(), "History loaded");

        Ok(History {
            values: observations.iter().map(|o| o.value).collect(),
            timestamps: observations.iter().map(|o| o.timestamp).collect(),
        })
    }
}
