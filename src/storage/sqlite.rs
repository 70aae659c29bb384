//! SQLite-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

use super::{check_bound, ObservationStore, PredictionStore};
use crate::error::{StoreError, StoreResult};
use crate::types::{Method, NewObservation, NewPrediction, Observation, Prediction};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS observations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        value INTEGER NOT NULL CHECK (value >= 0),
        timestamp TEXT NOT NULL,
        source TEXT NOT NULL,
        draw_name TEXT,
        draw_time TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_observations_timestamp ON observations (timestamp)",
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        predicted_value INTEGER NOT NULL,
        confidence REAL NOT NULL,
        timestamp TEXT NOT NULL,
        method TEXT NOT NULL,
        actual_value INTEGER,
        correct BOOLEAN
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_predictions_timestamp ON predictions (timestamp)",
];

#[derive(Debug, sqlx::FromRow)]
struct ObservationRow {
    id: i64,
    value: u32,
    timestamp: DateTime<Utc>,
    source: String,
    draw_name: Option<String>,
    draw_time: Option<String>,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Self {
            id: row.id,
            value: row.value,
            timestamp: row.timestamp,
            source: row.source,
            draw_name: row.draw_name,
            draw_time: row.draw_time,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PredictionRow {
    id: i64,
    predicted_value: u32,
    confidence: f64,
    timestamp: DateTime<Utc>,
    method: String,
    actual_value: Option<u32>,
    correct: Option<bool>,
}

impl TryFrom<PredictionRow> for Prediction {
    type Error = StoreError;

    fn try_from(row: PredictionRow) -> Result<Self, Self::Error> {
        let method = Method::from_str(&row.method).map_err(StoreError::InvalidRecord)?;
        Ok(Self {
            id: row.id,
            predicted_value: row.predicted_value,
            confidence: row.confidence,
            timestamp: row.timestamp,
            method,
            actual_value: row.actual_value,
            correct: row.correct,
        })
    }
}

/// Bind value for LIMIT/OFFSET; SQLite reads a negative value as no limit
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// SQLite database implementing both store traits
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    max_value: Option<u32>,
}

impl Database {
    /// Open (creating if needed) the database file and its tables
    pub async fn connect(path: &str) -> StoreResult<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool, max_value: None };
        db.init_schema().await?;
        tracing::info!("Connected to database at {}", path);
        Ok(db)
    }

    /// Private in-memory database on a single pooled connection
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool, max_value: None };
        db.init_schema().await?;
        Ok(db)
    }

    /// Reject observations above `max_value`
    pub fn with_max_value(mut self, max_value: Option<u32>) -> Self {
        self.max_value = max_value;
        self
    }

    async fn init_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl ObservationStore for Database {
    async fn append_observation(&self, observation: NewObservation) -> StoreResult<i64> {
        check_bound(observation.value, self.max_value)?;

        let result = sqlx::query(
            r#"
            INSERT INTO observations (value, timestamp, source, draw_name, draw_time)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(observation.value)
        .bind(observation.timestamp)
        .bind(&observation.source)
        .bind(&observation.draw_name)
        .bind(&observation.draw_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn append_observations(&self, observations: Vec<NewObservation>) -> StoreResult<Vec<i64>> {
        for observation in &observations {
            check_bound(observation.value, self.max_value)?;
        }

        // Dropping the transaction without commit rolls it back
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(observations.len());

        for observation in &observations {
            let result = sqlx::query(
                r#"
                INSERT INTO observations (value, timestamp, source, draw_name, draw_time)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(observation.value)
            .bind(observation.timestamp)
            .bind(&observation.source)
            .bind(&observation.draw_name)
            .bind(&observation.draw_time)
            .execute(&mut *tx)
            .await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        tracing::debug!("Stored batch of {} observations", ids.len());
        Ok(ids)
    }

    async fn recent_observations(&self, limit: usize, offset: usize) -> StoreResult<Vec<Observation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT id, value, timestamp, source, draw_name, draw_time
            FROM observations
            ORDER BY timestamp DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(sql_count(limit))
        .bind(sql_count(offset))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Observation::from).collect())
    }

    async fn count_observations(&self) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}

#[async_trait]
impl PredictionStore for Database {
    async fn record_prediction(&self, prediction: NewPrediction) -> StoreResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO predictions (predicted_value, confidence, timestamp, method)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(prediction.predicted_value)
        .bind(prediction.confidence)
        .bind(prediction.timestamp)
        .bind(prediction.method.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn predictions_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Prediction>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, predicted_value, confidence, timestamp, method, actual_value, correct
            FROM predictions
            WHERE timestamp >= ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Prediction::try_from).collect()
    }

    async fn update_prediction(&self, id: i64, actual_value: u32, correct: bool) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE predictions
            SET actual_value = ?, correct = ?
            WHERE id = ? AND correct IS NULL
            "#,
        )
        .bind(actual_value)
        .bind(correct)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_prediction(id).await? {
                Some(_) => Err(StoreError::AlreadyResolved(id)),
                None => Err(StoreError::NotFound(id)),
            };
        }

        Ok(())
    }

    async fn get_prediction(&self, id: i64) -> StoreResult<Option<Prediction>> {
        let row = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, predicted_value, confidence, timestamp, method, actual_value, correct
            FROM predictions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Prediction::try_from).transpose()
    }

    async fn recent_predictions(&self, limit: usize) -> StoreResult<Vec<Prediction>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id, predicted_value, confidence, timestamp, method, actual_value, correct
            FROM predictions
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Prediction::try_from).collect()
    }

    async fn count_predictions(&self) -> StoreResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM predictions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
