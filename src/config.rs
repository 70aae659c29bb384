//! Configuration loading
//!
//! Layering, lowest to highest priority:
//! 1. Built-in defaults
//! 2. TOML config file (optional)
//! 3. `DRAW_PREDICTOR__SECTION__KEY` environment variables (after `.env` is loaded)

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub trainer: TrainerConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path, `~` is expanded
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/draws.db".to_string(),
        }
    }
}

impl DatabaseConfig {
    pub fn expanded_path(&self) -> String {
        shellexpand::tilde(&self.path).into_owned()
    }
}

/// Prediction engine parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// No analysis or prediction runs below this many observations
    pub min_samples: usize,
    /// Sliding window length for feature vectors
    pub window: usize,
    /// Slice length for the frequency estimate
    pub recent_window: usize,
    /// Observations loaded for prediction and training
    pub history_limit: usize,
    /// Observations loaded for descriptive statistics
    pub statistics_limit: usize,
    /// Upper bound on accepted draw values
    pub max_value: Option<u32>,
    /// Serve the frequency estimate when a combined request cannot train a model
    pub fallback_to_statistical: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_samples: 50,
            window: 10,
            recent_window: 50,
            history_limit: 1000,
            statistics_limit: 500,
            max_value: None,
            fallback_to_statistical: true,
        }
    }
}

/// Random forest training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Held-out fraction
    pub test_ratio: f64,
    /// Seed for the split and for every tree
    pub seed: u64,
    pub min_training_rows: usize,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            min_training_rows: 20,
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub default_days: i64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { default_days: 7 }
    }
}

impl Config {
    /// Load configuration from an optional TOML file plus environment overrides
    pub fn load(path: &str) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        let settings = config::Config::builder()
            .add_source(File::new(path, FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("DRAW_PREDICTOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        tracing::debug!(
            min_samples = config.engine.min_samples,
            window = config.engine.window,
            "Configuration loaded from {}",
            path
        );
        Ok(config)
    }
}
