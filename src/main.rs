//! Draw Predictor
//!
//! Command-line front end over the prediction engine and its SQLite store.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use draw_predictor::{
    config::Config,
    engine::PredictionEngine,
    storage::{resolve_prediction, Database, ObservationStore, PredictionStore},
    types::{Method, NewObservation, MANUAL_SOURCE},
};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "draw-predictor")]
#[command(about = "Statistical and ML prediction of bounded integer draws")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Descriptive statistics over recent draws
    Stats,
    /// Predict the next draw
    Predict {
        /// statistical, ml or combined
        #[arg(short, long, default_value = "combined")]
        method: Method,
        /// Do not record the prediction
        #[arg(long)]
        no_save: bool,
    },
    /// Train the classifier and report its held-out accuracy
    Retrain,
    /// Hit rate over the last N days
    Evaluate {
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Record a single draw
    Add {
        value: u32,
        #[arg(long, default_value = MANUAL_SOURCE)]
        source: String,
        #[arg(long)]
        draw_name: Option<String>,
        #[arg(long)]
        draw_time: Option<String>,
    },
    /// Import draws from a file of integers, all or nothing
    Import {
        file: String,
        #[arg(long, default_value = "import")]
        source: String,
    },
    /// List recent draws, newest first
    Recent {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// List recent predictions, newest first
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Record the actual draw for a prediction
    Resolve { id: i64, actual: u32 },
    /// Insert random demo draws
    Seed {
        #[arg(long, default_value = "60")]
        count: usize,
        #[arg(long, default_value = "1")]
        min: u32,
        #[arg(long, default_value = "100")]
        max: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    let db = Database::connect(&config.database.expanded_path())
        .await
        .context("Failed to open database")?
        .with_max_value(config.engine.max_value);
    let store = Arc::new(db.clone());

    let result = match cli.command {
        Commands::Stats => show_stats(store, &config).await,
        Commands::Predict { method, no_save } => predict(store, &config, method, !no_save).await,
        Commands::Retrain => retrain(store, &config).await,
        Commands::Evaluate { days } => {
            evaluate(store, &config, days.unwrap_or(config.evaluation.default_days)).await
        }
        Commands::Add {
            value,
            source,
            draw_name,
            draw_time,
        } => {
            let observation =
                NewObservation::new(value, source, Utc::now()).with_draw(draw_name, draw_time);
            add(store, observation).await
        }
        Commands::Import { file, source } => import(store, &file, &source).await,
        Commands::Recent { limit, page } => recent(store, limit, page).await,
        Commands::History { limit } => print_json(&store.recent_predictions(limit).await?),
        Commands::Resolve { id, actual } => {
            print_json(&resolve_prediction(&*store, id, actual).await?)
        }
        Commands::Seed { count, min, max } => seed(store, count, min, max).await,
    };

    db.close().await;
    result
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn engine(store: Arc<Database>, config: &Config) -> PredictionEngine {
    PredictionEngine::new(store.clone(), store, config)
}

async fn show_stats(store: Arc<Database>, config: &Config) -> anyhow::Result<()> {
    let stats = engine(store, config).statistics().await?;
    print_json(&stats)
}

async fn predict(
    store: Arc<Database>,
    config: &Config,
    method: Method,
    save: bool,
) -> anyhow::Result<()> {
    let generated = engine(store, config).generate_prediction(method, save).await;
    print_json(&generated)
}

async fn retrain(store: Arc<Database>, config: &Config) -> anyhow::Result<()> {
    let summary = engine(store, config).train().await?;
    print_json(&summary)
}

async fn evaluate(store: Arc<Database>, config: &Config, days: i64) -> anyhow::Result<()> {
    let evaluation = engine(store, config).evaluate(days).await?;
    print_json(&evaluation)
}

async fn add(store: Arc<Database>, observation: NewObservation) -> anyhow::Result<()> {
    let value = observation.value;
    let id = store.append_observation(observation).await?;
    tracing::info!(id, value, "Draw recorded");
    print_json(&serde_json::json!({ "id": id, "value": value }))
}

async fn import(store: Arc<Database>, file: &str, source: &str) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(shellexpand::tilde(file).into_owned())
        .await
        .with_context(|| format!("Failed to read {}", file))?;

    let values = parse_values(&content)?;
    let now = Utc::now();
    let batch = values
        .iter()
        .map(|&value| NewObservation::new(value, source, now))
        .collect();

    let ids = store.append_observations(batch).await?;
    tracing::info!(count = ids.len(), file, "Draws imported");
    print_json(&serde_json::json!({ "imported": ids.len() }))
}

/// Integers separated by whitespace or commas
fn parse_values(content: &str) -> anyhow::Result<Vec<u32>> {
    content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .with_context(|| format!("Invalid draw value '{}'", token))
        })
        .collect()
}

/// Rows to skip for a 1-based `page`; page 0 is treated as page 1
fn page_offset(page: usize, limit: usize) -> usize {
    page.saturating_sub(1).saturating_mul(limit)
}

async fn recent(store: Arc<Database>, limit: usize, page: usize) -> anyhow::Result<()> {
    let offset = page_offset(page, limit);
    let observations = store.recent_observations(limit, offset).await?;
    let total = store.count_observations().await?;
    print_json(&serde_json::json!({
        "page": page.max(1),
        "limit": limit,
        "total": total,
        "observations": observations,
    }))
}

async fn seed(store: Arc<Database>, count: usize, min: u32, max: u32) -> anyhow::Result<()> {
    anyhow::ensure!(min <= max, "--min must not exceed --max");

    let batch: Vec<NewObservation> = {
        let mut rng = rand::rng();
        let start = Utc::now();
        (0..count)
            .map(|i| {
                let timestamp = start + chrono::Duration::milliseconds(i as i64);
                NewObservation::new(rng.random_range(min..=max), "seed", timestamp)
            })
            .collect()
    };

    let ids = store.append_observations(batch).await?;
    tracing::info!(count = ids.len(), min, max, "Demo draws seeded");
    print_json(&serde_json::json!({ "seeded": ids.len() }))
}
