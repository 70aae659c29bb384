//! Descriptive statistics over draw sequences
//!
//! Everything here is a pure function of the input slice:
//! - Central tendency and spread (mean, median, mode, std, range)
//! - Frequency ranking with a deterministic tie-break
//! - Sequence patterns (see [`pattern`])
//!
//! Ties in frequency ranking are broken by earliest chronological occurrence:
//! among values with the same count, the one whose first appearance comes
//! first in the sequence ranks higher.

pub mod pattern;


pub use pattern::{analyze_patterns, longest_run, SequencePatterns};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PredictorError, Result};

/// Number of entries kept in the frequency table
pub const TOP_FREQUENCIES: usize = 10;
/// Number of trailing values echoed back in the statistics
pub const RECENT_VALUES: usize = 10;

/// A value and how many times it occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: u32,
    pub count: usize,
}

/// Descriptive statistics for a draw sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: u32,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: u32,
    pub max: u32,
    pub range: u32,
    /// Most frequent values, highest count first
    pub top_frequencies: Vec<FrequencyEntry>,
    /// Last values of the sequence, oldest first
    pub recent_values: Vec<u32>,
    #[serde(flatten)]
    pub patterns: SequencePatterns,
}

/// Gatekeeper for the minimum sample threshold plus the statistics themselves
#[derive(Debug, Clone, Copy)]
pub struct StatisticalAnalyzer {
    min_samples: usize,
}

impl StatisticalAnalyzer {
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Fail with `InsufficientData` unless at least `min_samples` values are present
    pub fn ensure_enough(&self, available: usize) -> Result<()> {
        // An empty sequence never has statistics, whatever the threshold
        let required = self.min_samples.max(1);
        if available < required {
            return Err(PredictorError::InsufficientData { available, required });
        }
        Ok(())
    }

    /// Compute the full statistics block for `values` (chronological order)
    pub fn analyze(&self, values: &[u32]) -> Result<Statistics> {
        self.ensure_enough(values.len())?;

        let ranked = frequency_table(values);
        // ensure_enough guarantees a non-empty slice
        let mode = ranked[0].value;
        let min = values.iter().copied().min().unwrap_or_default();
        let max = values.iter().copied().max().unwrap_or_default();

        Ok(Statistics {
            count: values.len(),
            mean: mean(values),
            median: median(values),
            mode,
            std_dev: std_dev(values),
            min,
            max,
            range: max - min,
            top_frequencies: ranked.into_iter().take(TOP_FREQUENCIES).collect(),
            recent_values: values[values.len().saturating_sub(RECENT_VALUES)..].to_vec(),
            patterns: analyze_patterns(values),
        })
    }
}

/// All distinct values ranked by count, descending; ties go to the earliest first occurrence
pub fn frequency_table(values: &[u32]) -> Vec<FrequencyEntry> {
    // value -> (count, index of first occurrence)
    let mut seen: HashMap<u32, (usize, usize)> = HashMap::new();
    for (i, &value) in values.iter().enumerate() {
        seen.entry(value).or_insert((0, i)).0 += 1;
    }

    let mut ranked: Vec<(u32, usize, usize)> = seen
        .into_iter()
        .map(|(value, (count, first))| (value, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(value, count, _)| FrequencyEntry { value, count })
        .collect()
}

/// Most frequent value with its count, `None` for an empty slice
pub fn mode(values: &[u32]) -> Option<FrequencyEntry> {
    frequency_table(values).into_iter().next()
}

pub fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Middle value, or the average of the two middle values for even lengths
pub fn median(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

/// Population standard deviation
pub fn std_dev(values: &[u32]) -> f64 {
    let floats: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    std_dev_f64(&floats)
}

pub(crate) fn std_dev_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}
