//! Sliding-window feature construction
//!
//! Each feature vector is the `W` raw values preceding a target, followed by
//! five window summaries:
//! - mean
//! - population standard deviation
//! - max
//! - min
//! - number of even values

use crate::analysis::std_dev_f64;

/// Default sliding window length
pub const DEFAULT_WINDOW: usize = 10;
/// Number of summary features appended after the raw window
pub const DERIVED_FEATURES: usize = 5;

/// Feature matrix with aligned targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<u32>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Turns an ascending draw sequence into window features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureBuilder {
    window: usize,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl FeatureBuilder {
    /// A zero window is bumped to one
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Length of every vector this builder produces
    pub fn feature_len(&self) -> usize {
        self.window + DERIVED_FEATURES
    }

    /// One (features, target) pair per index `i` in `W..len`; empty when `len <= W`
    pub fn build(&self, values: &[u32]) -> TrainingSet {
        if values.len() <= self.window {
            return TrainingSet::default();
        }

        let rows = values.len() - self.window;
        let mut set = TrainingSet {
            features: Vec::with_capacity(rows),
            targets: Vec::with_capacity(rows),
        };

        for i in self.window..values.len() {
            set.features.push(self.vector(&values[i - self.window..i]));
            set.targets.push(values[i]);
        }

        set
    }

    /// Feature vector for the most recent window, `None` if history is shorter than `W`
    pub fn latest(&self, values: &[u32]) -> Option<Vec<f64>> {
        if values.len() < self.window {
            return None;
        }
        Some(self.vector(&values[values.len() - self.window..]))
    }

    /// Raw window followed by the derived summaries
    pub fn vector(&self, window: &[u32]) -> Vec<f64> {
        let raw: Vec<f64> = window.iter().map(|&v| v as f64).collect();
        let mean = if raw.is_empty() {
            0.0
        } else {
            raw.iter().sum::<f64>() / raw.len() as f64
        };
        let max = window.iter().copied().max().unwrap_or_default() as f64;
        let min = window.iter().copied().min().unwrap_or_default() as f64;
        let evens = window.iter().filter(|&&v| v % 2 == 0).count() as f64;
        let std = std_dev_f64(&raw);

        let mut features = raw;
        features.extend_from_slice(&[mean, std, max, min, evens]);
        features
    }

    /// Column names, for logging and inspection
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = (1..=self.window)
            .map(|lag| format!("lag_{}", self.window + 1 - lag))
            .collect();
        names.extend(
            ["window_mean", "window_std", "window_max", "window_min", "window_evens"]
                .iter()
                .map(|s| s.to_string()),
        );
        names
    }
}
