//! Sequence pattern analysis: step sizes, streaks and parity

use serde::{Deserialize, Serialize};

use super::std_dev_f64;

/// Patterns that depend on the order of the sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencePatterns {
    /// Mean of `values[i + 1] - values[i]`
    pub diff_mean: f64,
    /// Population std of the consecutive differences
    pub diff_std: f64,
    /// Longest streak of identical consecutive values
    pub longest_run: usize,
    pub percent_even: f64,
    pub percent_odd: f64,
}

/// Compute all order-dependent patterns for `values`
pub fn analyze_patterns(values: &[u32]) -> SequencePatterns {
    let diffs: Vec<f64> = values
        .windows(2)
        .map(|w| w[1] as f64 - w[0] as f64)
        .collect();

    let diff_mean = if diffs.is_empty() {
        0.0
    } else {
        diffs.iter().sum::<f64>() / diffs.len() as f64
    };

    let (percent_even, percent_odd) = parity_split(values);

    SequencePatterns {
        diff_mean,
        diff_std: std_dev_f64(&diffs),
        longest_run: longest_run(values),
        percent_even,
        percent_odd,
    }
}

/// Length of the longest run of equal adjacent values (0 for an empty slice)
pub fn longest_run(values: &[u32]) -> usize {
    if values.is_empty() {
        return 0;
    }

    let mut best = 1;
    let mut current = 1;
    for w in values.windows(2) {
        if w[1] == w[0] {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

/// Even and odd shares in percent; odd is derived so the pair always sums to 100
fn parity_split(values: &[u32]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let even = values.iter().filter(|&&v| v % 2 == 0).count();
    let percent_even = even as f64 / values.len() as f64 * 100.0;
    (percent_even, 100.0 - percent_even)
}
