//! Elevation statistics for the regression harness: run-to-run stability
//! of these numbers is the cheap proxy for trajectory stability.

use serde::{Deserialize, Serialize};

/// Summary statistics of a heightmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    pub p25: f32,
    pub median: f32,
    pub p75: f32,
}

impl ElevationStats {
    /// Compute over a non-empty, NaN-free elevation buffer (the engine
    /// never produces NaN).
    pub fn compute(values: &[f32]) -> Self {
        assert!(!values.is_empty(), "no elevation data to summarize");

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("NaN in elevation data"));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f32>() / n as f32;
        let variance = sorted.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / n as f32;

        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean,
            std_dev: variance.sqrt(),
            p25: percentile(&sorted, 0.25),
            median: percentile(&sorted, 0.50),
            p75: percentile(&sorted, 0.75),
        }
    }
}

/// Nearest-rank percentile over pre-sorted data.
fn percentile(sorted: &[f32], q: f32) -> f32 {
    let rank = ((sorted.len() as f32 * q).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stats_of_a_known_sequence() {
        let values: Vec<f32> = (1..=100).map(|v| v as f32).collect();
        let stats = ElevationStats::compute(&values);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_relative_eq!(stats.mean, 50.5);
        assert_eq!(stats.p25, 25.0);
        assert_eq!(stats.median, 50.0);
        assert_eq!(stats.p75, 75.0);
    }

    #[test]
    fn constant_data_has_zero_spread() {
        let stats = ElevationStats::compute(&[2.5; 64]);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.min, stats.max);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn order_does_not_matter() {
        let a = ElevationStats::compute(&[3.0, 1.0, 2.0]);
        let b = ElevationStats::compute(&[1.0, 2.0, 3.0]);
        assert_eq!(a.median, b.median);
        assert_eq!(a.min, b.min);
        assert_eq!(a.max, b.max);
    }
}
