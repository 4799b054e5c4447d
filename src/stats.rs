//! Descriptive statistics over plain numeric slices.
//!
//! All reductions are undefined for empty input and return NaN there;
//! callers only reach them with the non-empty output of the aligner.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Series;

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N)
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `(mean(x), mean(y))` of a paired series
pub fn centroid(x: &[f64], y: &[f64]) -> (f64, f64) {
    (mean(x), mean(y))
}

/// Mean and standard deviation of one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Self {
            mean: mean(values),
            std_dev: std_dev(values),
        }
    }
}

/// How often each whole-number value occurs in a series.
///
/// Values are truncated toward zero before counting.
pub fn frequency_histogram(series: &Series) -> BTreeMap<i64, usize> {
    let mut frequency = BTreeMap::new();
    for (_, value) in series.iter() {
        *frequency.entry(value as i64).or_insert(0) += 1;
    }
    frequency
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        assert_eq!(variance(&values), 4.0);
        assert_eq!(std_dev(&values), 2.0);
    }

    #[test]
    fn constant_series_has_zero_spread() {
        let summary = Summary::of(&[3.5, 3.5, 3.5]);
        assert_eq!(summary.mean, 3.5);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn empty_input_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn centroid_of_pairs() {
        assert_eq!(centroid(&[1.0, 3.0], &[10.0, 20.0]), (2.0, 15.0));
    }

    #[test]
    fn histogram_truncates_values() {
        let series: Series = [(0, 12.9), (1, 12.1), (2, 40.0), (3, 0.5)].into_iter().collect();
        let histogram = frequency_histogram(&series);
        assert_eq!(histogram.get(&12), Some(&2));
        assert_eq!(histogram.get(&40), Some(&1));
        assert_eq!(histogram.get(&0), Some(&1));
        assert_eq!(histogram.len(), 3);
    }
}
