//! Dispersion statistics for comparing a metric across groups.
//!
//! This module provides the summary measures used in group fairness
//! reports:
//! - Arithmetic mean
//! - Population standard deviation (divides by N)
//! - Absolute disparity (max - min)
//! - Coefficient of variation (std / mean, floored at 0.0 for a zero mean)

use serde::Serialize;

/// Summary of one metric's values across the groups of one group type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DispersionStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Largest value minus smallest value
    pub disparity: f64,
    /// Standard deviation relative to the mean
    pub coeff_var: f64,
}

impl DispersionStats {
    /// Computes all measures, or `None` for an empty sample.
    ///
    /// # Example
    ///
    /// ```
    /// use recfair_core::evaluation::DispersionStats;
    ///
    /// let stats = DispersionStats::compute(&[0.30, 0.34, 0.28]).unwrap();
    /// assert!((stats.disparity - 0.06).abs() < 1e-9);
    /// ```
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = mean(values);
        let std = population_std(values, mean);
        Some(Self {
            mean,
            std,
            disparity: disparity(values),
            coeff_var: coefficient_of_variation(mean, std),
        })
    }
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a precomputed `mean`.
pub fn population_std(values: &[f64], mean: f64) -> f64 {
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Maximum minus minimum; 0.0 for an empty slice.
pub fn disparity(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() {
        0.0
    } else {
        max - min
    }
}

/// `std / mean`, or 0.0 when the mean is exactly zero.
pub fn coefficient_of_variation(mean: f64, std: f64) -> f64 {
    if mean == 0.0 {
        0.0
    } else {
        std / mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_scenario() {
        // ndcg@10 for three gender groups
        let stats = DispersionStats::compute(&[0.30, 0.34, 0.28]).unwrap();
        assert!((stats.mean - 0.3067).abs() < 1e-4);
        assert!((stats.std - 0.0249).abs() < 1e-4);
        assert!((stats.disparity - 0.06).abs() < 1e-9);
        // 0.024944 / 0.306667
        assert!((stats.coeff_var - 0.0813).abs() < 1e-4);
    }

    #[test]
    fn test_population_not_sample_std() {
        // Population std of [1, 3] is 1.0; sample std would be ~1.414
        let stats = DispersionStats::compute(&[1.0, 3.0]).unwrap();
        assert!((stats.std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_values_have_zero_cv() {
        let stats = DispersionStats::compute(&[0.0, 0.0, 0.0]).unwrap();
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.coeff_var, 0.0);
        assert_eq!(stats.disparity, 0.0);
    }

    #[test]
    fn test_zero_mean_with_spread_floors_cv() {
        assert_eq!(coefficient_of_variation(0.0, 2.5), 0.0);
        let stats = DispersionStats::compute(&[-1.0, 1.0]).unwrap();
        assert_eq!(stats.coeff_var, 0.0);
        assert_eq!(stats.disparity, 2.0);
    }

    #[test]
    fn test_single_value() {
        let stats = DispersionStats::compute(&[0.42]).unwrap();
        assert_eq!(stats.mean, 0.42);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.disparity, 0.0);
    }

    #[test]
    fn test_empty_sample() {
        assert!(DispersionStats::compute(&[]).is_none());
        assert_eq!(disparity(&[]), 0.0);
    }
}
