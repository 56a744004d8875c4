//! Cumulative top-K aggregation of relevance masks.
//!
//! A mask row is turned into a per-rank coverage curve, then every curve is
//! averaged across users and read at each configured cutoff.
//!
//! # Formula
//!
//! ```text
//! cumulative[u, k] = Σ mask[u, 0..k] / k       (1-indexed k)
//! score@k          = mean over users of values[u, k - 1]
//! ```

use crate::error::{MetricError, MetricResult};
use crate::evaluation::items::{Matrix, ScoreMatrix};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-cutoff scores keyed `"{metric}@{k}"`.
pub type MetricScores = BTreeMap<String, f64>;

/// How mask rows are accumulated before the per-cutoff mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Running average over the row prefix
    #[default]
    CumulativeMean,
    /// Mask truncated to `max(topk)` columns, no averaging
    PrefixSlice,
}

/// Running mean over each row: cell `(u, k)` is the member share of the
/// first `k + 1` positions.
pub fn cumulative_mean(mask: &ScoreMatrix) -> ScoreMatrix {
    let mut curve = mask.clone();
    for row in curve.iter_rows_mut() {
        let mut running = 0.0;
        for (idx, value) in row.iter_mut().enumerate() {
            running += *value;
            *value = running / (idx + 1) as f64;
        }
    }
    curve
}

/// First `width` columns of `mask`.
pub fn prefix_slice(mask: &ScoreMatrix, width: usize) -> MetricResult<ScoreMatrix> {
    if width > mask.cols() {
        return Err(MetricError::OutOfRange {
            k: width,
            columns: mask.cols(),
        });
    }
    let data = mask
        .iter_rows()
        .flat_map(|row| row[..width].iter().copied())
        .collect();
    Matrix::from_raw(mask.rows(), width, data)
}

/// Rejects cutoffs of 0 or beyond the available rank positions.
pub fn check_cutoffs(topk: &[usize], columns: usize) -> MetricResult<()> {
    match topk.iter().find(|&&k| k == 0 || k > columns) {
        Some(&k) => Err(MetricError::OutOfRange { k, columns }),
        None => Ok(()),
    }
}

/// Rejects a matrix without users.
pub fn check_users(values: &ScoreMatrix) -> MetricResult<()> {
    if values.rows() == 0 {
        return Err(MetricError::InvalidInput(
            "recommendation matrix has no users".to_string(),
        ));
    }
    Ok(())
}

/// Mean of each column across all rows.
pub fn column_means(values: &ScoreMatrix) -> MetricResult<Vec<f64>> {
    check_users(values)?;
    let mut sums = vec![0.0; values.cols()];
    for row in values.iter_rows() {
        for (sum, value) in sums.iter_mut().zip(row) {
            *sum += value;
        }
    }
    let n = values.rows() as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}

/// Rounds to `places` decimal digits, breaking exact ties to even.
///
/// Rounding works on the exact binary value: `0.03125` is a tie and becomes
/// `0.0312`, while `2.675` is stored just below the tie and becomes `2.67`.
pub fn round_to(value: f64, places: u32) -> f64 {
    format!("{:.*}", places as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Reads the user-averaged value at each cutoff, keyed `"{metric}@{k}"`.
///
/// # Preconditions
///
/// `values` must have at least one row ([`MetricError::InvalidInput`]) and
/// every `k` must be in `1..=values.cols()` ([`MetricError::OutOfRange`]).
pub fn topk_result(
    metric: &str,
    values: &ScoreMatrix,
    topk: &[usize],
    decimal_place: u32,
) -> MetricResult<MetricScores> {
    check_users(values)?;
    check_cutoffs(topk, values.cols())?;
    let averages = column_means(values)?;
    Ok(topk
        .iter()
        .map(|&k| {
            (
                format!("{}@{}", metric, k),
                round_to(averages[k - 1], decimal_place),
            )
        })
        .collect())
}

/// Full aggregation of a relevance mask into per-cutoff scores.
///
/// The user count and the cutoffs are validated before any work is done.
///
/// # Example
///
/// ```
/// use recfair_core::evaluation::{aggregate, AggregationMode, Matrix};
///
/// let mask = Matrix::from_rows(vec![vec![0.0, 1.0, 0.0, 1.0, 0.0]]).unwrap();
/// let scores = aggregate("tail", &mask, &[2, 5], AggregationMode::CumulativeMean, 4).unwrap();
/// assert_eq!(scores["tail@2"], 0.5);
/// assert_eq!(scores["tail@5"], 0.4);
/// ```
pub fn aggregate(
    metric: &str,
    mask: &ScoreMatrix,
    topk: &[usize],
    mode: AggregationMode,
    decimal_place: u32,
) -> MetricResult<MetricScores> {
    check_users(mask)?;
    check_cutoffs(topk, mask.cols())?;
    let values = match mode {
        AggregationMode::CumulativeMean => cumulative_mean(mask),
        AggregationMode::PrefixSlice => {
            let width = topk.iter().copied().max().unwrap_or(0);
            prefix_slice(mask, width)?
        }
    };
    topk_result(metric, &values, topk, decimal_place)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: Vec<Vec<f64>>) -> ScoreMatrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_cumulative_mean_is_exact_running_average() {
        // Row [0,1,0,1,0]: 0/1, 1/2, 1/3, 2/4, 2/5
        let curve = cumulative_mean(&mask(vec![vec![0.0, 1.0, 0.0, 1.0, 0.0]]));
        let expected = [0.0, 0.5, 1.0 / 3.0, 0.5, 0.4];
        for (got, want) in curve.as_slice().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cumulative_mean_can_decrease() {
        let curve = cumulative_mean(&mask(vec![vec![1.0, 0.0, 0.0]]));
        assert_eq!(curve.as_slice(), &[1.0, 0.5, 1.0 / 3.0]);
    }

    #[test]
    fn test_cutoff_one_equals_first_rank() {
        let m = mask(vec![
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ]);
        let curve = cumulative_mean(&m);
        for (raw, cum) in m.iter_rows().zip(curve.iter_rows()) {
            assert_eq!(raw[0], cum[0]);
        }
    }

    #[test]
    fn test_topk_result_averages_users() {
        let m = mask(vec![vec![1.0, 0.0], vec![0.0, 0.0], vec![1.0, 1.0]]);
        let scores = aggregate("m", &m, &[1, 2], AggregationMode::CumulativeMean, 4).unwrap();
        // @1: (1 + 0 + 1) / 3; @2: (0.5 + 0 + 1) / 3
        assert_eq!(scores["m@1"], 0.6667);
        assert_eq!(scores["m@2"], 0.5);
    }

    #[test]
    fn test_prefix_slice_reads_raw_rank() {
        let m = mask(vec![vec![0.0, 1.0, 0.0], vec![0.0, 1.0, 1.0]]);
        let scores = aggregate("m", &m, &[2, 3], AggregationMode::PrefixSlice, 4).unwrap();
        assert_eq!(scores["m@2"], 1.0);
        assert_eq!(scores["m@3"], 0.5);

        let sliced = prefix_slice(&m, 2).unwrap();
        assert_eq!(sliced.shape(), (2, 2));
    }

    #[test]
    fn test_cutoff_beyond_columns_is_out_of_range() {
        let m = mask(vec![vec![1.0, 0.0, 1.0]]);
        let err = aggregate("m", &m, &[2, 5], AggregationMode::CumulativeMean, 4).unwrap_err();
        assert_eq!(err, MetricError::OutOfRange { k: 5, columns: 3 });

        assert!(aggregate("m", &m, &[0], AggregationMode::PrefixSlice, 4).is_err());
    }

    #[test]
    fn test_no_users_is_invalid_input() {
        let empty: ScoreMatrix = Matrix::from_raw(0, 3, vec![]).unwrap();
        let err = aggregate("m", &empty, &[1], AggregationMode::CumulativeMean, 4).unwrap_err();
        assert!(matches!(err, MetricError::InvalidInput(_)));
    }

    #[test]
    fn test_no_users_reported_before_cutoffs() {
        // `"rec_items": []` has no columns either
        let empty: ScoreMatrix = Matrix::from_rows(vec![]).unwrap();
        for mode in [AggregationMode::CumulativeMean, AggregationMode::PrefixSlice] {
            let err = aggregate("m", &empty, &[10], mode, 4).unwrap_err();
            assert!(matches!(err, MetricError::InvalidInput(_)), "{:?}", err);
        }
        assert!(matches!(
            topk_result("m", &empty, &[1], 4),
            Err(MetricError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.0 / 3.0, 4), 0.3333);
        assert_eq!(round_to(0.66666, 2), 0.67);
        assert_eq!(round_to(0.4, 4), 0.4);
    }

    #[test]
    fn test_round_to_breaks_exact_ties_to_even() {
        assert_eq!(round_to(0.03125, 4), 0.0312);
        assert_eq!(round_to(0.09375, 4), 0.0938);
        assert_eq!(round_to(0.5, 0), 0.0);
        assert_eq!(round_to(1.5, 0), 2.0);
        // 2.675 is stored as 2.67499999...
        assert_eq!(round_to(2.675, 2), 2.67);
    }

    #[test]
    fn test_tie_on_power_of_two_users() {
        let mut rows = vec![vec![0.0, 0.0]; 32];
        rows[0][0] = 1.0;
        let scores = aggregate("m", &mask(rows), &[1], AggregationMode::CumulativeMean, 4).unwrap();
        assert_eq!(scores["m@1"], 0.0312);
    }
}
