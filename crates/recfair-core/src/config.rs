//! Metric configuration and default constants.
//!
//! The constants mirror the defaults of the evaluation pipeline this crate
//! plugs into. [`MetricConfig`] is the deserializable configuration a host
//! hands to every metric constructor.
//!
//! # Usage
//!
//! ```
//! use recfair_core::config::{MetricConfig, DEFAULT_TAIL_RATIO};
//!
//! let config = MetricConfig::default();
//! assert_eq!(config.effective_tail_ratio(), DEFAULT_TAIL_RATIO);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{MetricError, MetricResult};
use crate::evaluation::popularity::TailPolicy;
use crate::evaluation::topk::AggregationMode;
use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

/// Share of total interaction mass assigned to the tail when unset.
pub const DEFAULT_TAIL_RATIO: f64 = 0.2;

/// Cutoffs evaluated when the configuration does not list any.
pub const DEFAULT_TOPK: &[usize] = &[10];

/// Decimal places kept in reported scores.
pub const DEFAULT_DECIMAL_PLACE: u32 = 4;

/// Largest rounding precision accepted; f64 carries ~15 significant digits.
pub const MAX_DECIMAL_PLACE: u32 = 15;

/// Data keys every popularity metric reads from the host container.
pub const REC_ITEMS_KEY: &str = "rec.items";

/// Data key of the item interaction-count table.
pub const COUNT_ITEMS_KEY: &str = "data.count_items";

// =============================================================================
// MetricConfig
// =============================================================================

/// Configuration shared by the popularity metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Cutoffs to report, 1-indexed
    pub topk: Vec<usize>,
    /// Share of interaction mass defining the tail (default 0.2)
    pub tail_ratio: Option<f64>,
    /// Share of interaction mass defining the head. The head metric falls
    /// back to `tail_ratio`, the complement-of-head tail policy to
    /// `1 - tail_ratio`.
    pub head_ratio: Option<f64>,
    /// Decimal places kept in reported scores
    pub metric_decimal_place: u32,
    /// How the tail set is derived from the popularity table
    pub tail_policy: TailPolicy,
    /// How per-user coverage is accumulated across ranks
    pub aggregation: AggregationMode,
    /// Registry names of the metrics to run
    pub metrics: Vec<String>,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            topk: DEFAULT_TOPK.to_vec(),
            tail_ratio: None,
            head_ratio: None,
            metric_decimal_place: DEFAULT_DECIMAL_PLACE,
            tail_policy: TailPolicy::default(),
            aggregation: AggregationMode::default(),
            metrics: vec![
                "cumulativetailpercentage".to_string(),
                "cumulativeheadpercentage".to_string(),
            ],
        }
    }
}

impl MetricConfig {
    /// Tail ratio in effect, falling back to [`DEFAULT_TAIL_RATIO`].
    pub fn effective_tail_ratio(&self) -> f64 {
        self.tail_ratio.unwrap_or(DEFAULT_TAIL_RATIO)
    }

    /// Checks ratios, cutoffs and rounding precision.
    ///
    /// Metric constructors call this so configuration mistakes surface
    /// before any data is touched.
    pub fn validate(&self) -> MetricResult<()> {
        validate_ratio("tail_ratio", self.effective_tail_ratio())?;
        if let Some(head_ratio) = self.head_ratio {
            validate_ratio("head_ratio", head_ratio)?;
        }
        if self.topk.is_empty() {
            return Err(MetricError::InvalidConfiguration(
                "topk must list at least one cutoff".to_string(),
            ));
        }
        if self.topk.contains(&0) {
            return Err(MetricError::InvalidConfiguration(
                "topk cutoffs are 1-indexed; 0 is not a valid cutoff".to_string(),
            ));
        }
        if self.metric_decimal_place > MAX_DECIMAL_PLACE {
            return Err(MetricError::InvalidConfiguration(format!(
                "metric_decimal_place {} exceeds maximum of {}",
                self.metric_decimal_place, MAX_DECIMAL_PLACE
            )));
        }
        Ok(())
    }
}

/// Accepts ratios in the half-open interval (0, 1].
pub fn validate_ratio(name: &str, ratio: f64) -> MetricResult<()> {
    if ratio > 0.0 && ratio <= 1.0 {
        Ok(())
    } else {
        Err(MetricError::InvalidConfiguration(format!(
            "{} must be in (0, 1], got {}",
            name, ratio
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MetricConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.topk, vec![10]);
        assert_eq!(config.metric_decimal_place, 4);
        assert_eq!(config.tail_policy, TailPolicy::BottomUp);
    }

    #[test]
    fn test_explicit_head_ratio_is_validated() {
        let config = MetricConfig {
            head_ratio: Some(1.2),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MetricError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_ratio_bounds() {
        assert!(validate_ratio("r", 1.0).is_ok());
        assert!(validate_ratio("r", 0.0001).is_ok());
        assert!(validate_ratio("r", 0.0).is_err());
        assert!(validate_ratio("r", 1.5).is_err());
        assert!(validate_ratio("r", f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_topk() {
        let empty = MetricConfig {
            topk: vec![],
            ..Default::default()
        };
        assert!(matches!(
            empty.validate(),
            Err(MetricError::InvalidConfiguration(_))
        ));

        let zero = MetricConfig {
            topk: vec![0, 5],
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let json = r#"{"topk": [5, 10, 20], "tail_ratio": 0.25, "tail_policy": "complement_of_head"}"#;
        let config: MetricConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.topk, vec![5, 10, 20]);
        assert_eq!(config.effective_tail_ratio(), 0.25);
        assert_eq!(config.tail_policy, TailPolicy::ComplementOfHead);
        assert_eq!(config.aggregation, AggregationMode::CumulativeMean);
        assert_eq!(config.head_ratio, None);
    }
}
