//! Long-tail popularity metrics for ranked recommendation lists.
//!
//! This module classifies items into popularity tail and head, measures how
//! much of each user's top-K list falls into one of them, and provides the
//! dispersion statistics used to compare metrics across user or item groups.
//!
//! # Pipeline
//!
//! | Stage | Input | Output | Module |
//! |-------|-------|--------|--------|
//! | Classify | popularity table, ratio | item set | [`popularity`] |
//! | Mask | recommendation matrix, item set | 0/1 matrix | [`mask`] |
//! | Aggregate | 0/1 matrix, cutoffs | `{name@k: score}` | [`topk`] |
//!
//! [`metrics`] wires the stages into the registered metrics
//! `cumulativetailpercentage` and `cumulativeheadpercentage`.
//!
//! # Example
//!
//! ```
//! use recfair_core::config::MetricConfig;
//! use recfair_core::evaluation::{build_metrics, EvalData, RankingMetric};
//!
//! let data: EvalData = serde_json::from_str(r#"{
//!     "rec_items": [[1, 4, 2, 3, 1]],
//!     "count_items": {"1": 10, "2": 5, "3": 3, "4": 2}
//! }"#).unwrap();
//!
//! let config = MetricConfig { topk: vec![5], ..Default::default() };
//! for mut metric in build_metrics(&config).unwrap() {
//!     let scores = metric.calculate(&data).unwrap();
//!     println!("{:?}", scores);
//! }
//! ```
//!
//! # Metrics Reference
//!
//! | Metric | Description |
//! |--------|-------------|
//! | cumulativetailpercentage@k | Mean share of tail items among the first k ranks |
//! | cumulativeheadpercentage@k | Mean share of head items among the first k ranks |

pub mod items;
pub mod mask;
pub mod metrics;
pub mod popularity;
pub mod stats;
pub mod topk;

// Re-export commonly used types and functions
pub use items::{ItemId, Matrix, PopularityTable, RecommendationMatrix, ScoreMatrix};
pub use mask::build_mask;
pub use metrics::{
    build_metrics, used_info, CumulativePercentage, DataSource, DataValue, EvalData, MetricKind,
    MetricType, RankingMetric,
};
pub use popularity::{
    classify_tail, head_items, tail_items, ClassificationCache, Classifier, ItemSet, TailPolicy,
};
pub use stats::DispersionStats;
pub use topk::{aggregate, cumulative_mean, prefix_slice, topk_result, AggregationMode, MetricScores};
