//! Popularity coverage metrics for ranked recommendation lists.
//!
//! This module implements the two registered long-tail metrics:
//! - `cumulativetailpercentage`: share of tail items in the top-K list
//! - `cumulativeheadpercentage`: share of head items in the top-K list
//!
//! Both run the same pipeline: classify items from the popularity table,
//! mark classified items in the recommendation matrix, accumulate the marks
//! per user, and average across users at each cutoff.

use crate::config::{MetricConfig, COUNT_ITEMS_KEY, REC_ITEMS_KEY};
use crate::error::{MetricError, MetricResult};
use crate::evaluation::items::{PopularityTable, RecommendationMatrix};
use crate::evaluation::mask::build_mask;
use crate::evaluation::popularity::{ClassificationCache, Classifier, ItemSet, TailPolicy};
use crate::evaluation::topk::{aggregate, AggregationMode, MetricScores};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Data container contract
// ============================================================================

/// A value a metric can request from the host's data container.
#[derive(Debug, Clone, Copy)]
pub enum DataValue<'a> {
    /// Ranked recommendation matrix (`rec.items`)
    RecItems(&'a RecommendationMatrix),
    /// Item interaction counts (`data.count_items`)
    ItemCounts(&'a PopularityTable),
}

/// Keyed access to evaluation data collected by the host pipeline.
pub trait DataSource {
    /// Looks up a data key such as `"rec.items"`.
    fn get(&self, key: &str) -> Option<DataValue<'_>>;
}

/// In-memory data container holding everything the popularity metrics need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalData {
    /// Ranked recommendations, one row per user
    pub rec_items: RecommendationMatrix,
    /// Interaction count per item
    pub count_items: PopularityTable,
}

impl EvalData {
    /// Bundles a recommendation matrix with its popularity table.
    pub fn new(rec_items: RecommendationMatrix, count_items: PopularityTable) -> Self {
        Self {
            rec_items,
            count_items,
        }
    }
}

impl DataSource for EvalData {
    fn get(&self, key: &str) -> Option<DataValue<'_>> {
        match key {
            REC_ITEMS_KEY => Some(DataValue::RecItems(&self.rec_items)),
            COUNT_ITEMS_KEY => Some(DataValue::ItemCounts(&self.count_items)),
            _ => None,
        }
    }
}

/// Extracts the recommendation matrix and popularity table from `data`.
pub fn used_info(data: &dyn DataSource) -> MetricResult<(&RecommendationMatrix, &PopularityTable)> {
    let rec_items = match data.get(REC_ITEMS_KEY) {
        Some(DataValue::RecItems(items)) => items,
        _ => return Err(missing(REC_ITEMS_KEY)),
    };
    let count_items = match data.get(COUNT_ITEMS_KEY) {
        Some(DataValue::ItemCounts(counts)) => counts,
        _ => return Err(missing(COUNT_ITEMS_KEY)),
    };
    Ok((rec_items, count_items))
}

fn missing(key: &str) -> MetricError {
    MetricError::InvalidInput(format!("data container has no `{}` entry", key))
}

// ============================================================================
// Metric trait and catalogue
// ============================================================================

/// Evaluation family a metric belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Computed from top-K ranked lists
    Ranking,
}

/// A named metric computed from a host data container.
///
/// `calculate` takes `&mut self` because implementations may memoize
/// intermediate results; one instance serves one evaluation at a time.
pub trait RankingMetric: Send {
    /// Lowercase registry name, used as the result key prefix.
    fn name(&self) -> &'static str;

    /// Computes `{"{name}@{k}": score}` for every configured cutoff.
    fn calculate(&mut self, data: &dyn DataSource) -> MetricResult<MetricScores>;
}

/// The popularity metrics this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricKind {
    /// Share of tail items in the top-K list
    CumulativeTailPercentage,
    /// Share of head items in the top-K list
    CumulativeHeadPercentage,
}

impl MetricKind {
    /// Every built-in metric.
    pub const ALL: [MetricKind; 2] = [
        MetricKind::CumulativeTailPercentage,
        MetricKind::CumulativeHeadPercentage,
    ];

    /// Registry name.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::CumulativeTailPercentage => "cumulativetailpercentage",
            MetricKind::CumulativeHeadPercentage => "cumulativeheadpercentage",
        }
    }

    /// Resolves a registry name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Data keys the metric reads.
    pub fn metric_need(&self) -> &'static [&'static str] {
        &[REC_ITEMS_KEY, COUNT_ITEMS_KEY]
    }

    /// Evaluation family.
    pub fn metric_type(&self) -> MetricType {
        MetricType::Ranking
    }

    /// Whether lower scores are better. Neither coverage metric is.
    pub fn smaller_is_better(&self) -> bool {
        false
    }

    /// Builds a metric instance, validating `config`.
    pub fn build(&self, config: &MetricConfig) -> MetricResult<CumulativePercentage> {
        let metric = CumulativePercentage::new(*self, config)?;
        info!("[Registered] {} metric.", self.name());
        Ok(metric)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds every metric listed in `config.metrics`.
pub fn build_metrics(config: &MetricConfig) -> MetricResult<Vec<CumulativePercentage>> {
    config
        .metrics
        .iter()
        .map(|name| {
            MetricKind::from_name(name)
                .ok_or_else(|| {
                    MetricError::InvalidConfiguration(format!("unknown metric `{}`", name))
                })?
                .build(config)
        })
        .collect()
}

// ============================================================================
// CumulativePercentage
// ============================================================================

/// Cumulative share of tail (or head) items in each user's top-K list.
///
/// The classified item set is memoized for the instance's lifetime and is
/// recomputed whenever the ratio, the policy, or the popularity table
/// changes.
///
/// # Example
///
/// ```
/// use recfair_core::config::MetricConfig;
/// use recfair_core::evaluation::{
///     CumulativePercentage, EvalData, ItemId, Matrix, PopularityTable, RankingMetric,
/// };
///
/// let counts = PopularityTable::from_counts([("A", 10.0), ("B", 5.0), ("C", 3.0), ("D", 2.0)]).unwrap();
/// let recs = Matrix::from_rows(vec![
///     ["A", "D", "B", "C", "A"].iter().map(|id| ItemId::from(*id)).collect(),
/// ]).unwrap();
///
/// let config = MetricConfig { topk: vec![2, 5], ..Default::default() };
/// let mut metric = CumulativePercentage::tail(&config).unwrap();
/// let scores = metric.calculate(&EvalData::new(recs, counts)).unwrap();
/// assert_eq!(scores["cumulativetailpercentage@5"], 0.4);
/// ```
#[derive(Debug)]
pub struct CumulativePercentage {
    kind: MetricKind,
    topk: Vec<usize>,
    tail_ratio: f64,
    head_ratio: Option<f64>,
    tail_policy: TailPolicy,
    aggregation: AggregationMode,
    decimal_place: u32,
    cache: ClassificationCache,
}

impl CumulativePercentage {
    /// Creates a metric of the given kind from a validated configuration.
    pub fn new(kind: MetricKind, config: &MetricConfig) -> MetricResult<Self> {
        config.validate()?;
        Ok(Self {
            kind,
            topk: config.topk.clone(),
            tail_ratio: config.effective_tail_ratio(),
            head_ratio: config.head_ratio,
            tail_policy: config.tail_policy,
            aggregation: config.aggregation,
            decimal_place: config.metric_decimal_place,
            cache: ClassificationCache::new(),
        })
    }

    /// `cumulativetailpercentage` metric.
    pub fn tail(config: &MetricConfig) -> MetricResult<Self> {
        Self::new(MetricKind::CumulativeTailPercentage, config)
    }

    /// `cumulativeheadpercentage` metric.
    pub fn head(config: &MetricConfig) -> MetricResult<Self> {
        Self::new(MetricKind::CumulativeHeadPercentage, config)
    }

    /// Which metric this instance computes.
    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Configured cutoffs.
    pub fn topk(&self) -> &[usize] {
        &self.topk
    }

    /// Replaces the tail ratio and drops the cached classification.
    pub fn set_tail_ratio(&mut self, ratio: f64) -> MetricResult<()> {
        crate::config::validate_ratio("tail_ratio", ratio)?;
        self.tail_ratio = ratio;
        self.cache.invalidate();
        Ok(())
    }

    /// Replaces the head ratio and drops the cached classification.
    pub fn set_head_ratio(&mut self, ratio: f64) -> MetricResult<()> {
        crate::config::validate_ratio("head_ratio", ratio)?;
        self.head_ratio = Some(ratio);
        self.cache.invalidate();
        Ok(())
    }

    /// Head ratio of the complement-of-head tail policy.
    fn complement_head_ratio(&self) -> f64 {
        self.head_ratio.unwrap_or(1.0 - self.tail_ratio)
    }

    /// Head ratio of the head metric, defaulting to the tail ratio.
    fn head_metric_ratio(&self) -> f64 {
        self.head_ratio.unwrap_or(self.tail_ratio)
    }

    /// The classification this metric applies.
    pub fn classifier(&self) -> Classifier {
        match self.kind {
            MetricKind::CumulativeTailPercentage => Classifier::Tail {
                ratio: self.tail_ratio,
                policy: self.tail_policy,
                head_ratio: self.complement_head_ratio(),
            },
            MetricKind::CumulativeHeadPercentage => Classifier::Head {
                ratio: self.head_metric_ratio(),
            },
        }
    }

    /// Classified item set for `counts`, served from the cache when possible.
    pub fn member_items(&mut self, counts: &PopularityTable) -> MetricResult<Arc<ItemSet>> {
        let classifier = self.classifier();
        self.cache.get_or_classify(classifier, counts)
    }
}

impl RankingMetric for CumulativePercentage {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn calculate(&mut self, data: &dyn DataSource) -> MetricResult<MetricScores> {
        let (rec_items, count_items) = used_info(data)?;
        let members = self.member_items(count_items)?;
        debug!(
            "{}: {} of {} items classified, {} users x {} ranks",
            self.name(),
            members.len(),
            count_items.len(),
            rec_items.rows(),
            rec_items.cols()
        );

        let mask = build_mask(rec_items, &members);
        aggregate(
            self.name(),
            &mask,
            &self.topk,
            self.aggregation,
            self.decimal_place,
        )
    }
}
