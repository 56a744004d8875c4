//! Group fairness summaries across user cohorts or item categories.
//!
//! A host evaluates the same metrics separately for every group of every
//! group type (e.g. `gender` → `{0, 1}`, `age` → `{young, old}`). This module
//! turns those results into:
//!
//! - a **detail table**: one row per group, one column per metric name
//! - a **summary table**: mean, population std, absolute disparity and
//!   coefficient of variation per `(group type, metric)` pair
//!
//! Detail rows follow the host's group order. Metric columns and summary
//! buckets are sorted, so neither depends on input iteration order.

use crate::evaluation::stats::DispersionStats;
use crate::reporting::table::{Cell, Table};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Metric values per group id per group type, in the host's insertion order.
pub type GroupEval = IndexMap<String, IndexMap<String, BTreeMap<String, f64>>>;

/// Display name per group id per group type.
pub type GroupNameMappings = BTreeMap<String, BTreeMap<String, String>>;

/// Detail table column holding the group type.
pub const GROUP_TYPE_COLUMN: &str = "GroupType";
/// Detail table column holding the group display name.
pub const GROUP_COLUMN: &str = "Group";
/// Detail table column holding the group size.
pub const GROUP_SIZE_COLUMN: &str = "GroupSize";

/// Summary table columns, in order.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "Group Type",
    "Metric",
    "Mean",
    "Std",
    "Abs Disparity",
    "Coeff Var",
];

/// Group sizes recorded by the host while splitting the evaluation data.
///
/// Keys are `"{group_type}_group"` or `"{group_type}"`, then group id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupEvalMeta {
    /// Sizes of user groups
    pub user_group_sizes: BTreeMap<String, BTreeMap<String, u64>>,
    /// Sizes of item groups
    pub item_group_sizes: BTreeMap<String, BTreeMap<String, u64>>,
}

impl GroupEvalMeta {
    /// Size table for a group type.
    ///
    /// The first non-empty table wins, in this order: user sizes under
    /// `"{type}_group"`, user sizes under `"{type}"`, item sizes under
    /// `"{type}_group"`.
    pub fn sizes_for(&self, group_type: &str) -> Option<&BTreeMap<String, u64>> {
        let suffixed = format!("{}_group", group_type);
        [
            self.user_group_sizes.get(&suffixed),
            self.user_group_sizes.get(group_type),
            self.item_group_sizes.get(&suffixed),
        ]
        .into_iter()
        .flatten()
        .find(|sizes| !sizes.is_empty())
    }
}

/// Metric values of one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetricRecord {
    /// Grouping axis, e.g. `gender`
    pub group_type: String,
    /// Group display name (or id when unmapped)
    pub group: String,
    /// Number of members, when known
    pub group_size: Option<u64>,
    /// Metric name → value
    pub metrics: BTreeMap<String, f64>,
}

/// Dispersion of one metric across the groups of one group type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummaryRecord {
    /// Grouping axis
    pub group_type: String,
    /// Metric name
    pub metric: String,
    /// Mean, std, disparity and coefficient of variation
    pub stats: DispersionStats,
}

/// Flattens nested group results into records.
///
/// Group ids are replaced by their display name when `name_mappings` has
/// one; sizes come from `meta` (see [`GroupEvalMeta::sizes_for`]).
pub fn collect_records(
    group_eval: &GroupEval,
    name_mappings: Option<&GroupNameMappings>,
    meta: Option<&GroupEvalMeta>,
) -> Vec<GroupMetricRecord> {
    let mut records = Vec::new();
    for (group_type, groups) in group_eval {
        let names = name_mappings.and_then(|m| m.get(group_type));
        let sizes = meta.and_then(|m| m.sizes_for(group_type));

        for (group_id, metrics) in groups {
            records.push(GroupMetricRecord {
                group_type: group_type.clone(),
                group: names
                    .and_then(|n| n.get(group_id))
                    .cloned()
                    .unwrap_or_else(|| group_id.clone()),
                group_size: sizes.and_then(|s| s.get(group_id)).copied(),
                metrics: metrics.clone(),
            });
        }
    }
    records
}

/// One row per record; metric columns are the sorted union of all metric
/// names, and metrics a record lacks are left unset.
pub fn detail_table(records: &[GroupMetricRecord]) -> Table {
    let metric_names: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.metrics.keys().map(String::as_str))
        .collect();

    let mut columns = vec![
        GROUP_TYPE_COLUMN.to_string(),
        GROUP_COLUMN.to_string(),
        GROUP_SIZE_COLUMN.to_string(),
    ];
    columns.extend(metric_names.iter().map(|m| m.to_string()));

    let rows = records
        .iter()
        .map(|record| {
            let mut row = vec![
                Cell::from(record.group_type.as_str()),
                Cell::from(record.group.as_str()),
                record
                    .group_size
                    .and_then(|s| i64::try_from(s).ok())
                    .map_or(Cell::Null, Cell::Int),
            ];
            row.extend(
                metric_names
                    .iter()
                    .map(|m| Cell::from(record.metrics.get(*m).copied())),
            );
            row
        })
        .collect();

    Table { columns, rows }
}

/// Dispersion statistics per `(group type, metric)`, in sorted key order.
pub fn summary_records(records: &[GroupMetricRecord]) -> Vec<GroupSummaryRecord> {
    let mut buckets: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
    for record in records {
        for (metric, &value) in &record.metrics {
            buckets
                .entry((record.group_type.as_str(), metric.as_str()))
                .or_default()
                .push(value);
        }
    }

    buckets
        .into_iter()
        .filter_map(|((group_type, metric), values)| {
            DispersionStats::compute(&values).map(|stats| GroupSummaryRecord {
                group_type: group_type.to_string(),
                metric: metric.to_string(),
                stats,
            })
        })
        .collect()
}

/// Renders summary records under [`SUMMARY_COLUMNS`].
pub fn summary_table(summaries: &[GroupSummaryRecord]) -> Table {
    Table {
        columns: SUMMARY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: summaries
            .iter()
            .map(|s| {
                vec![
                    Cell::from(s.group_type.as_str()),
                    Cell::from(s.metric.as_str()),
                    Cell::Float(s.stats.mean),
                    Cell::Float(s.stats.std),
                    Cell::Float(s.stats.disparity),
                    Cell::Float(s.stats.coeff_var),
                ]
            })
            .collect(),
    }
}

/// Builds the detail and summary tables for a set of group records.
pub fn summarize(records: &[GroupMetricRecord]) -> (Table, Table) {
    (
        detail_table(records),
        summary_table(&summary_records(records)),
    )
}
