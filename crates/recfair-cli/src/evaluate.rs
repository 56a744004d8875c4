//! Evaluate command implementation.
//!
//! Loads an evaluation input file and runs every configured popularity
//! metric against it.

use anyhow::{Context, Result};
use recfair_core::config::MetricConfig;
use recfair_core::evaluation::{build_metrics, EvalData, RankingMetric};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Scores of one metric, in configured cutoff order.
#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    pub name: String,
    pub scores: Vec<(String, f64)>,
}

/// Everything the evaluate command prints.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub num_users: usize,
    pub list_length: usize,
    pub num_items: usize,
    pub metrics: Vec<MetricReport>,
}

impl EvaluationReport {
    /// All scores as one `name@k → score` map.
    pub fn flat_scores(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .flat_map(|m| m.scores.iter().cloned())
            .collect()
    }
}

/// Loads the input file and runs the configured metrics.
///
/// The input file holds `{"rec_items": [[...]], "count_items": {...}}`.
pub fn execute_evaluate(input: &Path, config: &MetricConfig) -> Result<EvaluationReport> {
    info!("Loading evaluation data: {}", input.display());
    let data: EvalData = crate::config::read_json(input)?;
    run_metrics(&data, config)
}

/// Runs every metric named in `config` against `data`.
pub fn run_metrics(data: &EvalData, config: &MetricConfig) -> Result<EvaluationReport> {
    let metrics = build_metrics(config).context("Invalid metric configuration")?;

    let mut reports = Vec::with_capacity(metrics.len());
    for mut metric in metrics {
        let name = metric.name();
        info!("Computing {}", name);
        let mut scores = metric
            .calculate(data)
            .with_context(|| format!("Failed to compute {}", name))?;

        // BTreeMap orders "@10" before "@5"; report in configured order.
        let ordered = metric
            .topk()
            .iter()
            .filter_map(|k| {
                let key = format!("{}@{}", name, k);
                scores.remove(&key).map(|score| (key, score))
            })
            .collect();
        reports.push(MetricReport {
            name: name.to_string(),
            scores: ordered,
        });
    }

    Ok(EvaluationReport {
        num_users: data.rec_items.rows(),
        list_length: data.rec_items.cols(),
        num_items: data.count_items.len(),
        metrics: reports,
    })
}
