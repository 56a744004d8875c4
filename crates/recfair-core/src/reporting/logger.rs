//! Experiment logger: the reporting front end used by an evaluation run.
//!
//! [`ExperimentLogger`] wraps an optional [`ReportSink`]. A disabled logger
//! accepts every call and does nothing, so callers never branch on whether
//! tracking is configured.

use crate::error::ReportError;
use crate::reporting::group::{
    collect_records, summarize, GroupEval, GroupEvalMeta, GroupNameMappings,
};
use crate::reporting::sink::ReportSink;
use std::collections::BTreeMap;
use tracing::debug;

/// Table key of the per-group detail table.
pub const GROUP_DETAIL_KEY: &str = "group_eval/all_groups";

/// Table key of the per-metric summary table.
pub const GROUP_SUMMARY_KEY: &str = "group_eval_summary";

/// Scalar key of the validation score.
pub const VALID_SCORE_KEY: &str = "valid_score";

/// Logs metrics, summaries and group tables to an optional sink.
#[derive(Debug)]
pub struct ExperimentLogger<S> {
    sink: Option<S>,
}

impl<S: ReportSink> ExperimentLogger<S> {
    /// Logger writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    /// Logger that drops everything.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Returns true if a sink is attached.
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Borrows the attached sink.
    pub fn sink(&self) -> Option<&S> {
        self.sink.as_ref()
    }

    /// Detaches and returns the sink.
    pub fn into_sink(self) -> Option<S> {
        self.sink
    }

    /// Logs scalars under `"{head}/"`; an empty head logs keys verbatim.
    pub fn log_metrics(
        &mut self,
        metrics: &BTreeMap<String, f64>,
        head: &str,
    ) -> Result<(), ReportError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        if head.is_empty() {
            sink.log_scalars(metrics, None)
        } else {
            sink.log_scalars(&add_head_to_metrics(metrics, head), None)
        }
    }

    /// Writes final evaluation scores as run-summary values under `"{head}/"`.
    pub fn log_eval_metrics(
        &mut self,
        metrics: &BTreeMap<String, f64>,
        head: &str,
    ) -> Result<(), ReportError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        for (key, value) in add_head_to_metrics(metrics, head) {
            sink.set_summary(&key, value)?;
        }
        Ok(())
    }

    /// Logs group-level results as a detail table and a summary table.
    ///
    /// Nothing is logged when `group_eval` holds no groups.
    pub fn log_group_eval(
        &mut self,
        group_eval: &GroupEval,
        name_mappings: Option<&GroupNameMappings>,
        meta: Option<&GroupEvalMeta>,
        step: Option<u64>,
    ) -> Result<(), ReportError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };

        let records = collect_records(group_eval, name_mappings, meta);
        if records.is_empty() {
            return Ok(());
        }

        let (detail, summary) = summarize(&records);
        debug!(
            "Logging {} group rows and {} summary rows",
            detail.len(),
            summary.len()
        );
        sink.log_table(GROUP_DETAIL_KEY, &detail, step)?;
        sink.log_table(GROUP_SUMMARY_KEY, &summary, step)
    }

    /// Logs the validation score used for model selection.
    pub fn log_valid_score(&mut self, valid_score: f64) -> Result<(), ReportError> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let values = BTreeMap::from([(VALID_SCORE_KEY.to_string(), valid_score)]);
        sink.log_scalars(&values, None)
    }
}

/// Prefixes keys with `"{head}/"`, leaving step counters (`*_step*`) as-is.
pub fn add_head_to_metrics(
    metrics: &BTreeMap<String, f64>,
    head: &str,
) -> BTreeMap<String, f64> {
    metrics
        .iter()
        .map(|(key, &value)| {
            if key.contains("_step") {
                (key.clone(), value)
            } else {
                (format!("{}/{}", head, key), value)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::sink::{MemorySink, SinkEvent};
    use crate::reporting::table::Cell;

    fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_head_prefix_skips_step_keys() {
        let prefixed =
            add_head_to_metrics(&metrics(&[("loss", 0.1), ("train_step", 4.0)]), "train");
        assert_eq!(
            prefixed,
            metrics(&[("train/loss", 0.1), ("train_step", 4.0)])
        );
    }

    #[test]
    fn test_log_metrics_with_and_without_head() {
        let mut logger = ExperimentLogger::new(MemorySink::new());
        logger.log_metrics(&metrics(&[("loss", 0.1)]), "train").unwrap();
        logger.log_metrics(&metrics(&[("loss", 0.2)]), "").unwrap();

        let sink = logger.sink().unwrap();
        assert_eq!(
            sink.events()[0],
            SinkEvent::Scalars {
                values: metrics(&[("train/loss", 0.1)]),
                step: None
            }
        );
        assert_eq!(
            sink.events()[1],
            SinkEvent::Scalars {
                values: metrics(&[("loss", 0.2)]),
                step: None
            }
        );
    }

    #[test]
    fn test_log_eval_metrics_sets_summary() {
        let mut logger = ExperimentLogger::new(MemorySink::new());
        logger
            .log_eval_metrics(&metrics(&[("cumulativetailpercentage@10", 0.12)]), "eval")
            .unwrap();
        let sink = logger.into_sink().unwrap();
        assert_eq!(sink.summary()["eval/cumulativetailpercentage@10"], 0.12);
    }

    #[test]
    fn test_log_group_eval_writes_both_tables() {
        let mut group_eval = GroupEval::new();
        for (id, value) in [("0", 0.30), ("1", 0.34), ("2", 0.28)] {
            group_eval
                .entry("gender".to_string())
                .or_default()
                .insert(id.to_string(), metrics(&[("ndcg@10", value)]));
        }

        let mut logger = ExperimentLogger::new(MemorySink::new());
        logger.log_group_eval(&group_eval, None, None, Some(7)).unwrap();

        let sink = logger.sink().unwrap();
        assert_eq!(sink.events().len(), 2);
        let detail = sink.table(GROUP_DETAIL_KEY).unwrap();
        assert_eq!(detail.len(), 3);
        let summary = sink.table(GROUP_SUMMARY_KEY).unwrap();
        assert_eq!(summary.len(), 1);
        let disparity = summary.get(0, "Abs Disparity").and_then(Cell::as_f64).unwrap();
        assert!((disparity - 0.06).abs() < 1e-9);
        assert!(matches!(sink.events()[1], SinkEvent::Table { step: Some(7), .. }));
    }

    #[test]
    fn test_log_group_eval_skips_empty_input() {
        let mut logger = ExperimentLogger::new(MemorySink::new());
        logger.log_group_eval(&GroupEval::new(), None, None, None).unwrap();
        assert!(logger.sink().unwrap().events().is_empty());
    }

    #[test]
    fn test_disabled_logger_is_noop() {
        let mut logger: ExperimentLogger<MemorySink> = ExperimentLogger::disabled();
        assert!(!logger.is_enabled());
        logger.log_metrics(&metrics(&[("a", 1.0)]), "train").unwrap();
        logger.log_valid_score(0.5).unwrap();
        assert!(logger.into_sink().is_none());
    }

    #[test]
    fn test_log_valid_score() {
        let mut logger = ExperimentLogger::new(MemorySink::new());
        logger.log_valid_score(0.42).unwrap();
        assert_eq!(
            logger.sink().unwrap().events()[0],
            SinkEvent::Scalars {
                values: metrics(&[("valid_score", 0.42)]),
                step: None
            }
        );
    }
}
