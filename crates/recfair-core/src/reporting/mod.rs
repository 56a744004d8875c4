//! Reporting: group fairness tables and pluggable report sinks.
//!
//! - [`group`] - Detail and summary tables across user/item groups
//! - [`table`] - Tabular payload shared by all sinks
//! - [`sink`] - The [`ReportSink`] capability and its implementations
//! - [`logger`] - [`ExperimentLogger`], the front end an evaluation run uses

pub mod group;
pub mod logger;
pub mod sink;
pub mod table;

pub use group::{
    collect_records, detail_table, summarize, summary_records, summary_table, GroupEval,
    GroupEvalMeta, GroupMetricRecord, GroupNameMappings, GroupSummaryRecord,
};
pub use logger::{add_head_to_metrics, ExperimentLogger};
pub use sink::{JsonLinesSink, MemorySink, ReportSink, SinkEvent};
pub use table::{Cell, Table};
