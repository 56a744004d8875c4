//! # Recfair Core
//!
//! Long-tail popularity and group fairness metrics for ranked recommendations.
//!
//! This crate consumes already-computed rankings and item interaction counts
//! and performs read-only analysis. It is designed to be driven by a host
//! evaluation pipeline (or the `recfair` CLI) once per evaluation pass.
//!
//! ## Modules
//!
//! - [`evaluation`] - Tail/head classification, relevance masks, top-K aggregation
//! - [`reporting`] - Group fairness tables and pluggable report sinks
//! - [`config`] - Metric configuration and defaults
//! - [`error`] - Error types for metric computation and reporting

pub mod config;
pub mod error;
pub mod evaluation;
pub mod reporting;

pub use config::MetricConfig;
pub use error::{MetricError, MetricResult, ReportError};
