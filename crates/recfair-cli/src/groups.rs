//! Groups command implementation.
//!
//! Reads per-group metric results and builds the group fairness tables.

use anyhow::Result;
use recfair_core::reporting::{
    collect_records, summarize, GroupEval, GroupEvalMeta, GroupNameMappings, Table,
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Group results as written by a host evaluation pipeline.
#[derive(Debug, Deserialize)]
pub struct GroupInput {
    pub group_eval: GroupEval,
    #[serde(default)]
    pub group_name_mappings: Option<GroupNameMappings>,
    #[serde(default)]
    pub group_eval_meta: Option<GroupEvalMeta>,
    #[serde(default)]
    pub step: Option<u64>,
}

/// Loads group results from `input`.
pub fn load_group_input(input: &Path) -> Result<GroupInput> {
    info!("Loading group results: {}", input.display());
    crate::config::read_json(input)
}

/// Builds the detail and summary tables for `input`.
pub fn build_tables(input: &GroupInput) -> (Table, Table) {
    let records = collect_records(
        &input.group_eval,
        input.group_name_mappings.as_ref(),
        input.group_eval_meta.as_ref(),
    );
    info!("Collected {} group records", records.len());
    summarize(&records)
}
