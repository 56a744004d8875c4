//! Output formatting for metric scores and group tables.
//!
//! Supports both human-readable terminal output and JSON for scripting.

use crate::evaluate::EvaluationReport;
use recfair_core::reporting::Table;
use serde::Serialize;

/// JSON output structure for the groups command
#[derive(Serialize)]
pub struct JsonTables<'a> {
    pub detail: &'a Table,
    pub summary: &'a Table,
}

/// Formats an evaluation report as JSON.
pub fn format_report_json(report: &EvaluationReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an evaluation report for terminal output.
pub fn format_report_human(report: &EvaluationReport, precision: usize) -> String {
    let mut output = format!(
        "Evaluated {} user{} x {} position{} against {} item{}\n",
        report.num_users,
        plural(report.num_users),
        report.list_length,
        plural(report.list_length),
        report.num_items,
        plural(report.num_items),
    );

    let width = report
        .metrics
        .iter()
        .flat_map(|m| m.scores.iter().map(|(key, _)| key.len()))
        .max()
        .unwrap_or(0);

    for metric in &report.metrics {
        output.push('\n');
        for (key, score) in &metric.scores {
            output.push_str(&format!("{:<width$}  {:.*}\n", key, precision, score));
        }
    }

    output.trim_end().to_string()
}

/// Formats the group detail and summary tables as JSON.
pub fn format_tables_json(detail: &Table, summary: &Table) -> String {
    serde_json::to_string_pretty(&JsonTables { detail, summary })
        .unwrap_or_else(|_| "{}".to_string())
}

/// Formats a table with padded columns under a title line.
pub fn format_table_human(title: &str, table: &Table, precision: usize) -> String {
    if table.is_empty() {
        return format!("{}: no rows", title);
    }

    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| format!("{:.*}", precision, c)).collect())
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rendered
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = format!("{}\n", title);
    output.push_str(&join_padded(table.columns.iter(), &widths));
    output.push('\n');
    for row in &rendered {
        output.push_str(&join_padded(row.iter(), &widths));
        output.push('\n');
    }

    output.trim_end().to_string()
}

fn join_padded<'a>(cells: impl Iterator<Item = &'a String>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
