//! Report sinks: where computed numbers and tables end up.
//!
//! The experiment-tracking service is an injected capability. Anything that
//! accepts scalar maps, tables and run-summary values can implement
//! [`ReportSink`]; the core never talks to a tracking service directly.
//!
//! # Implementations
//!
//! - [`MemorySink`] - Keeps every event in memory (testing, embedding hosts)
//! - [`JsonLinesSink`] - Writes one JSON object per event to any `Write`

use crate::error::ReportError;
use crate::reporting::table::Table;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Destination for logged metrics and tables.
pub trait ReportSink {
    /// Logs a batch of named scalars, optionally at a step index.
    #[must_use = "Sink write failures should be handled"]
    fn log_scalars(
        &mut self,
        values: &BTreeMap<String, f64>,
        step: Option<u64>,
    ) -> Result<(), ReportError>;

    /// Logs a named table, optionally at a step index.
    #[must_use = "Sink write failures should be handled"]
    fn log_table(&mut self, name: &str, table: &Table, step: Option<u64>)
        -> Result<(), ReportError>;

    /// Records a run-level summary value (last write wins).
    #[must_use = "Sink write failures should be handled"]
    fn set_summary(&mut self, key: &str, value: f64) -> Result<(), ReportError>;
}

/// A single sink event, as stored by [`MemorySink`] and written by
/// [`JsonLinesSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SinkEvent {
    /// Scalar batch
    Scalars {
        /// Name → value
        values: BTreeMap<String, f64>,
        /// Step index
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<u64>,
    },
    /// Named table
    Table {
        /// Table key
        name: String,
        /// Table payload
        table: Table,
        /// Step index
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<u64>,
    },
    /// Run summary value
    Summary {
        /// Summary key
        key: String,
        /// Summary value
        value: f64,
    },
}

// ============================================================================
// MemorySink
// ============================================================================

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<SinkEvent>,
    summary: BTreeMap<String, f64>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event in arrival order.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Current run summary.
    pub fn summary(&self) -> &BTreeMap<String, f64> {
        &self.summary
    }

    /// Most recent table logged under `name`.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.events.iter().rev().find_map(|event| match event {
            SinkEvent::Table { name: n, table, .. } if n == name => Some(table),
            _ => None,
        })
    }
}

impl ReportSink for MemorySink {
    fn log_scalars(
        &mut self,
        values: &BTreeMap<String, f64>,
        step: Option<u64>,
    ) -> Result<(), ReportError> {
        self.events.push(SinkEvent::Scalars {
            values: values.clone(),
            step,
        });
        Ok(())
    }

    fn log_table(
        &mut self,
        name: &str,
        table: &Table,
        step: Option<u64>,
    ) -> Result<(), ReportError> {
        self.events.push(SinkEvent::Table {
            name: name.to_string(),
            table: table.clone(),
            step,
        });
        Ok(())
    }

    fn set_summary(&mut self, key: &str, value: f64) -> Result<(), ReportError> {
        self.summary.insert(key.to_string(), value);
        self.events.push(SinkEvent::Summary {
            key: key.to_string(),
            value,
        });
        Ok(())
    }
}

// ============================================================================
// JsonLinesSink
// ============================================================================

/// Sink writing newline-delimited JSON events.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event(&mut self, event: &SinkEvent) -> Result<(), ReportError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn log_scalars(
        &mut self,
        values: &BTreeMap<String, f64>,
        step: Option<u64>,
    ) -> Result<(), ReportError> {
        self.write_event(&SinkEvent::Scalars {
            values: values.clone(),
            step,
        })
    }

    fn log_table(
        &mut self,
        name: &str,
        table: &Table,
        step: Option<u64>,
    ) -> Result<(), ReportError> {
        self.write_event(&SinkEvent::Table {
            name: name.to_string(),
            table: table.clone(),
            step,
        })
    }

    fn set_summary(&mut self, key: &str, value: f64) -> Result<(), ReportError> {
        self.write_event(&SinkEvent::Summary {
            key: key.to_string(),
            value,
        })
    }
}
