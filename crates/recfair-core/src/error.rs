//! Error types for recfair-core.
//!
//! This module defines the errors raised while computing popularity metrics
//! and while writing reports to a sink.

use thiserror::Error;

/// Convenience alias for results produced by metric computation.
pub type MetricResult<T> = Result<T, MetricError>;

/// Errors that can occur while classifying items or computing metrics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Input data is empty, malformed, or missing
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A cutoff exceeds the number of ranked positions available
    #[error("Cutoff @{k} is out of range for {columns} ranked positions")]
    OutOfRange {
        /// Requested cutoff (1-indexed)
        k: usize,
        /// Number of columns in the recommendation matrix
        columns: usize,
    },
    /// Configuration rejected at metric construction
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors that can occur while writing to a report sink.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// Writing to the underlying destination failed
    #[error("Failed to write report: {0}")]
    Io(String),
    /// Payload could not be encoded
    #[error("Failed to serialize report: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

impl From<MetricError> for String {
    fn from(err: MetricError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = MetricError::OutOfRange { k: 20, columns: 10 };
        assert_eq!(
            err.to_string(),
            "Cutoff @20 is out of range for 10 ranked positions"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = ReportError::from(io);
        assert!(matches!(err, ReportError::Io(msg) if msg.contains("pipe closed")));
    }
}
