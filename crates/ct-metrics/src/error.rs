//! Error types for ct-metrics.

use thiserror::Error;

use ct_core::CtError;
use ct_output::OutputError;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CtError),

    /// Reading the association event log failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl MetricsError {
    /// Map a CSV decoding failure to `MalformedInput` with file and line.
    pub(crate) fn from_csv(source_name: &str, err: csv::Error) -> Self {
        if err.is_io_error() {
            return MetricsError::Csv(err);
        }
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        MetricsError::Core(CtError::malformed(source_name, line, err.to_string()))
    }
}

pub type MetricsResult<T> = Result<T, MetricsError>;
