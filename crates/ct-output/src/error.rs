//! Error types for ct-output.

use thiserror::Error;

use ct_core::CtError;

/// Errors that can occur when writing or reading output tables.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] CtError),

    /// An event refers to a site index the writer has no label for.
    #[error("no site id for catalog index {0}")]
    UnknownSite(u32),
}

impl OutputError {
    /// Map a CSV decoding failure to `MalformedInput` with file and line;
    /// I/O failures stay as they are.
    pub(crate) fn from_csv(source_name: &str, err: csv::Error) -> Self {
        if err.is_io_error() {
            return OutputError::Csv(err);
        }
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        OutputError::Core(CtError::malformed(source_name, line, err.to_string()))
    }
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
