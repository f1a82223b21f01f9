//! Spatial-subsystem error type.

use thiserror::Error;

use ct_core::CtError;

/// Errors produced by `ct-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("duplicate site id {id:?} in {source_name} at line {line}")]
    DuplicateSite {
        id:          String,
        source_name: String,
        line:        u64,
    },

    /// The network description has no usable projection metadata.
    #[error("projection error: {0}")]
    Projection(String),

    #[error("network XML error: {0}")]
    NetworkXml(String),

    #[error(transparent)]
    Core(#[from] CtError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpatialError {
    /// Turn a CSV decoding failure into a `MalformedInput` error that names
    /// the file and line, keeping real I/O failures as they are.
    pub(crate) fn from_csv(source_name: &str, err: csv::Error) -> Self {
        if err.is_io_error() {
            return SpatialError::Csv(err);
        }
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        SpatialError::Core(CtError::malformed(source_name, line, err.to_string()))
    }
}

pub type SpatialResult<T> = Result<T, SpatialError>;
