//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `CtError` as one variant
//! via `#[from]`, so configuration and input errors raised by core helpers
//! keep their message all the way up to the binary.

use thiserror::Error;

/// The top-level error type for `ct-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CtError {
    /// Invalid option or option combination.
    #[error("configuration error: {0}")]
    Config(String),

    /// A table row or attribute that cannot be interpreted.
    #[error("malformed input in {source_name} at line {line}: {reason}")]
    MalformedInput {
        source_name: String,
        line:        u64,
        reason:      String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CtError {
    /// Shorthand for [`CtError::MalformedInput`].
    pub fn malformed(source_name: impl Into<String>, line: u64, reason: impl Into<String>) -> Self {
        CtError::MalformedInput {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Shorthand result type for all `ct-*` crates.
pub type CtResult<T> = Result<T, CtError>;
