//! HTTP Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A response construction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for response operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A header value could not be produced (formatting or invalid characters).
    #[display("invalid header: {_0}")]
    Header(#[error(not(source))] &'static str),
    /// Output mode not recognised.
    #[display("unsupported output mode: {_0}")]
    UnsupportedMode(#[error(not(source))] String),
    #[display("failed to build response")]
    Response,
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
