//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;
use std::time::Duration;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown in place of diagnostics whenever details must not leak.
pub const GENERIC_MESSAGE: &str = "Sorry, there was an error generating the PDF";

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Selector is not a key of the binary table. Raised when configuring,
    /// before anything is spawned.
    #[display("unknown binary selector: {_0}")]
    InvalidSelector(#[error(not(source))] String),
    /// Configured path does not exist, is not a file, or is not executable.
    #[display("renderer binary is not executable: {}", _0.display())]
    InvalidBinary(#[error(not(source))] PathBuf),
    #[display("no renderer binary detected on your system")]
    BinaryNotFound,
    /// The operating system refused to start the process.
    #[display("failed to spawn renderer: {}", _0.display())]
    SpawnFailed(#[error(not(source))] PathBuf),
    #[display("I/O error")]
    Io,
    /// The renderer wrote diagnostics to stderr. Holds the raw diagnostic
    /// when verbose errors were requested, [`GENERIC_MESSAGE`] otherwise.
    #[display("renderer reported an error: {_0}")]
    RenderFailed(#[error(not(source))] String),
    /// The renderer produced nothing and exited unsuccessfully. An exit code of
    /// `-1` means the process was terminated by a signal.
    #[display("renderer exited with code {exit_code}")]
    ProcessFailed { exit_code: i32, diagnostic: String },
    #[display("renderer did not finish within {_0:?}")]
    Timeout(#[error(not(source))] Duration),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns `true` for failures of the rendering infrastructure rather
    /// than of the document being rendered.
    pub fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::RenderFailed(_))
    }

    /// The text that may be shown to an end user for this error.
    pub fn public_message(&self) -> &str {
        match self {
            Self::RenderFailed(diagnostic) => diagnostic,
            _ => GENERIC_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::InvalidSelector("qa".to_string()).to_string(), "unknown binary selector: qa");
        assert_eq!(
            ErrorKind::ProcessFailed { exit_code: 3, diagnostic: String::new() }.to_string(),
            "renderer exited with code 3"
        );
        assert_eq!(ErrorKind::Timeout(Duration::from_secs(2)).to_string(), "renderer did not finish within 2s");
    }

    #[rstest]
    #[case(ErrorKind::InvalidSelector("x".into()), false)]
    #[case(ErrorKind::SpawnFailed("/bin/x".into()), false)]
    #[case(ErrorKind::RenderFailed("boom".into()), false)]
    #[case(ErrorKind::Timeout(Duration::from_secs(1)), true)]
    fn error_kind_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn only_render_failures_expose_diagnostics() {
        assert_eq!(ErrorKind::RenderFailed("boom".into()).public_message(), "boom");
        let process = ErrorKind::ProcessFailed { exit_code: 1, diagnostic: "secret".into() };
        assert!(process.is_infrastructure());
        assert_eq!(process.public_message(), GENERIC_MESSAGE);
        assert_eq!(ErrorKind::Timeout(Duration::from_secs(1)).public_message(), GENERIC_MESSAGE);
    }
}
