//! HTML to PDF rendering through an external binary.
//!
//! The renderer binary (wkhtmltopdf or anything honouring the same contract)
//! is invoked as `<path> --quiet - -`: HTML goes in on stdin, the PDF comes
//! back on stdout, and diagnostics are written to stderr. Which binary is
//! used is chosen per call through a [`Selector`] into a validated
//! [`BinaryTable`].
//!
//! ```no_run
//! use pdfpipe_render::{BinaryTable, Renderer};
//! # use pdfpipe_render::error::Result;
//!
//! # async fn example() -> Result<()> {
//! let renderer = Renderer::new(BinaryTable::discover()?);
//! let options = renderer.configure("default", false)?;
//! let pdf = renderer.render("<h1>Hello</h1>", &options).await?;
//! # Ok(())
//! # }
//! ```

mod binary;
pub mod error;
mod render;

pub use crate::binary::{BinaryTable, Selector};
use crate::error::Result;
pub use crate::render::Captured;
use std::sync::Arc;
use std::time::Duration;

/// Runs renderer binaries. Cheap to clone; clones share the same [`BinaryTable`].
#[derive(Clone, Debug)]
pub struct Renderer {
    binaries: Arc<BinaryTable>,
    timeout: Duration,
}
impl Renderer {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(binaries: impl Into<Arc<BinaryTable>>) -> Self {
        Self { binaries: binaries.into(), timeout: Self::DEFAULT_TIMEOUT }
    }

    /// Bound on a whole render call, from spawn to exit. Individual calls may
    /// override it through [`RenderOptions::with_timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binaries(&self) -> &BinaryTable {
        &self.binaries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validates `selector` and fixes the options for subsequent renders.
    ///
    /// Fails with [`ErrorKind::InvalidSelector`](crate::error::ErrorKind::InvalidSelector)
    /// if the selector is not in the table. Nothing is spawned and the
    /// filesystem is not touched.
    pub fn configure(&self, selector: impl AsRef<str>, verbose_errors: bool) -> Result<RenderOptions> {
        let selector = self.binaries.lookup(selector)?;
        Ok(RenderOptions { selector, verbose_errors, timeout: None })
    }
}
impl From<BinaryTable> for Renderer {
    fn from(binaries: BinaryTable) -> Self {
        Self::new(binaries)
    }
}

/// Immutable per-call configuration, obtained from [`Renderer::configure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    selector: Selector,
    verbose_errors: bool,
    timeout: Option<Duration>,
}
impl RenderOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// When `true`, renderer diagnostics are passed through to the caller
    /// verbatim. Otherwise they are replaced with
    /// [`GENERIC_MESSAGE`](crate::error::GENERIC_MESSAGE).
    pub fn verbose_errors(&self) -> bool {
        self.verbose_errors
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// A rendered PDF document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pdf(Vec<u8>);
impl Pdf {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl From<Vec<u8>> for Pdf {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}
impl From<Pdf> for Vec<u8> {
    fn from(pdf: Pdf) -> Self {
        pdf.0
    }
}
impl AsRef<[u8]> for Pdf {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::binary::tests::stub;
    use crate::error::ErrorKind;

    #[test]
    fn configure_accepts_known_selectors() {
        let dir = tempfile::tempdir().unwrap();
        let path = stub(dir.path(), "renderer", "exec cat");
        let renderer = Renderer::new(BinaryTable::from_entries([("dev", &path), ("live", &path)]).unwrap());
        for selector in ["dev", "live", "LIVE"] {
            let options = renderer.configure(selector, true).unwrap();
            assert!(options.verbose_errors());
            assert_eq!(options.timeout(), None);
        }
    }

    #[test]
    fn configure_rejects_unknown_selectors() {
        let dir = tempfile::tempdir().unwrap();
        // Any spawn would leave a marker behind.
        let marker = dir.path().join("spawned");
        let path = stub(dir.path(), "renderer", &format!("touch {}", marker.display()));
        let renderer = Renderer::new(BinaryTable::new().with("live", path).unwrap());
        for selector in ["dev", "", "i386"] {
            let err = renderer.configure(selector, false).unwrap_err();
            assert!(matches!(&*err, ErrorKind::InvalidSelector(_)));
        }
        assert!(!marker.exists());
    }

    #[test]
    fn options_timeout_override() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(BinaryTable::new().with("live", stub(dir.path(), "r", "exit 0")).unwrap())
            .with_timeout(Duration::from_secs(5));
        assert_eq!(renderer.timeout(), Duration::from_secs(5));
        let options = renderer.configure("live", false).unwrap().with_timeout(Duration::from_millis(10));
        assert_eq!(options.timeout(), Some(Duration::from_millis(10)));
    }
}
