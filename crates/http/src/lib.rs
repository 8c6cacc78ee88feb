//! HTTP responses on top of [`pdfpipe_render`].
//!
//! Rendering itself knows nothing about HTTP. This crate turns its outcome
//! into an [`http::Response`]: the PDF served inline with cache-busting
//! headers, or an HTML error page whose detail depends on verbosity. The
//! response can be handed to any `http`-based server or written out in CGI
//! form with [`write_cgi`].

mod cgi;
pub mod error;
mod headers;
mod page;

pub use crate::cgi::write_cgi;
use crate::error::{Error, ErrorKind, Result};
pub use crate::headers::{filename, pdf_response, pdf_response_at};
pub use crate::page::{error_response, escape, html_response};
use http::Response;
use pdfpipe_render::{RenderOptions, Renderer};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use tracing::instrument;

/// What to send back for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Render the HTML and serve the PDF.
    #[default]
    Pdf,
    /// Serve the HTML as-is; the renderer is never started.
    Html,
}
impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
        }
    }
}
impl Display for OutputMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
impl FromStr for OutputMode {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "html" => Ok(Self::Html),
            other => exn::bail!(ErrorKind::UnsupportedMode(other.to_string())),
        }
    }
}

/// Renders `html` and wraps the outcome in a response.
///
/// Render failures become error pages rather than errors; `Err` is only
/// returned when the response itself cannot be built.
#[instrument(skip_all, fields(mode = %mode, document = name))]
pub async fn respond(
    renderer: &Renderer,
    html: impl AsRef<[u8]>,
    options: &RenderOptions,
    name: &str,
    mode: OutputMode,
) -> Result<Response<Vec<u8>>> {
    if mode == OutputMode::Html {
        return html_response(html.as_ref());
    }
    match renderer.render(html, options).await {
        Ok(pdf) => pdf_response(pdf, name),
        Err(err) => {
            tracing::warn!(error = ?err, infrastructure = err.is_infrastructure(), "Serving render error page");
            error_response(&err, options.verbose_errors())
        }
    }
}
