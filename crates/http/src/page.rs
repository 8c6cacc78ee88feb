//! HTML bodies for renderer errors and for passthrough mode.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use http::{Response, StatusCode};
use pdfpipe_render::error::{ErrorKind as RenderErrorKind, GENERIC_MESSAGE};

const HTML: &str = "text/html; charset=utf-8";
const DIAGNOSTIC_HEADING: &str = "PDF GENERATOR ERROR:<br />";

/// Builds the error page for a failed render.
///
/// Only document failures reported by the renderer are ever echoed, and only
/// when `verbose_errors` is set. Everything else (spawn failures, timeouts,
/// bad selectors) gets the generic message.
pub fn error_response(error: &RenderErrorKind, verbose_errors: bool) -> Result<Response<Vec<u8>>> {
    let status = match error {
        RenderErrorKind::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    html_page(status, error_body(error, verbose_errors))
}

/// Serves the HTML payload untouched, for checking markup without the renderer.
pub fn html_response(html: impl Into<Vec<u8>>) -> Result<Response<Vec<u8>>> {
    html_page(StatusCode::OK, html.into())
}

fn html_page(status: StatusCode, body: Vec<u8>) -> Result<Response<Vec<u8>>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HTML)
        .header(CACHE_CONTROL, "no-store")
        .body(body)
        .or_raise(|| ErrorKind::Response)
}

fn error_body(error: &RenderErrorKind, verbose_errors: bool) -> Vec<u8> {
    match error {
        RenderErrorKind::RenderFailed(diagnostic) if verbose_errors => {
            format!("{DIAGNOSTIC_HEADING}{}", line_breaks(&escape(diagnostic))).into_bytes()
        }
        _ => GENERIC_MESSAGE.as_bytes().to_vec(),
    }
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Inserts `<br />` before every line break (`\r\n`, `\n` or `\r`), keeping the break itself.
fn line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push_str("<br />\r\n");
            }
            '\r' | '\n' => {
                out.push_str("<br />");
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}
