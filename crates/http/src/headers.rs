use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, LAST_MODIFIED, PRAGMA,
};
use http::{Response, StatusCode};
use pdfpipe_render::Pdf;
use rslug::slugify;
use time::UtcDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// IMF-fixdate, as used by HTTP date headers.
const HTTP_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");
/// A date in the past, so that intermediaries never consider the document fresh.
const EXPIRED: &str = "Sat, 26 Jul 1997 05:00:00 GMT";
const FALLBACK_NAME: &str = "document";

/// Builds the inline PDF response, stamped with the current time.
pub fn pdf_response(pdf: Pdf, name: &str) -> Result<Response<Vec<u8>>> {
    pdf_response_at(pdf, name, UtcDateTime::now())
}

/// Builds the inline PDF response with an explicit `Last-Modified` time.
pub fn pdf_response_at(pdf: Pdf, name: &str, modified: UtcDateTime) -> Result<Response<Vec<u8>>> {
    let last_modified = http_date(modified)?;
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/pdf")
        .header(CACHE_CONTROL, "public, must-revalidate, max-age=0")
        .header(PRAGMA, "public")
        .header(EXPIRES, EXPIRED)
        .header(LAST_MODIFIED, last_modified)
        .header(CONTENT_LENGTH, pdf.len())
        .header(CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", filename(name)))
        .body(pdf.into_bytes())
        .or_raise(|| ErrorKind::Response)
}

/// Turns a caller-supplied document name into a safe `*.pdf` file name.
///
/// The name is slugified so it can be quoted in `Content-Disposition`
/// without escaping; a trailing `.pdf` is not doubled and an empty result
/// falls back to `document.pdf`.
pub fn filename(name: &str) -> String {
    let name = name.trim();
    let stem = match name.len().checked_sub(4) {
        Some(split) if name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(".pdf") => &name[..split],
        _ => name,
    };
    let slug = slugify!(stem);
    if slug.is_empty() { format!("{FALLBACK_NAME}.pdf") } else { format!("{slug}.pdf") }
}

pub(crate) fn http_date(at: UtcDateTime) -> Result<String> {
    at.format(HTTP_DATE).or_raise(|| ErrorKind::Header("Last-Modified"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::utc_datetime;

    #[rstest]
    #[case("invoice", "invoice.pdf")]
    #[case("Invoice 2024", "invoice-2024.pdf")]
    #[case("report.PDF", "report.pdf")]
    #[case("../../etc/passwd", "etc-passwd.pdf")]
    #[case("say \"hi\"; rm -rf", "say-hi-rm-rf.pdf")]
    #[case("", "document.pdf")]
    #[case(".pdf", "document.pdf")]
    #[case("   ", "document.pdf")]
    fn filename_sanitized(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(filename(name), expected);
    }

    #[test]
    fn http_date_format() {
        let at = utc_datetime!(2024-03-05 07:08:09);
        assert_eq!(http_date(at).unwrap(), "Tue, 05 Mar 2024 07:08:09 GMT");
    }

    #[test]
    fn pdf_headers() {
        let pdf = Pdf::from(b"%PDF-1.4 test".to_vec());
        let response = pdf_response_at(pdf, "Quarterly Report", utc_datetime!(1999-12-31 23:59:59)).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[CACHE_CONTROL], "public, must-revalidate, max-age=0");
        assert_eq!(headers[PRAGMA], "public");
        assert_eq!(headers[EXPIRES], "Sat, 26 Jul 1997 05:00:00 GMT");
        assert_eq!(headers[LAST_MODIFIED], "Fri, 31 Dec 1999 23:59:59 GMT");
        assert_eq!(headers[CONTENT_LENGTH], "13");
        assert_eq!(headers[CONTENT_DISPOSITION], "inline; filename=\"quarterly-report.pdf\"");
        assert_eq!(response.body(), b"%PDF-1.4 test");
    }
}
