use http::Response;
use std::io::Write;

/// Writes `response` in CGI form: a `Status` line, the headers, a blank line
/// and then the body.
pub fn write_cgi(response: &Response<Vec<u8>>, w: &mut impl Write) -> std::io::Result<()> {
    let status = response.status();
    write!(w, "Status: {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or_default())?;
    for (name, value) in response.headers() {
        w.write_all(name.as_str().as_bytes())?;
        w.write_all(b": ")?;
        w.write_all(value.as_bytes())?;
        w.write_all(b"\r\n")?;
    }
    w.write_all(b"\r\n")?;
    w.write_all(response.body())?;
    w.flush()
}
