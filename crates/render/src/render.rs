use crate::error::{ErrorKind, GENERIC_MESSAGE, Result};
use crate::{Pdf, RenderOptions, Renderer};
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};
use tracing::instrument;

/// Quiet mode, read HTML from stdin, write the PDF to stdout.
const ARGS: [&str; 3] = ["--quiet", "-", "-"];

/// Everything a renderer process produced, before classification.
#[derive(Debug)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
}

impl Renderer {
    /// Renders `html` with the binary named by `options`.
    ///
    /// Diagnostics on stderr win over anything on stdout and become
    /// [`ErrorKind::RenderFailed`]. An empty stdout with a failing exit status
    /// is [`ErrorKind::ProcessFailed`]. Anything else is the PDF.
    #[instrument(skip_all, fields(selector = %options.selector(), html_size = html.as_ref().len()))]
    pub async fn render(&self, html: impl AsRef<[u8]>, options: &RenderOptions) -> Result<Pdf> {
        let pdf = self.capture(html, options).await?.classify(options.verbose_errors())?;
        tracing::debug!(pdf_size = pdf.len(), "PDF rendered");
        Ok(pdf)
    }

    /// Runs the renderer and collects both output streams in full.
    ///
    /// Stdin is fed while stdout and stderr are drained, so a child that
    /// fills one pipe before reading its input (or before touching the other
    /// pipe) cannot deadlock the call. The child is killed if the timeout
    /// expires or if the returned future is dropped.
    pub async fn capture(&self, html: impl AsRef<[u8]>, options: &RenderOptions) -> Result<Captured> {
        let binary = self.binaries.path(options.selector())?;
        let limit = options.timeout().unwrap_or(self.timeout);
        let mut child = command(binary).spawn().or_raise(|| ErrorKind::SpawnFailed(binary.to_path_buf()))?;
        tracing::debug!(pid = child.id(), binary = %binary.display(), "Renderer spawned");

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let exchange = async {
            let (written, read_out, read_err) =
                tokio::join!(feed(stdin, html.as_ref()), drain(stdout, &mut out), drain(stderr, &mut err));
            (written, read_out, read_err, child.wait().await)
        };
        let outcome = tokio::time::timeout(limit, exchange).await;
        let Ok((written, read_out, read_err, status)) = outcome else {
            tracing::warn!(timeout = ?limit, "Renderer timed out; killing it");
            // Kill and reap, so the process never outlives the call.
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill renderer");
            }
            exn::bail!(ErrorKind::Timeout(limit));
        };
        let status = status.or_raise(|| ErrorKind::Io)?;
        tracing::debug!(%status, stdout_size = out.len(), stderr_size = err.len(), "Renderer exited");

        let written = match written {
            // The child may legitimately exit without consuming its input.
            Err(e) if e.kind() == IoErrorKind::BrokenPipe => {
                tracing::debug!("Renderer closed stdin before reading all input");
                Ok(())
            }
            other => other,
        };
        if let Err(e) = written.and(read_out).and(read_err) {
            tracing::warn!(error = %e, "Renderer pipe failed");
            return Err(e).or_raise(|| ErrorKind::ProcessFailed {
                exit_code: status.code().unwrap_or(-1),
                diagnostic: String::from_utf8_lossy(&err).into_owned(),
            });
        }
        Ok(Captured { stdout: out, stderr: err, status })
    }
}

impl Captured {
    /// Decides between success and failure. `verbose_errors` controls whether
    /// stderr text is returned verbatim or replaced by [`GENERIC_MESSAGE`];
    /// it is logged either way.
    pub fn classify(self, verbose_errors: bool) -> Result<Pdf> {
        if !self.stderr.is_empty() {
            let diagnostic = String::from_utf8_lossy(&self.stderr);
            tracing::warn!(status = %self.status, diagnostic = %diagnostic, "Renderer reported an error");
            let message = if verbose_errors { diagnostic.into_owned() } else { GENERIC_MESSAGE.to_string() };
            exn::bail!(ErrorKind::RenderFailed(message));
        }
        if self.stdout.is_empty() && !self.status.success() {
            exn::bail!(ErrorKind::ProcessFailed {
                exit_code: self.status.code().unwrap_or(-1),
                diagnostic: format!("renderer produced no output ({})", self.status),
            });
        }
        Ok(Pdf::from(self.stdout))
    }
}

fn command(binary: &Path) -> Command {
    let mut command = Command::new(binary);
    command
        .args(ARGS)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

/// Writes the whole payload, then closes stdin so the child sees EOF.
async fn feed(stdin: Option<ChildStdin>, html: &[u8]) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    stdin.write_all(html).await?;
    stdin.flush().await
}

/// Reads a pipe to EOF. Bytes read before a failure stay in `buffer`.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>, buffer: &mut Vec<u8>) -> std::io::Result<()> {
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(buffer).await?;
    }
    Ok(())
}
