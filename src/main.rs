mod cli;
mod error;

use crate::cli::{Cli, Commands, RenderArgs};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use pdfpipe_config::Config;
use pdfpipe_http::{OutputMode, html_response, respond, write_cgi};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "pdfpipe failed");
            eprintln!("pdfpipe: {}", *e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Commands::Render(args) => render(&config, args).await,
        Commands::Selectors => selectors(&config),
    }
}

/// Logs go to stderr so that stdout only ever carries the document.
fn init_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn render(config: &Config, args: RenderArgs) -> Result<()> {
    let html = read_input(&args.input).await?;
    if args.mode == OutputMode::Html {
        let body = if args.cgi {
            cgi_bytes(&html_response(html).or_raise(|| ErrorKind::Response)?)?
        } else {
            html
        };
        return write_output(&args.output, &body).await;
    }

    let renderer = config.renderer().or_raise(|| ErrorKind::Config)?;
    let selector = config.selector(args.selector.as_deref(), renderer.binaries());
    let verbose_errors = args.verbose_errors || config.verbose_errors;
    let mut options = renderer.configure(selector, verbose_errors).or_raise(|| ErrorKind::Config)?;
    if let Some(secs) = args.timeout {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    if args.cgi {
        let response =
            respond(&renderer, &html, &options, &args.name, args.mode).await.or_raise(|| ErrorKind::Response)?;
        write_output(&args.output, &cgi_bytes(&response)?).await?;
        if !response.status().is_success() {
            // The error page is the response; the exit status still reports the failure.
            tracing::warn!(status = %response.status(), "Wrote CGI error response");
            exn::bail!(ErrorKind::Render);
        }
        return Ok(());
    }
    let pdf = renderer.render(&html, &options).await.or_raise(|| ErrorKind::Render)?;
    tracing::info!(size = pdf.len(), output = %args.output.display(), "PDF written");
    write_output(&args.output, pdf.as_bytes()).await
}

fn selectors(config: &Config) -> Result<()> {
    let table = config.binary_table().or_raise(|| ErrorKind::Config)?;
    for (selector, path) in table.iter() {
        let is_default = config.default_selector.as_deref().is_some_and(|d| d.eq_ignore_ascii_case(selector.as_str()));
        let marker = if is_default { " (default)" } else { "" };
        println!("{selector}\t{}{marker}", path.display());
    }
    Ok(())
}

fn cgi_bytes(response: &http::Response<Vec<u8>>) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(response.body().len() + 512);
    write_cgi(response, &mut out).or_raise(|| ErrorKind::Io)?;
    Ok(out)
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    if is_stdio(path) {
        let mut html = Vec::new();
        tokio::io::stdin().read_to_end(&mut html).await.or_raise(|| ErrorKind::Io)?;
        return Ok(html);
    }
    tokio::fs::read(path).await.or_raise(|| ErrorKind::Io)
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if is_stdio(path) {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(bytes).await.or_raise(|| ErrorKind::Io)?;
        return stdout.flush().await.or_raise(|| ErrorKind::Io);
    }
    tokio::fs::write(path, bytes).await.or_raise(|| ErrorKind::Io)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pdfpipe_render::error::GENERIC_MESSAGE;
    use std::collections::BTreeMap;
    use std::os::unix::fs::PermissionsExt;

    fn config_for(dir: &Path, body: &str) -> Config {
        let path = dir.join("renderer");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        Config { binaries: BTreeMap::from([("live".to_string(), path)]), ..Config::default() }
    }

    fn cgi_args(dir: &Path) -> RenderArgs {
        let input = dir.join("in.html");
        std::fs::write(&input, "<p>x</p>").unwrap();
        let output = dir.join("out.cgi");
        let (output, input) = (output.to_str().unwrap(), input.to_str().unwrap());
        let argv = ["pdfpipe", "render", "--selector", "live", "--cgi", "-o", output, input];
        let Commands::Render(args) = Cli::try_parse_from(argv).unwrap().command else { panic!("expected render") };
        args
    }

    #[tokio::test]
    async fn cgi_error_page_is_written_and_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), "printf boom >&2\nexit 1");
        let err = render(&config, cgi_args(dir.path())).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Render);
        let written = std::fs::read_to_string(dir.path().join("out.cgi")).unwrap();
        assert!(written.starts_with("Status: 500 Internal Server Error\r\n"));
        assert!(written.ends_with(GENERIC_MESSAGE));
    }

    #[tokio::test]
    async fn cgi_pdf_response_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), "exec cat");
        render(&config, cgi_args(dir.path())).await.unwrap();
        let written = std::fs::read_to_string(dir.path().join("out.cgi")).unwrap();
        assert!(written.starts_with("Status: 200 OK\r\n"));
        assert!(written.ends_with("\r\n\r\n<p>x</p>"));
    }
}
