//! Command-line surface for `pdfpipe`.

use clap::{ArgAction, Parser, Subcommand};
use pdfpipe_http::OutputMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfpipe", version, about = "Render HTML to PDF through an external renderer binary", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PDFPIPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render an HTML document
    Render(RenderArgs),
    /// List configured renderer binaries
    Selectors,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// HTML input file, `-` for stdin
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = "-")]
    pub output: PathBuf,

    /// Which renderer binary to use (e.g. `live`, `dev`, `x86_64`)
    #[arg(short, long)]
    pub selector: Option<String>,

    /// Document name used for the `Content-Disposition` file name
    #[arg(short, long, default_value = "document")]
    pub name: String,

    /// Show renderer diagnostics instead of a generic message
    #[arg(long)]
    pub verbose_errors: bool,

    /// Give up (and kill the renderer) after this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// `pdf` renders; `html` passes the input through untouched
    #[arg(long, default_value = "pdf", value_parser = parse_mode)]
    pub mode: OutputMode,

    /// Write a CGI response (status, headers, body) instead of the raw document
    #[arg(long)]
    pub cgi: bool,
}

fn parse_mode(s: &str) -> Result<OutputMode, String> {
    s.parse::<OutputMode>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_defaults() {
        let cli = Cli::try_parse_from(["pdfpipe", "render"]).unwrap();
        let Commands::Render(args) = cli.command else { panic!("expected render") };
        assert_eq!(args.input, PathBuf::from("-"));
        assert_eq!(args.output, PathBuf::from("-"));
        assert_eq!(args.mode, OutputMode::Pdf);
        assert_eq!(args.name, "document");
        assert!(!args.verbose_errors && !args.cgi);
    }

    #[rstest]
    #[case("pdf", OutputMode::Pdf)]
    #[case("HTML", OutputMode::Html)]
    fn render_mode(#[case] mode: &str, #[case] expected: OutputMode) {
        let cli = Cli::try_parse_from(["pdfpipe", "render", "--mode", mode, "in.html"]).unwrap();
        let Commands::Render(args) = cli.command else { panic!("expected render") };
        assert_eq!(args.mode, expected);
        assert_eq!(args.input, PathBuf::from("in.html"));
    }

    #[rstest]
    #[case("0", None)]
    #[case("-5", None)]
    #[case("15", Some(15))]
    fn render_timeout(#[case] timeout: &str, #[case] expected: Option<u64>) {
        let parsed = Cli::try_parse_from(["pdfpipe", "render", "--timeout", timeout]);
        match expected {
            Some(secs) => {
                let Commands::Render(args) = parsed.unwrap().command else { panic!("expected render") };
                assert_eq!(args.timeout, Some(secs));
            }
            None => assert!(parsed.is_err()),
        }
    }

    #[test]
    fn render_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["pdfpipe", "render", "--mode", "docx"]).is_err());
    }
}
