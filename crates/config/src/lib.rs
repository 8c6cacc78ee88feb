//! Configuration for pdfpipe.
//!
//! Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults,
//! 2. a config file (`pdfpipe.toml`, `.yaml`/`.yml` or `.json`), either given
//!    explicitly or found in the platform config directory,
//! 3. environment variables prefixed with `PDFPIPE_`, nested with `__`
//!    (e.g. `PDFPIPE_BINARIES__LIVE=/opt/bin/wkhtmltopdf`).
//!
//! ```toml
//! default_selector = "live"
//! verbose_errors = false
//! timeout_secs = 60
//!
//! [binaries]
//! dev = "/opt/wkhtmltopdf/bin/dev-wkhtmltopdf"
//! live = "/opt/wkhtmltopdf/bin/wkhtmltopdf"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use pdfpipe_render::{BinaryTable, Renderer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "PDFPIPE_";
const FILE_STEM: &str = "pdfpipe";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selector used when a request does not name one.
    pub default_selector: Option<String>,
    /// Pass renderer diagnostics through to callers.
    pub verbose_errors: bool,
    pub timeout_secs: u64,
    /// Selector name to executable path. Empty means "look for wkhtmltopdf in `PATH`".
    pub binaries: BTreeMap<String, PathBuf>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            default_selector: None,
            verbose_errors: false,
            timeout_secs: Renderer::DEFAULT_TIMEOUT.as_secs(),
            binaries: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from all sources.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path(),
        };
        let config = Self::from_figment(Self::figment(path.as_deref()))?;
        tracing::debug!(file = ?path, binaries = config.binaries.len(), "Configuration loaded");
        Ok(config)
    }

    /// The merged sources, before extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|e| e.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("timeout_secs must be greater than zero".to_string()));
        }
        if let Some(selector) = &self.default_selector
            && !self.binaries.is_empty()
            && !self.binaries.keys().any(|k| k.trim().eq_ignore_ascii_case(selector.trim()))
        {
            exn::bail!(ErrorKind::Invalid(format!("default_selector `{selector}` is not listed in binaries")));
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Builds the validated binary table, checking that every configured
    /// path is executable. With no binaries configured, falls back to
    /// searching `PATH`.
    pub fn binary_table(&self) -> Result<BinaryTable> {
        let table = if self.binaries.is_empty() {
            tracing::info!("No renderer binaries configured; searching PATH");
            BinaryTable::discover()
        } else {
            BinaryTable::from_entries(&self.binaries)
        };
        table.or_raise(|| ErrorKind::Binaries)
    }

    /// Builds a [`Renderer`] with the configured binaries and timeout.
    pub fn renderer(&self) -> Result<Renderer> {
        Ok(Renderer::new(self.binary_table()?).with_timeout(self.timeout()))
    }

    /// Picks the selector for a request: the requested one, else the
    /// configured default, else the host CPU architecture if the table has
    /// an entry for it, else [`BinaryTable::DISCOVERED`].
    pub fn selector<'a>(&'a self, requested: Option<&'a str>, table: &BinaryTable) -> &'a str {
        requested
            .or(self.default_selector.as_deref())
            .or_else(|| table.contains(std::env::consts::ARCH).then_some(std::env::consts::ARCH))
            .unwrap_or(BinaryTable::DISCOVERED)
    }
}

/// First existing `pdfpipe.{toml,yaml,yml,json}` in the platform config directory.
pub fn default_path() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", FILE_STEM)?;
    ["toml", "yaml", "yml", "json"]
        .into_iter()
        .map(|ext| dirs.config_dir().join(format!("{FILE_STEM}.{ext}")))
        .find(|path| path.exists())
}
