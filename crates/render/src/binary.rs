use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Name of a renderer binary variant, e.g. `live`, `dev` or `x86_64`.
///
/// Selectors compare case-insensitively; they are stored trimmed and lowercased.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector(String);
impl Selector {
    fn normalize(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            exn::bail!(ErrorKind::InvalidSelector(name.to_string()));
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Read-only mapping from [`Selector`] to the absolute path of a renderer executable.
///
/// Every path is checked when it is added: it must exist, be a regular file
/// and (on Unix) carry an execute bit. Bare program names such as
/// `wkhtmltopdf` are looked up in `PATH` first. Once built, a table is meant
/// to be shared (see [`Renderer::new`](crate::Renderer::new)) and never mutated.
///
/// # Example
///
/// ```no_run
/// use pdfpipe_render::BinaryTable;
/// # use pdfpipe_render::error::Result;
///
/// # fn get_binaries() -> Result<BinaryTable> {
/// let binaries = BinaryTable::new()
///     .with("dev", "/opt/wkhtmltopdf/bin/dev-wkhtmltopdf")?
///     .with("live", "/opt/wkhtmltopdf/bin/wkhtmltopdf")?;
/// # Ok(binaries)
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct BinaryTable {
    binaries: BTreeMap<Selector, PathBuf>,
}
impl BinaryTable {
    /// Selector registered by [`discover()`](Self::discover).
    pub const DISCOVERED: &'static str = "default";

    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(selector, path)` pairs, validating each entry.
    pub fn from_entries<S, P>(entries: impl IntoIterator<Item = (S, P)>) -> Result<Self>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        entries.into_iter().try_fold(Self::new(), |table, (selector, path)| table.with(selector, path))
    }

    /// Registers an executable under `selector`, replacing any previous entry.
    ///
    /// Returns [`ErrorKind::InvalidBinary`] if the path cannot be executed, so
    /// that deployment mistakes surface at startup rather than on first render.
    pub fn with(mut self, selector: impl AsRef<str>, path: impl AsRef<Path>) -> Result<Self> {
        let selector = Selector::normalize(selector)?;
        let path = resolve_executable(path.as_ref())?;
        tracing::debug!(%selector, binary = %path.display(), "Registered renderer binary");
        self.binaries.insert(selector, path);
        Ok(self)
    }

    /// Searches `PATH` for `wkhtmltopdf` and registers it as [`DISCOVERED`](Self::DISCOVERED).
    pub fn discover() -> Result<Self> {
        let executables = ["wkhtmltopdf"];
        for exe in executables {
            if let Ok(path) = which::which(exe) {
                tracing::info!(binary = %path.display(), "Discovered renderer binary in PATH");
                return Self::new().with(Self::DISCOVERED, path);
            }
        }
        tracing::info!("Renderer executable not found in PATH");
        exn::bail!(ErrorKind::BinaryNotFound);
    }

    /// Validates a selector name against the table.
    pub fn lookup(&self, selector: impl AsRef<str>) -> Result<Selector> {
        let name = selector.as_ref();
        let selector = Selector::normalize(name)?;
        if !self.binaries.contains_key(&selector) {
            exn::bail!(ErrorKind::InvalidSelector(name.to_string()));
        }
        Ok(selector)
    }

    pub fn contains(&self, selector: impl AsRef<str>) -> bool {
        self.lookup(selector).is_ok()
    }

    pub(crate) fn path(&self, selector: &Selector) -> Result<&Path> {
        self.binaries
            .get(selector)
            .map(PathBuf::as_path)
            .ok_or_raise(|| ErrorKind::InvalidSelector(selector.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Selector, &Path)> {
        self.binaries.iter().map(|(selector, path)| (selector, path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.binaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binaries.is_empty()
    }
}

fn resolve_executable(path: &Path) -> Result<PathBuf> {
    let is_bare_name = !path.is_absolute() && path.components().count() == 1;
    let path = if is_bare_name {
        which::which(path).or_raise(|| ErrorKind::InvalidBinary(path.to_path_buf()))?
    } else {
        std::path::absolute(path).or_raise(|| ErrorKind::InvalidBinary(path.to_path_buf()))?
    };
    if !is_executable(&path) {
        exn::bail!(ErrorKind::InvalidBinary(path));
    }
    Ok(path)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
