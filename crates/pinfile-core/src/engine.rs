use crate::check::{check, CheckReport};
use crate::config::ProjectConfig;
use crate::expand::{Expander, FlatManifest};
use crate::resolve::resolve;
use crate::source::{FsSource, ManifestSource};
use crate::CoreError;
use pinfile_schema::{parse_manifest_str, LockFile, Manifest, PinIdentity, Resolution};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Central entry point for reading, checking and locking manifests.
///
/// Holds the project configuration and the source manifests are read from.
/// Every operation takes the manifest path explicitly; callers fall back to
/// [`Engine::default_root`] when the user did not name one.
pub struct Engine {
    config: ProjectConfig,
    source: Box<dyn ManifestSource>,
}

/// Outcome of canonically formatting a single manifest.
#[derive(Debug, Serialize)]
pub struct FormatResult {
    pub path: PathBuf,
    #[serde(skip)]
    pub original: String,
    #[serde(skip)]
    pub formatted: String,
    pub changed: bool,
}

impl Engine {
    /// Create an engine reading manifests from the filesystem.
    pub fn new(config: ProjectConfig) -> Self {
        Self::with_source(config, FsSource)
    }

    pub fn with_source(config: ProjectConfig, source: impl ManifestSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn default_root(&self) -> &Path {
        &self.config.root
    }

    fn read(&self, path: &Path) -> Result<String, CoreError> {
        self.source.read(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a single manifest without following its includes.
    pub fn parse(&self, path: &Path) -> Result<Manifest, CoreError> {
        debug!("parsing {}", path.display());
        let text = self.read(path)?;
        parse_manifest_str(&text).map_err(|source| CoreError::Manifest {
            file: path.to_path_buf(),
            source,
        })
    }

    /// Render a manifest canonically.
    ///
    /// Fails if the rendered text would not parse back to the same entries
    /// and includes, so a formatter bug can never change what gets installed.
    pub fn format(&self, path: &Path) -> Result<FormatResult, CoreError> {
        let original = self.read(path)?;
        let manifest = parse_manifest_str(&original).map_err(|source| CoreError::Manifest {
            file: path.to_path_buf(),
            source,
        })?;
        let formatted = manifest.render();

        let reparsed = parse_manifest_str(&formatted).map_err(|source| CoreError::Manifest {
            file: path.to_path_buf(),
            source,
        })?;
        if reparsed.normalize() != manifest.normalize() {
            return Err(CoreError::FormatChangedSemantics {
                path: path.to_path_buf(),
            });
        }

        let changed = formatted != original;
        debug!("formatted {} (changed={changed})", path.display());
        Ok(FormatResult {
            path: path.to_path_buf(),
            original,
            formatted,
            changed,
        })
    }

    /// Expand every `-c`/`-r` include reachable from `root`.
    pub fn expand(&self, root: &Path) -> Result<FlatManifest, CoreError> {
        info!("expanding {}", root.display());
        Expander::new(self.source.as_ref(), self.config.max_depth).expand(root)
    }

    /// Expand `root` and check the result for conflicting or duplicate pins.
    pub fn check(&self, root: &Path) -> Result<CheckReport, CoreError> {
        let flat = self.expand(root)?;
        let report = check(&flat);
        for conflict in &report.conflicts {
            warn!(
                "conflicting pins for '{}' across {} sites",
                conflict.name,
                conflict.sites.len()
            );
        }
        info!(
            "checked {}: {} conflicts, {} duplicates, {} unpinned",
            root.display(),
            report.conflicts.len(),
            report.duplicates.len(),
            report.unpinned.len()
        );
        Ok(report)
    }

    /// Expand `root` and pick one pin per package under the configured precedence.
    pub fn resolve(&self, root: &Path) -> Result<Resolution, CoreError> {
        let flat = self.expand(root)?;
        resolve(&flat, self.config.precedence)
    }

    /// Resolve `root` and write the result to `lock_path` (or the configured lock file).
    pub fn lock(&self, root: &Path, lock_path: Option<&Path>) -> Result<LockFile, CoreError> {
        let resolution = self.resolve(root)?;
        let lock = LockFile::from_resolution(&resolution);
        let dest = lock_path.unwrap_or(self.config.lock_file.as_path());
        lock.write_to_file(dest)?;
        info!(
            "locked {} pins from {} into {} ({})",
            lock.pins.len(),
            root.display(),
            dest.display(),
            lock.short_fingerprint
        );
        Ok(lock)
    }

    /// Check a lock file's integrity and that `root` still resolves to its pins.
    pub fn verify_lock(&self, root: &Path, lock_path: Option<&Path>) -> Result<PinIdentity, CoreError> {
        let src = lock_path.unwrap_or(self.config.lock_file.as_path());
        let lock = LockFile::read_from_file(src)?;
        let identity = lock.verify_integrity()?;
        let resolution = self.resolve(root)?;
        lock.verify_resolution(&resolution)?;
        info!("{} matches {} ({})", src.display(), root.display(), identity.short);
        Ok(identity)
    }
}
