use crate::identity::{compute_fingerprint, PinIdentity};
use crate::manifest::ManifestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("lock file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("lock file parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("lock file serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("unsupported lock_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("lock file fingerprint mismatch: lock has '{lock_id}', recomputed '{computed_id}'")]
    FingerprintMismatch {
        lock_id: String,
        computed_id: String,
    },
    #[error("lock file drift: {0}")]
    Drift(String),
}

pub const LOCK_VERSION: u32 = 1;

/// The effective pin for one canonical package name (and marker).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedPin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
}

impl ResolvedPin {
    fn key(&self) -> (&str, Option<&str>) {
        (self.name.as_str(), self.marker.as_deref())
    }
}

impl fmt::Display for ResolvedPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        if let Some(version) = &self.version {
            write!(f, "=={version}")?;
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

/// Result of flattening a root manifest and picking one pin per package.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resolution {
    /// The root manifest, as given by the caller.
    pub root: String,
    /// Every manifest file that contributed, in expansion order.
    pub files: Vec<String>,
    /// Effective pins, sorted by name.
    pub pins: Vec<ResolvedPin>,
}

/// Captures the resolved pin set of a root manifest.
///
/// The fingerprint is computed from the pins only, so moving entries between
/// included files or reformatting them does not change it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockFile {
    pub lock_version: u32,
    pub fingerprint: String,
    pub short_fingerprint: String,
    pub root: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub pins: Vec<ResolvedPin>,
}

impl LockFile {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let mut pins = resolution.pins.clone();
        pins.sort();

        let identity = compute_fingerprint(&pins);
        LockFile {
            lock_version: LOCK_VERSION,
            fingerprint: identity.fingerprint.into_inner(),
            short_fingerprint: identity.short.into_inner(),
            root: resolution.root.clone(),
            files: resolution.files.clone(),
            pins,
        }
    }

    pub fn compute_identity(&self) -> PinIdentity {
        compute_fingerprint(&self.pins)
    }

    /// Verify that the stored fingerprint matches the stored pins.
    pub fn verify_integrity(&self) -> Result<PinIdentity, LockError> {
        if self.lock_version != LOCK_VERSION {
            return Err(LockError::UnsupportedVersion(self.lock_version));
        }
        let identity = self.compute_identity();
        if self.fingerprint != identity.fingerprint.as_str() {
            return Err(LockError::FingerprintMismatch {
                lock_id: self.fingerprint.clone(),
                computed_id: identity.fingerprint.into_inner(),
            });
        }
        Ok(identity)
    }

    /// Differences between the locked pins and a fresh resolution, one line each.
    pub fn drift(&self, resolution: &Resolution) -> Vec<String> {
        let locked: BTreeMap<_, _> = self.pins.iter().map(|p| (p.key(), p)).collect();
        let fresh: BTreeMap<_, _> = resolution.pins.iter().map(|p| (p.key(), p)).collect();

        let mut out = Vec::new();
        for (key, pin) in &fresh {
            match locked.get(key) {
                None => out.push(format!("'{pin}' is in the manifest but not in the lock file")),
                Some(old) if old != pin => {
                    out.push(format!("'{}' changed: lock has '{old}', manifest has '{pin}'", pin.name));
                }
                Some(_) => {}
            }
        }
        for (key, pin) in &locked {
            if !fresh.contains_key(key) {
                out.push(format!("'{pin}' is in the lock file but no longer in the manifest"));
            }
        }
        out
    }

    /// Check that the manifest still resolves to exactly the locked pins.
    pub fn verify_resolution(&self, resolution: &Resolution) -> Result<(), LockError> {
        let drift = self.drift(resolution);
        if drift.is_empty() {
            Ok(())
        } else {
            Err(LockError::Drift(format!(
                "{}. Run 'pinfile lock' to update.",
                drift.join("; ")
            )))
        }
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LockError::Io(e.error))?;
        // Fsync parent directory to ensure rename durability on power loss.
        if let Ok(f) = fs::File::open(dir) {
            let _ = f.sync_all();
        }
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
