//! Parsing, rendering, lock files, and fingerprints for pinned requirements manifests.
//!
//! This crate defines the schema layer: the line-oriented manifest format
//! (`Manifest`, `parse_manifest_str`), its canonical rendering, the normalized
//! tuple view used for equivalence checks (`NormalizedManifest`), deterministic
//! fingerprinting of a resolved pin set (`compute_fingerprint`), and lock file
//! generation/verification (`LockFile`).

pub mod identity;
pub mod lock;
pub mod manifest;
pub mod normalize;
pub mod requirement;
pub mod types;

pub use identity::{compute_fingerprint, PinIdentity};
pub use lock::{LockError, LockFile, Resolution, ResolvedPin};
pub use manifest::{
    parse_manifest_file, parse_manifest_str, Include, IncludeKind, Manifest, ManifestError,
    ManifestLine, Spanned,
};
pub use normalize::{NormalizedInclude, NormalizedManifest, NormalizedRequirement};
pub use requirement::{canonical_marker, Requirement};
pub use types::{Fingerprint, PackageName, ShortFingerprint};
