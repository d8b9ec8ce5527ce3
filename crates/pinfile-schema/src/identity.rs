use crate::lock::ResolvedPin;
use crate::types::{Fingerprint, ShortFingerprint};
use serde::Serialize;

/// Deterministic identity of a resolved pin set.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PinIdentity {
    pub fingerprint: Fingerprint,
    pub short: ShortFingerprint,
}

/// Hash a pin set into a stable fingerprint.
///
/// Pins are hashed in sorted order, so the result does not depend on the
/// order entries were listed in, which file they came from, or comments.
/// Names are expected in canonical form (see [`crate::PackageName::canonical`]).
pub fn compute_fingerprint(pins: &[ResolvedPin]) -> PinIdentity {
    let mut sorted: Vec<&ResolvedPin> = pins.iter().collect();
    sorted.sort();

    let mut hasher = blake3::Hasher::new();
    for pin in sorted {
        hash_field(&mut hasher, b"pin", &pin.name);
        if let Some(version) = &pin.version {
            hash_field(&mut hasher, b"version", version);
        }
        for extra in &pin.extras {
            hash_field(&mut hasher, b"extra", extra);
        }
        if let Some(marker) = &pin.marker {
            hash_field(&mut hasher, b"marker", marker);
        }
        hasher.update(b"end\0");
    }

    let hex = hasher.finalize().to_hex().to_string();
    let short = hex[..12].to_owned();

    PinIdentity {
        fingerprint: Fingerprint::new(hex),
        short: ShortFingerprint::new(short),
    }
}

/// Tag and length-prefix a field so no two pin sets share a byte stream.
fn hash_field(hasher: &mut blake3::Hasher, tag: &[u8], value: &str) {
    hasher.update(tag);
    hasher.update(b"\0");
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
