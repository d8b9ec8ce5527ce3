use crate::manifest::{IncludeKind, Manifest};
use serde::{Deserialize, Serialize};

/// The semantic content of a manifest, with formatting and comments stripped.
///
/// Two manifests that differ only in whitespace, comments, blank lines, option
/// spelling (`--requirement` vs `-r`) or extras order normalize to the same value.
/// Entry order is kept: the installer reads entries in file order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedManifest {
    pub includes: Vec<NormalizedInclude>,
    pub requirements: Vec<NormalizedRequirement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedInclude {
    pub kind: IncludeKind,
    pub target: String,
}

/// A `(name, version-or-none)` entry keyed by canonical name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedRequirement {
    pub name: String,
    pub version: Option<String>,
    pub extras: Vec<String>,
    pub marker: Option<String>,
}

impl Manifest {
    /// Reduce the manifest to its `(kind, target)` and `(name, version)` tuples.
    pub fn normalize(&self) -> NormalizedManifest {
        let includes = self
            .includes()
            .map(|(_, include)| NormalizedInclude {
                kind: include.kind,
                target: include.target.clone(),
            })
            .collect();

        let requirements = self
            .requirements()
            .map(|(_, req)| {
                let mut extras: Vec<String> =
                    req.extras.iter().map(|e| e.to_ascii_lowercase()).collect();
                extras.sort();
                extras.dedup();
                NormalizedRequirement {
                    name: req.name.canonical(),
                    version: req.version.clone(),
                    extras,
                    marker: req.marker_key(),
                }
            })
            .collect();

        NormalizedManifest {
            includes,
            requirements,
        }
    }
}

impl NormalizedManifest {
    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
