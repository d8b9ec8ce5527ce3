use crate::check::group_entries;
use crate::expand::{EntryKind, FlatManifest};
use crate::CoreError;
use pinfile_schema::{Resolution, ResolvedPin};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Which pin wins when the same package is pinned to different versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precedence {
    /// Refuse to resolve a conflict.
    #[default]
    Strict,
    /// The pin read first (in include-expanded order) wins.
    FirstWins,
    /// The pin read last wins.
    LastWins,
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::FirstWins => f.write_str("first-wins"),
            Self::LastWins => f.write_str("last-wins"),
        }
    }
}

impl FromStr for Precedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "first-wins" => Ok(Self::FirstWins),
            "last-wins" => Ok(Self::LastWins),
            other => Err(format!(
                "unknown precedence '{other}' (expected: strict, first-wins, last-wins)"
            )),
        }
    }
}

/// Pick one effective pin per required package.
///
/// Only packages named by at least one requirement are resolved; constraints
/// fill in (or compete for) their version. Paths in the result are shown
/// relative to the root manifest's directory where possible.
pub fn resolve(flat: &FlatManifest, precedence: Precedence) -> Result<Resolution, CoreError> {
    let mut pins = Vec::new();

    for group in group_entries(flat) {
        if !group.is_required() {
            continue;
        }

        let pinned: Vec<&str> = group
            .pinning()
            .into_iter()
            .filter_map(|e| e.requirement.version.as_deref())
            .collect();

        let mut distinct = pinned.clone();
        distinct.sort_unstable();
        distinct.dedup();

        let name = group.name.clone();
        let version = match (distinct.len(), precedence) {
            (0, _) => None,
            (1, _) => Some(distinct[0].to_owned()),
            (_, Precedence::Strict) => {
                return Err(CoreError::Conflict {
                    name,
                    versions: distinct.iter().map(|v| (*v).to_owned()).collect(),
                });
            }
            (_, Precedence::FirstWins) => pinned.first().map(|v| (*v).to_owned()),
            (_, Precedence::LastWins) => pinned.last().map(|v| (*v).to_owned()),
        };
        if distinct.len() > 1 {
            warn!(
                "'{name}' pinned to {} versions, {precedence} picked {}",
                distinct.len(),
                version.as_deref().unwrap_or("none")
            );
        }

        let mut extras: Vec<String> = group
            .own()
            .filter(|e| e.kind == EntryKind::Requirement)
            .flat_map(|e| e.requirement.extras.iter().map(|x| x.to_ascii_lowercase()))
            .collect();
        extras.sort();
        extras.dedup();

        pins.push(ResolvedPin {
            name,
            version,
            extras,
            marker: group.marker,
        });
    }
    pins.sort();

    let base = flat
        .files
        .first()
        .and_then(|f| f.parent())
        .unwrap_or(Path::new(""));
    let files = flat
        .files
        .iter()
        .map(|f| f.strip_prefix(base).unwrap_or(f).display().to_string())
        .collect();

    Ok(Resolution {
        root: flat.root.display().to_string(),
        files,
        pins,
    })
}
