use crate::manifest::ManifestError;
use crate::types::PackageName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single dependency entry: `name[extras]==version ; marker  # comment`.
///
/// Only exact pins are part of the format. A bare `name` leaves the version
/// to whatever a constraints file (or the installer) decides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Requirement {
    pub name: PackageName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Requirement {
    /// A bare or pinned requirement with no extras, marker or comment.
    pub fn new(name: impl Into<PackageName>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            extras: Vec::new(),
            version: version.map(str::to_owned),
            marker: None,
            comment: None,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }

    /// The marker in canonical spelling, so entries that apply under the
    /// same condition compare equal however their markers were written.
    pub fn marker_key(&self) -> Option<String> {
        self.marker.as_deref().map(canonical_marker)
    }
}

/// Canonical spelling of an environment marker.
///
/// Quoted strings are kept verbatim but always double-quoted. Outside quotes,
/// whitespace next to comparison operators or parentheses is dropped and any
/// other run of whitespace becomes a single space. Markers are never evaluated.
pub fn canonical_marker(marker: &str) -> String {
    fn binds_left(c: char) -> bool {
        matches!(c, '<' | '>' | '=' | '!' | '~' | '(')
    }
    fn binds_right(c: char) -> bool {
        matches!(c, '<' | '>' | '=' | '!' | '~' | ')')
    }

    let mut out = String::with_capacity(marker.len());
    let mut pending_space = false;
    let mut chars = marker.trim().chars();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !binds_right(c) && !out.ends_with(binds_left) {
            out.push(' ');
        }
        pending_space = false;
        if c == '"' || c == '\'' {
            out.push('"');
            for inner in chars.by_ref() {
                if inner == c {
                    break;
                }
                out.push(inner);
            }
            out.push('"');
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for Requirement {
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
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}

/// Split a trailing inline comment off a line.
///
/// A `#` only starts a comment at the beginning of the text or after whitespace,
/// so `pkg==1.0#frag` keeps its `#`.
pub(crate) fn split_inline_comment(text: &str) -> (&str, Option<String>) {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            let comment = text[i + 1..].trim();
            let comment = (!comment.is_empty()).then(|| comment.to_owned());
            return (text[..i].trim_end(), comment);
        }
    }
    (text, None)
}

pub(crate) fn parse_requirement(text: &str, line: usize) -> Result<Requirement, ManifestError> {
    let (body, comment) = split_inline_comment(text);

    let (spec, marker) = match body.split_once(';') {
        Some((spec, marker)) => {
            let marker = marker.trim();
            (spec.trim(), (!marker.is_empty()).then(|| marker.to_owned()))
        }
        None => (body.trim(), None),
    };

    let name_end = spec
        .find(|c: char| !is_name_char(c))
        .unwrap_or(spec.len());
    let name = &spec[..name_end];
    validate_name(name, line)?;

    let mut rest = spec[name_end..].trim_start();

    let mut extras = Vec::new();
    if let Some(after) = rest.strip_prefix('[') {
        let Some((inner, tail)) = after.split_once(']') else {
            return Err(ManifestError::UnterminatedExtras {
                line,
                name: name.to_owned(),
            });
        };
        for extra in inner.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            validate_name(extra, line)?;
            extras.push(extra.to_owned());
        }
        rest = tail.trim_start();
    }

    let version = if rest.is_empty() {
        None
    } else if let Some(pinned) = rest.strip_prefix("==") {
        if pinned.starts_with('=') {
            return Err(ManifestError::UnsupportedSpecifier {
                line,
                spec: rest.to_owned(),
            });
        }
        let pinned = pinned.trim();
        if pinned.is_empty() {
            return Err(ManifestError::EmptyVersion {
                line,
                name: name.to_owned(),
            });
        }
        if !pinned.chars().all(is_version_char) {
            return Err(ManifestError::InvalidVersion {
                line,
                version: pinned.to_owned(),
            });
        }
        Some(pinned.to_owned())
    } else {
        return Err(ManifestError::UnsupportedSpecifier {
            line,
            spec: rest.to_owned(),
        });
    };

    Ok(Requirement {
        name: PackageName::new(name),
        extras,
        version,
        marker,
        comment,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '!' | '-' | '_' | '*')
}

fn validate_name(name: &str, line: usize) -> Result<(), ManifestError> {
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric());
    let ends_ok = name.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
    if starts_ok && ends_ok && name.chars().all(is_name_char) {
        Ok(())
    } else {
        Err(ManifestError::InvalidName {
            line,
            name: name.to_owned(),
        })
    }
}
