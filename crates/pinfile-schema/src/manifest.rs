use crate::requirement::{parse_requirement, split_inline_comment, Requirement};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: include directive '{flag}' has no target")]
    MissingIncludeTarget { line: usize, flag: String },
    #[error("line {line}: unknown option '{option}', expected -c/--constraint or -r/--requirement")]
    UnknownOption { line: usize, option: String },
    #[error("line {line}: invalid package name '{name}'")]
    InvalidName { line: usize, name: String },
    #[error("line {line}: '{name}==' has an empty version")]
    EmptyVersion { line: usize, name: String },
    #[error("line {line}: invalid version '{version}'")]
    InvalidVersion { line: usize, version: String },
    #[error("line {line}: unsupported version specifier '{spec}', only exact '==' pins are allowed")]
    UnsupportedSpecifier { line: usize, spec: String },
    #[error("line {line}: unterminated extras for '{name}', expected ']'")]
    UnterminatedExtras { line: usize, name: String },
}

impl ManifestError {
    /// The 1-based line the error points at, if it came from parsing.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Io(_) => None,
            Self::MissingIncludeTarget { line, .. }
            | Self::UnknownOption { line, .. }
            | Self::InvalidName { line, .. }
            | Self::EmptyVersion { line, .. }
            | Self::InvalidVersion { line, .. }
            | Self::UnsupportedSpecifier { line, .. }
            | Self::UnterminatedExtras { line, .. } => Some(*line),
        }
    }
}

/// Which kind of file an include directive pulls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncludeKind {
    /// `-c <path>`: entries bound versions but do not trigger installation.
    Constraints,
    /// `-r <path>`: entries are installed unconditionally.
    Requirements,
}

impl IncludeKind {
    pub fn flag(self) -> &'static str {
        match self {
            Self::Constraints => "-c",
            Self::Requirements => "-r",
        }
    }
}

impl fmt::Display for IncludeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constraints => f.write_str("constraints"),
            Self::Requirements => f.write_str("requirements"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Include {
    pub kind: IncludeKind,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl fmt::Display for Include {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.flag(), self.target)?;
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}

/// One logical line of a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ManifestLine {
    Blank,
    Comment(String),
    Include(Include),
    Requirement(Requirement),
}

impl fmt::Display for ManifestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Comment(text) if text.is_empty() => f.write_str("#"),
            Self::Comment(text) => write!(f, "# {text}"),
            Self::Include(include) => fmt::Display::fmt(include, f),
            Self::Requirement(req) => fmt::Display::fmt(req, f),
        }
    }
}

/// A value tagged with the 1-based physical line it started on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Spanned<T> {
    pub line: usize,
    pub value: T,
}

/// A parsed manifest, keeping every line (comments and blanks included) in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub lines: Vec<Spanned<ManifestLine>>,
}

impl Manifest {
    /// Dependency entries in file order, with their line numbers.
    pub fn requirements(&self) -> impl Iterator<Item = (usize, &Requirement)> + '_ {
        self.lines.iter().filter_map(|l| match &l.value {
            ManifestLine::Requirement(req) => Some((l.line, req)),
            _ => None,
        })
    }

    /// Include directives in file order, with their line numbers.
    pub fn includes(&self) -> impl Iterator<Item = (usize, &Include)> + '_ {
        self.lines.iter().filter_map(|l| match &l.value {
            ManifestLine::Include(include) => Some((l.line, include)),
            _ => None,
        })
    }

    /// Serialize back to the on-disk syntax, one item per line.
    ///
    /// Output is canonical: short include flags, no whitespace around `==`,
    /// and a trailing newline unless the manifest is empty.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.value.to_string());
            out.push('\n');
        }
        out
    }
}

pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let mut lines = Vec::new();
    let mut physical = input.lines().enumerate();

    while let Some((index, raw)) = physical.next() {
        let line = index + 1;
        let mut logical = raw.to_owned();
        // A trailing backslash joins the next physical line. Comment lines never continue.
        let is_comment = raw.trim_start().starts_with('#');
        while !is_comment && logical.ends_with('\\') {
            logical.pop();
            match physical.next() {
                Some((_, next)) => logical.push_str(next),
                None => break,
            }
        }
        lines.push(Spanned {
            line,
            value: parse_line(&logical, line)?,
        });
    }

    Ok(Manifest { lines })
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

fn parse_line(text: &str, line: usize) -> Result<ManifestLine, ManifestError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(ManifestLine::Blank);
    }
    if let Some(comment) = trimmed.strip_prefix('#') {
        return Ok(ManifestLine::Comment(comment.trim().to_owned()));
    }
    if trimmed.starts_with('-') {
        return parse_include(trimmed, line).map(ManifestLine::Include);
    }
    parse_requirement(trimmed, line).map(ManifestLine::Requirement)
}

fn parse_include(text: &str, line: usize) -> Result<Include, ManifestError> {
    let (body, comment) = split_inline_comment(text);

    let (kind, flag, target) = if let Some(rest) = body.strip_prefix("--requirement") {
        (IncludeKind::Requirements, "--requirement", long_value(rest))
    } else if let Some(rest) = body.strip_prefix("--constraint") {
        (IncludeKind::Constraints, "--constraint", long_value(rest))
    } else if let Some(rest) = body.strip_prefix("-r") {
        (IncludeKind::Requirements, "-r", Some(rest.trim()))
    } else if let Some(rest) = body.strip_prefix("-c") {
        (IncludeKind::Constraints, "-c", Some(rest.trim()))
    } else {
        return Err(unknown_option(body, line));
    };

    let target = target.ok_or_else(|| unknown_option(body, line))?;
    if target.is_empty() {
        return Err(ManifestError::MissingIncludeTarget {
            line,
            flag: flag.to_owned(),
        });
    }

    Ok(Include {
        kind,
        target: target.to_owned(),
        comment,
    })
}

/// Value of a long option: `--flag=value` or `--flag value`.
/// `None` means the text only shares a prefix with the flag (`--requirements`).
fn long_value(rest: &str) -> Option<&str> {
    if let Some(value) = rest.strip_prefix('=') {
        Some(value.trim())
    } else if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn unknown_option(body: &str, line: usize) -> ManifestError {
    let option = body.split_whitespace().next().unwrap_or(body);
    ManifestError::UnknownOption {
        line,
        option: option.to_owned(),
    }
}
