use crate::source::ManifestSource;
use crate::CoreError;
use pinfile_schema::{parse_manifest_str, IncludeKind, ManifestLine, Requirement};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whether a flattened entry is installed or only bounds a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Requirement,
    Constraint,
}

impl From<IncludeKind> for EntryKind {
    fn from(kind: IncludeKind) -> Self {
        match kind {
            IncludeKind::Requirements => Self::Requirement,
            IncludeKind::Constraints => Self::Constraint,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => f.write_str("requirement"),
            Self::Constraint => f.write_str("constraint"),
        }
    }
}

/// One dependency entry after include expansion, with where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct FlatEntry {
    pub kind: EntryKind,
    pub requirement: Requirement,
    pub file: PathBuf,
    pub line: usize,
}

impl FlatEntry {
    pub fn canonical_name(&self) -> String {
        self.requirement.name.canonical()
    }

    /// `file:line` for diagnostics.
    pub fn origin(&self) -> String {
        format!("{}:{}", self.file.display(), self.line)
    }
}

/// A root manifest with every `-c`/`-r` include expanded, in reading order.
#[derive(Debug, Clone, Serialize)]
pub struct FlatManifest {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
    pub entries: Vec<FlatEntry>,
}

impl FlatManifest {
    pub fn requirements(&self) -> impl Iterator<Item = &FlatEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Requirement)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &FlatEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Constraint)
    }

    /// Render the flattened manifest: requirements first, then constraints
    /// under a `# constraints` header, each line annotated with its origin.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in self.requirements() {
            out.push_str(&format!("{}  # {}\n", bare(&entry.requirement), entry.origin()));
        }
        let mut constraints = self.constraints().peekable();
        if constraints.peek().is_some() {
            out.push_str("\n# constraints\n");
            for entry in constraints {
                out.push_str(&format!("{}  # {}\n", bare(&entry.requirement), entry.origin()));
            }
        }
        out
    }
}

fn bare(req: &Requirement) -> String {
    Requirement {
        comment: None,
        ..req.clone()
    }
    .to_string()
}

/// Walks include directives from a root manifest.
///
/// Include targets resolve relative to the including file. Anything reached
/// through a `-c` directive is a constraint, whatever directives it uses
/// itself. A file reached twice with the same kind is expanded once.
pub struct Expander<'a> {
    source: &'a dyn ManifestSource,
    max_depth: usize,
}

struct Walk {
    stack: Vec<PathBuf>,
    visited: HashSet<(PathBuf, EntryKind)>,
    flat: FlatManifest,
}

impl<'a> Expander<'a> {
    pub fn new(source: &'a dyn ManifestSource, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    pub fn expand(&self, root: &Path) -> Result<FlatManifest, CoreError> {
        let canonical = self
            .source
            .canonicalize(root)
            .map_err(|source| CoreError::Read {
                path: root.to_path_buf(),
                source,
            })?;

        let mut walk = Walk {
            stack: Vec::new(),
            visited: HashSet::new(),
            flat: FlatManifest {
                root: root.to_path_buf(),
                files: Vec::new(),
                entries: Vec::new(),
            },
        };
        self.visit(&canonical, EntryKind::Requirement, &mut walk)?;

        debug!(
            "expanded {} into {} entries from {} files",
            root.display(),
            walk.flat.entries.len(),
            walk.flat.files.len()
        );
        Ok(walk.flat)
    }

    fn visit(&self, path: &Path, kind: EntryKind, walk: &mut Walk) -> Result<(), CoreError> {
        if walk.stack.iter().any(|p| p == path) {
            let mut chain: Vec<String> = walk
                .stack
                .iter()
                .skip_while(|p| *p != path)
                .map(|p| p.display().to_string())
                .collect();
            chain.push(path.display().to_string());
            return Err(CoreError::IncludeCycle {
                chain: chain.join(" -> "),
            });
        }
        if walk.stack.len() >= self.max_depth {
            return Err(CoreError::DepthExceeded {
                path: path.to_path_buf(),
                max_depth: self.max_depth,
            });
        }
        if !walk.visited.insert((path.to_path_buf(), kind)) {
            debug!("{} already expanded as {kind}, skipping", path.display());
            return Ok(());
        }

        let text = self.source.read(path).map_err(|source| CoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = parse_manifest_str(&text).map_err(|source| CoreError::Manifest {
            file: path.to_path_buf(),
            source,
        })?;

        if !walk.flat.files.iter().any(|f| f == path) {
            walk.flat.files.push(path.to_path_buf());
        }
        walk.stack.push(path.to_path_buf());

        for spanned in &manifest.lines {
            match &spanned.value {
                ManifestLine::Requirement(req) => walk.flat.entries.push(FlatEntry {
                    kind,
                    requirement: req.clone(),
                    file: path.to_path_buf(),
                    line: spanned.line,
                }),
                ManifestLine::Include(include) => {
                    let child_kind = match kind {
                        EntryKind::Constraint => EntryKind::Constraint,
                        EntryKind::Requirement => EntryKind::from(include.kind),
                    };
                    let target = resolve_target(path, &include.target);
                    let child = self.source.canonicalize(&target).map_err(|_| {
                        CoreError::IncludeNotFound {
                            from: path.to_path_buf(),
                            line: spanned.line,
                            target: include.target.clone(),
                        }
                    })?;
                    debug!(
                        "{}:{} includes {} as {child_kind}",
                        path.display(),
                        spanned.line,
                        child.display()
                    );
                    self.visit(&child, child_kind, walk)?;
                }
                ManifestLine::Blank | ManifestLine::Comment(_) => {}
            }
        }

        walk.stack.pop();
        Ok(())
    }
}

fn resolve_target(including: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match including.parent() {
        Some(dir) => dir.join(target),
        None => target.to_path_buf(),
    }
}
