use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Where manifest text comes from.
///
/// The expander only needs to read a file and to turn a path into a stable key
/// for cycle detection; both go through this trait so expansion can run
/// against an in-memory tree as well as the filesystem.
pub trait ManifestSource {
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Resolve `path` to a stable identity. Fails with `NotFound` if it does not exist.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Reads manifests from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ManifestSource for FsSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}

/// An in-memory tree of manifests keyed by lexically normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(normalize_lexically(path.as_ref()), content.into());
    }
}

impl ManifestSource for MemorySource {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_lexically(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let key = normalize_lexically(path);
        if self.files.contains_key(&key) {
            Ok(key)
        } else {
            Err(not_found(path))
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    )
}

/// Resolve `.` and `..` components without touching the filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    out.components().next_back(),
                    None | Some(Component::ParentDir)
                ) {
                    out.push("..");
                } else {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
