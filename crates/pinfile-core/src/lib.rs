//! Include expansion and validation for pinned requirements manifests.
//!
//! This crate ties the schema layer to real files: manifest sources
//! (filesystem or in-memory), `-c`/`-r` include expansion into a
//! `FlatManifest`, uniqueness checking (`CheckReport`), effective pin
//! resolution under a precedence policy, project configuration
//! (`pinfile.toml`), and the `Engine` facade the CLI drives.

pub mod check;
pub mod config;
pub mod engine;
pub mod expand;
pub mod resolve;
pub mod source;

pub use check::{check, CheckReport, Conflict, Duplicate, PinSite};
pub use config::{ProjectConfig, CONFIG_FILE};
pub use engine::{Engine, FormatResult};
pub use expand::{EntryKind, Expander, FlatEntry, FlatManifest};
pub use resolve::{resolve, Precedence};
pub use source::{FsSource, ManifestSource, MemorySource};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error in {}: {source}", file.display())]
    Manifest {
        file: PathBuf,
        source: pinfile_schema::ManifestError,
    },
    #[error("lock error: {0}")]
    Lock(#[from] pinfile_schema::LockError),
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("include error: {}:{line}: target '{target}' not found", from.display())]
    IncludeNotFound {
        from: PathBuf,
        line: usize,
        target: String,
    },
    #[error("include error: cycle detected: {chain}")]
    IncludeCycle { chain: String },
    #[error("include error: {} exceeds the maximum include depth of {max_depth}", path.display())]
    DepthExceeded { path: PathBuf, max_depth: usize },
    #[error("conflicting pins for '{name}': {}", versions.join(", "))]
    Conflict { name: String, versions: Vec<String> },
    #[error("formatting would change the meaning of {}", path.display())]
    FormatChangedSemantics { path: PathBuf },
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
