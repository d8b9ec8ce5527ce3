use crate::resolve::Precedence;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "pinfile.toml";

/// Project settings, read from `pinfile.toml`.
///
/// Every key is optional. Relative paths are taken relative to the directory
/// holding the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub precedence: Precedence,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_lock_file")]
    pub lock_file: PathBuf,
    #[serde(default = "default_allow_unpinned")]
    pub allow_unpinned: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            precedence: Precedence::default(),
            max_depth: default_max_depth(),
            lock_file: default_lock_file(),
            allow_unpinned: default_allow_unpinned(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_max_depth() -> usize {
    32
}

fn default_lock_file() -> PathBuf {
    PathBuf::from("pinfile.lock")
}

fn default_allow_unpinned() -> bool {
    true
}

impl ProjectConfig {
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let config: Self =
            toml::from_str(input).map_err(|e| CoreError::Config(format!("invalid {CONFIG_FILE}: {e}")))?;
        if config.max_depth == 0 {
            return Err(CoreError::Config("max_depth must be at least 1".to_owned()));
        }
        Ok(config)
    }

    /// Load a config file and rebase its relative paths onto the file's directory.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("failed to read {}: {e}", path.display())))?;
        let mut config = Self::parse(&content)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            config.root = dir.join(&config.root);
            config.lock_file = dir.join(&config.lock_file);
        }
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `dir/pinfile.toml` if it exists, defaults otherwise.
    pub fn load_or_default(dir: &Path) -> Result<Self, CoreError> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| CoreError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ProjectConfig::parse("").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.precedence, Precedence::Strict);
        assert_eq!(config.max_depth, 32);
        assert!(config.allow_unpinned);
    }

    #[test]
    fn parses_all_keys() {
        let config = ProjectConfig::parse(
            r#"
root = "requirements/dev.pip"
precedence = "last-wins"
max_depth = 4
lock_file = "requirements/dev.lock"
allow_unpinned = false
"#,
        )
        .unwrap();
        assert_eq!(config.root, PathBuf::from("requirements/dev.pip"));
        assert_eq!(config.precedence, Precedence::LastWins);
        assert_eq!(config.max_depth, 4);
        assert!(!config.allow_unpinned);
    }

    #[test]
    fn rejects_unknown_keys_and_zero_depth() {
        assert!(ProjectConfig::parse("colour = true").is_err());
        assert!(ProjectConfig::parse("precedence = \"newest\"").is_err());
        assert!(ProjectConfig::parse("max_depth = 0").is_err());
    }

    #[test]
    fn load_rebases_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "root = \"requirements/dev.pip\"\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.root, dir.path().join("requirements/dev.pip"));
        assert_eq!(config.lock_file, dir.path().join("pinfile.lock"));
    }

    #[test]
    fn load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load_or_default(dir.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
    }

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ProjectConfig {
            precedence: Precedence::FirstWins,
            ..ProjectConfig::default()
        };
        config.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(ProjectConfig::parse(&text).unwrap(), config);
    }
}
