pub mod check;
pub mod completions;
pub mod expand;
pub mod fmt;
pub mod lock;
pub mod man_pages;
pub mod parse;
pub mod resolve;
pub mod verify;

use console::Style;
use pinfile_core::CoreError;
use pinfile_schema::LockError;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_INCLUDE_ERROR: u8 = 3;

/// A failed command: the message for stderr and the process exit code.
#[derive(Debug)]
pub struct CommandError {
    pub code: u8,
    pub message: String,
}

/// Manifest problems exit 2, include problems exit 3, everything else 1.
pub fn exit_code_for(err: &CoreError) -> u8 {
    match err {
        CoreError::Manifest { .. }
        | CoreError::Read { .. }
        | CoreError::Lock(LockError::Manifest(_)) => EXIT_MANIFEST_ERROR,
        CoreError::IncludeNotFound { .. }
        | CoreError::IncludeCycle { .. }
        | CoreError::DepthExceeded { .. } => EXIT_INCLUDE_ERROR,
        _ => EXIT_FAILURE,
    }
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        Self {
            code: exit_code_for(&err),
            message: err.to_string(),
        }
    }
}

impl From<String> for CommandError {
    fn from(message: String) -> Self {
        Self {
            code: EXIT_FAILURE,
            message,
        }
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Color a check verdict: `ok` green, `conflict` red, anything else yellow.
pub fn colorize_verdict(verdict: &str) -> String {
    match verdict {
        "ok" => Style::new().green().apply_to(verdict).to_string(),
        "conflict" => Style::new().red().bold().apply_to(verdict).to_string(),
        "duplicate" | "unpinned" | "unused" => Style::new().yellow().apply_to(verdict).to_string(),
        other => other.to_owned(),
    }
}

pub fn version_or_unpinned(version: Option<&str>) -> String {
    version.map_or_else(
        || Style::new().dim().apply_to("(unpinned)").to_string(),
        str::to_owned,
    )
}
