use super::{json_pretty, CommandError, EXIT_SUCCESS};
use pinfile_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, root: &Path, output: Option<&Path>, json: bool) -> Result<u8, CommandError> {
    let lock = engine.lock(root, output)?;
    let dest = output.unwrap_or(engine.config().lock_file.as_path());
    if json {
        let payload = serde_json::json!({
            "lock_file": dest,
            "fingerprint": lock.fingerprint,
            "short_fingerprint": lock.short_fingerprint,
            "pins": lock.pins.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "locked {} pins into {} ({})",
            lock.pins.len(),
            dest.display(),
            lock.short_fingerprint
        );
    }
    Ok(EXIT_SUCCESS)
}
