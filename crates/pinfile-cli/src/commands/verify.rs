use super::{json_pretty, CommandError, EXIT_SUCCESS};
use pinfile_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, root: &Path, lock: Option<&Path>, json: bool) -> Result<u8, CommandError> {
    let identity = engine.verify_lock(root, lock)?;
    if json {
        let payload = serde_json::json!({
            "status": "ok",
            "fingerprint": identity.fingerprint,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("lock file matches {} ({})", root.display(), identity.short);
    }
    Ok(EXIT_SUCCESS)
}
