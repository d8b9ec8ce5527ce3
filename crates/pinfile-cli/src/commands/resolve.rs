use super::{json_pretty, CommandError, EXIT_SUCCESS};
use pinfile_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, root: &Path, json: bool) -> Result<u8, CommandError> {
    let resolution = engine.resolve(root)?;
    if json {
        println!("{}", json_pretty(&resolution)?);
    } else {
        for pin in &resolution.pins {
            println!("{pin}");
        }
    }
    Ok(EXIT_SUCCESS)
}
