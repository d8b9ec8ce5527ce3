use super::{json_pretty, CommandError, EXIT_SUCCESS};
use pinfile_core::Engine;
use std::path::Path;

pub fn run(engine: &Engine, root: &Path, json: bool) -> Result<u8, CommandError> {
    let flat = engine.expand(root)?;
    if json {
        println!("{}", json_pretty(&flat)?);
    } else {
        print!("{}", flat.render());
    }
    Ok(EXIT_SUCCESS)
}
