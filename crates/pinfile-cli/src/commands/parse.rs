use super::{json_pretty, version_or_unpinned, CommandError, EXIT_SUCCESS};
use pinfile_core::Engine;
use pinfile_schema::ManifestLine;
use std::path::Path;

pub fn run(engine: &Engine, manifest: &Path, json: bool) -> Result<u8, CommandError> {
    let parsed = engine.parse(manifest)?;
    if json {
        println!("{}", json_pretty(&parsed)?);
        return Ok(EXIT_SUCCESS);
    }

    for spanned in &parsed.lines {
        match &spanned.value {
            ManifestLine::Include(include) => println!(
                "{:>4}  {:<13} {}",
                spanned.line,
                include.kind.to_string(),
                include.target
            ),
            ManifestLine::Requirement(req) => println!(
                "{:>4}  {:<13} {} {}",
                spanned.line,
                "entry",
                req.name.as_str(),
                version_or_unpinned(req.version.as_deref())
            ),
            ManifestLine::Blank | ManifestLine::Comment(_) => {}
        }
    }
    Ok(EXIT_SUCCESS)
}
