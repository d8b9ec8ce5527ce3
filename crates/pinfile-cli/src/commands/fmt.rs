use super::{json_pretty, CommandError, EXIT_FAILURE, EXIT_SUCCESS};
use pinfile_core::Engine;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist manifest: {}", e.error))?;
    Ok(())
}

pub fn run(engine: &Engine, manifest: &Path, check: bool, write: bool, json: bool) -> Result<u8, CommandError> {
    let result = engine.format(manifest)?;

    if check {
        if json {
            println!("{}", json_pretty(&result)?);
        } else if result.changed {
            eprintln!("{} is not formatted (run 'pinfile fmt --write')", manifest.display());
        }
        return Ok(if result.changed { EXIT_FAILURE } else { EXIT_SUCCESS });
    }

    if !write {
        print!("{}", result.formatted);
        return Ok(EXIT_SUCCESS);
    }

    if result.changed {
        write_atomic(manifest, &result.formatted)?;
    }
    if json {
        println!("{}", json_pretty(&result)?);
    } else if result.changed {
        println!("formatted {}", manifest.display());
    } else {
        println!("{} already formatted", manifest.display());
    }
    Ok(EXIT_SUCCESS)
}
