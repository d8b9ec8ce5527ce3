use super::{colorize_verdict, json_pretty, version_or_unpinned, CommandError, EXIT_FAILURE, EXIT_SUCCESS};
use pinfile_core::{CheckReport, Engine};
use std::path::Path;

fn marker_suffix(marker: Option<&str>) -> String {
    marker.map(|m| format!(" ; {m}")).unwrap_or_default()
}

fn print_report(report: &CheckReport) {
    for conflict in &report.conflicts {
        println!(
            "{} {}{}",
            colorize_verdict("conflict"),
            conflict.name,
            marker_suffix(conflict.marker.as_deref())
        );
        for site in &conflict.sites {
            println!(
                "    {} at {}",
                version_or_unpinned(site.version.as_deref()),
                site.origin
            );
        }
    }
    for dup in &report.duplicates {
        let origins: Vec<&str> = dup.sites.iter().map(|s| s.origin.as_str()).collect();
        println!(
            "{} {}{} listed {} times as a {}: {}",
            colorize_verdict("duplicate"),
            dup.name,
            marker_suffix(dup.marker.as_deref()),
            dup.sites.len(),
            dup.kind,
            origins.join(", ")
        );
    }
    for name in &report.unpinned {
        println!("{} {name}", colorize_verdict("unpinned"));
    }
    for site in &report.unused_constraints {
        println!(
            "{} constraint {} {} at {}",
            colorize_verdict("unused"),
            site.name,
            version_or_unpinned(site.version.as_deref()),
            site.origin
        );
    }
}

pub fn run(engine: &Engine, root: &Path, allow_unpinned: bool, json: bool) -> Result<u8, CommandError> {
    let report = engine.check(root)?;
    let passed = report.passes(allow_unpinned);

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_report(&report);
        if passed {
            println!("{} {}", colorize_verdict("ok"), root.display());
        }
    }
    Ok(if passed { EXIT_SUCCESS } else { EXIT_FAILURE })
}
