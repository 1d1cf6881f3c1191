use std::process::ExitCode;

use anyhow::{Context, Result};
use cartoprep::{count_invalid, FeatureCollection};

use crate::cli::{CheckArgs, Cli};

/// Exits 1 if any file has invalid features.
pub fn run(_cli: &Cli, args: &CheckArgs) -> Result<ExitCode> {
    let mut any_invalid = false;
    for path in &args.inputs {
        let collection = FeatureCollection::read(path)?;
        let invalid = count_invalid(&collection)
            .with_context(|| format!("[check] {}", path.display()))?;
        println!("{}: {invalid}/{} invalid", path.display(), collection.len());
        any_invalid |= invalid > 0;
    }
    Ok(if any_invalid { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
