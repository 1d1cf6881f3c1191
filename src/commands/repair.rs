use std::process::ExitCode;

use anyhow::Result;
use cartoprep::{repair_file, valid_sibling};

use crate::cli::{Cli, RepairArgs};

pub fn run(cli: &Cli, args: &RepairArgs) -> Result<ExitCode> {
    let output = args.output.clone().unwrap_or_else(|| valid_sibling(&args.input));
    if cli.verbose > 0 {
        eprintln!("[repair] {} -> {}", args.input.display(), output.display());
    }

    let outcome = repair_file(&args.input, &output, &args.repair.options())?;
    println!(
        "Repaired {} features, dropped {} sub-polygons, {} unrecoverable -> {}",
        outcome.repaired, outcome.dropped, outcome.unrecoverable, output.display(),
    );
    Ok(ExitCode::SUCCESS)
}
