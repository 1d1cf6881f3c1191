mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{check, repair, run, to_exit_code};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Run(args) => run::run(&cli, args),
        Commands::Repair(args) => repair::run(&cli, args),
        Commands::Check(args) => check::run(&cli, args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            match err.downcast_ref::<cartoprep::Error>() {
                Some(e @ cartoprep::Error::ToolMissing(_)) => {
                    eprintln!("Build the cartogram binary first, or pass --tool.");
                    to_exit_code(e.exit_code())
                }
                Some(e) => to_exit_code(e.exit_code()),
                None => ExitCode::FAILURE,
            }
        }
    }
}

/// Log to stderr; `-v` raises the default level from `warn` to `info`, `-vv` to `debug`.
/// `RUST_LOG` overrides both.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cartoprep={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
