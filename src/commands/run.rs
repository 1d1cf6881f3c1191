use std::process::ExitCode;

use anyhow::{Context, Result};
use cartoprep::{
    default_scenarios, select_scenarios, ExternalTool, Pipeline, PipelineConfig, ScenarioFile, TableSchema, ToolOptions,
};

use crate::cli::{Cli, RunArgs};
use crate::commands::to_exit_code;

pub fn run(_cli: &Cli, args: &RunArgs) -> Result<ExitCode> {
    let (schema, scenarios) = match &args.config {
        Some(path) => {
            let file = ScenarioFile::load(path)
                .with_context(|| format!("[run] Failed to load scenario file {}", path.display()))?;
            let scenarios = if file.scenarios.is_empty() { default_scenarios() } else { file.scenarios };
            (file.table.unwrap_or_default(), scenarios)
        }
        None => (TableSchema::default(), default_scenarios()),
    };

    let mut config = PipelineConfig::new(args.input.clone(), args.output_dir.clone());
    config.min_area = args.repair.min_area;
    config.skip_validation = args.repair.skip_validation;
    config.discard_small = !args.repair.no_discard;
    config.tool_options = ToolOptions {
        target_points: args.target_points,
        simplify: !args.no_simplify,
        export_preprocessed: args.export_preprocessed,
        ..ToolOptions::default()
    };
    config.schema = schema;
    config.scenarios = select_scenarios(&scenarios, &args.scenarios)?;

    let tool = ExternalTool::new(&args.tool);
    let report = Pipeline::new(config).run(&tool)?;

    for scenario in &report.scenarios {
        println!("{}", scenario.summary());
    }
    if let Some((failed, _)) = report.failure() {
        if let (Some(stdout), Some(stderr)) = (&failed.stdout_log, &failed.stderr_log) {
            println!("Logs: {} {}", stdout.display(), stderr.display());
        }
        return Ok(to_exit_code(report.exit_code()));
    }

    println!("\n{}", report.completion_summary());
    Ok(ExitCode::SUCCESS)
}
