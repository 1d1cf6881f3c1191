//! Sequencing of the per-scenario runs.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::common::{ensure_dir_exists, write_file};
use crate::config::{PipelineConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::geom::{repair_file, RepairOptions};
use crate::io::FeatureCollection;
use crate::postprocess::{cartogram_output_path, post_process, PostProcessResult};
use crate::table::build_table;
use crate::tool::{CartogramTool, ToolOutput};

/// Exit code reported when the tool succeeds but writes no cartogram geometry.
pub const MISSING_OUTPUT_EXIT_CODE: i32 = 3;

/// Why a scenario failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The tool exited with this nonzero code.
    ExitCode(i32),
    /// The tool exited 0 but `{stem}_cartogram.geojson` is missing.
    MissingOutput,
}

impl FailureKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            FailureKind::ExitCode(code) => *code,
            FailureKind::MissingOutput => MISSING_OUTPUT_EXIT_CODE,
        }
    }
}

/// Progress of one scenario: `Pending → TableBuilt → Invoked → Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioStatus {
    Pending,
    TableBuilt,
    Invoked,
    Succeeded,
    Failed(FailureKind),
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    pub label: String,
    pub table_path: PathBuf,
    pub row_count: usize,
    pub status: ScenarioStatus,
    pub stdout_log: Option<PathBuf>,
    pub stderr_log: Option<PathBuf>,
    pub cartogram_path: Option<PathBuf>,
    pub post: Option<PostProcessResult>,
}

impl ScenarioReport {
    fn pending(scenario: &ScenarioConfig, output_dir: &Path) -> Self {
        Self {
            label: scenario.label.clone(),
            table_path: scenario.table_path(output_dir),
            row_count: 0,
            status: ScenarioStatus::Pending,
            stdout_log: None,
            stderr_log: None,
            cartogram_path: None,
            post: None,
        }
    }

    /// One-line summary for the terminal.
    pub fn summary(&self) -> String {
        match (&self.status, &self.post) {
            (ScenarioStatus::Succeeded, Some(post)) => format!(
                "{}: {} rows, invalid geometries before/after: {}/{}, stamped {} SVGs",
                self.label, self.row_count, post.invalid_before, post.invalid_after, post.stamped_artifacts.len(),
            ),
            (ScenarioStatus::Failed(FailureKind::ExitCode(code)), _) => format!(
                "{}: cartogram failed with exit code {code}. See {}",
                self.label, display_opt(&self.stderr_log),
            ),
            (ScenarioStatus::Failed(FailureKind::MissingOutput), _) => format!(
                "{}: expected output not found: {}",
                self.label, display_opt(&self.cartogram_path),
            ),
            (status, _) => format!("{}: {status:?}", self.label),
        }
    }
}

fn display_opt(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub timestamp: String,
    pub valid_input: PathBuf,
    pub dropped_sub_polygons: usize,
    /// Every configured scenario, in order; those after a failure stay `Pending`.
    pub scenarios: Vec<ScenarioReport>,
}

impl PipelineReport {
    pub fn failure(&self) -> Option<(&ScenarioReport, FailureKind)> {
        self.scenarios.iter().find_map(|s| match s.status {
            ScenarioStatus::Failed(kind) => Some((s, kind)),
            _ => None,
        })
    }

    #[inline] pub fn succeeded(&self) -> bool { self.failure().is_none() }

    /// 0 on success, otherwise the failing scenario's code.
    pub fn exit_code(&self) -> i32 {
        self.failure().map_or(0, |(_, kind)| kind.exit_code())
    }

    /// Closing report of a successful run: dropped sub-polygons, then one line per table.
    pub fn completion_summary(&self) -> String {
        let mut lines = vec![
            format!("Cartogram runs completed ({}).", self.timestamp),
            format!(
                "Dropped {} tiny sub-polygons while cleaning {}",
                self.dropped_sub_polygons, self.valid_input.display(),
            ),
        ];
        for scenario in &self.scenarios {
            let table = scenario.table_path.file_name().unwrap_or_default().to_string_lossy();
            lines.push(format!("  {}: {} rows -> {table}", scenario.label, scenario.row_count));
        }
        lines.join("\n")
    }
}

/// Drives the repair → table → tool → post-process sequence for each scenario.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Run every scenario in order, stopping at the first failure.
    ///
    /// Missing input or a missing tool abort before anything is written.
    pub fn run(&self, tool: &dyn CartogramTool) -> Result<PipelineReport> {
        let config = &self.config;
        if !config.input.is_file() {
            return Err(Error::MissingInput(config.input.clone()));
        }
        if !tool.is_available() {
            return Err(Error::ToolMissing(tool.path().to_path_buf()));
        }

        let timestamp = config.timestamp.clone()
            .unwrap_or_else(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        self.log_header(&timestamp);

        ensure_dir_exists(&config.output_dir)?;

        let valid_input = config.valid_input_path();
        let repair_options = RepairOptions {
            min_area: config.effective_min_area(),
            skip_validation: config.skip_validation,
        };
        let outcome = repair_file(&config.input, &valid_input, &repair_options)?;
        let collection = FeatureCollection::read(&valid_input)?;

        let mut report = PipelineReport {
            timestamp,
            valid_input,
            dropped_sub_polygons: outcome.dropped,
            scenarios: config.scenarios.iter()
                .map(|s| ScenarioReport::pending(s, &config.output_dir))
                .collect(),
        };

        for (scenario, scenario_report) in config.scenarios.iter().zip(report.scenarios.iter_mut()) {
            self.run_scenario(scenario, &collection, &report.valid_input, &report.timestamp, tool, scenario_report)?;
            info!("{}", scenario_report.summary());
            if let ScenarioStatus::Failed(kind) = scenario_report.status {
                warn!("{}: stopping after failure ({kind:?})", scenario.label);
                break;
            }
        }

        Ok(report)
    }

    fn run_scenario(
        &self,
        scenario: &ScenarioConfig,
        collection: &FeatureCollection,
        valid_input: &Path,
        timestamp: &str,
        tool: &dyn CartogramTool,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        let config = &self.config;
        let output_dir = &config.output_dir;

        let table = build_table(collection, &config.schema, &scenario.overrides)?;
        report.row_count = table.write(&config.schema, &report.table_path)?;
        report.status = ScenarioStatus::TableBuilt;
        debug!("{}: {} rows -> {}", scenario.label, report.row_count, report.table_path.display());

        let output = tool.invoke(valid_input, &report.table_path, output_dir, &config.tool_options)?;
        report.status = ScenarioStatus::Invoked;
        self.write_logs(scenario, timestamp, &output, report)?;

        if !output.success() {
            report.status = ScenarioStatus::Failed(FailureKind::ExitCode(output.exit_code));
            return Ok(());
        }

        let cartogram = cartogram_output_path(scenario, output_dir);
        report.cartogram_path = Some(cartogram.clone());
        if !cartogram.is_file() {
            report.status = ScenarioStatus::Failed(FailureKind::MissingOutput);
            return Ok(());
        }

        let post = post_process(scenario, &cartogram, output_dir, timestamp)?;
        for path in &post.stamped_artifacts {
            debug!("{}: stamped {}", scenario.label, path.display());
        }
        report.post = Some(post);
        report.status = ScenarioStatus::Succeeded;
        Ok(())
    }

    /// Persist both output streams, whatever the exit code.
    fn write_logs(&self, scenario: &ScenarioConfig, timestamp: &str, output: &ToolOutput, report: &mut ScenarioReport) -> Result<()> {
        let base = format!("cartogram_run_{}_{timestamp}", scenario.label);
        let stderr_log = self.config.output_dir.join(format!("{base}.stderr.log"));
        let stdout_log = self.config.output_dir.join(format!("{base}.stdout.log"));
        write_file(&stderr_log, &output.stderr)?;
        write_file(&stdout_log, &output.stdout)?;
        report.stderr_log = Some(stderr_log);
        report.stdout_log = Some(stdout_log);
        Ok(())
    }

    fn log_header(&self, timestamp: &str) {
        let config = &self.config;
        let target_points = config.tool_options.target_points
            .map_or_else(|| "tool default".to_string(), |n| n.to_string());
        let labels = config.scenarios.iter().map(|s| s.label.as_str()).collect::<Vec<_>>();

        info!("Run timestamp:   {timestamp}");
        info!("Input:           {}", config.input.display());
        info!("Output dir:      {}", config.output_dir.display());
        info!("Min area:        {:.0e}", config.min_area);
        info!("Skip validation: {}", config.skip_validation);
        info!("Discard small:   {}", config.discard_small);
        info!("Target points:   {target_points}");
        info!("Scenarios:       {}", labels.join(", "));
    }
}
