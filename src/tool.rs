//! Command-line contract of the external cartogram generator.

use std::{path::{Path, PathBuf}, process::{Command, Stdio}};

use tracing::debug;

use crate::error::{Error, Result};

/// Default location of the cartogram binary, relative to the working directory.
pub const DEFAULT_TOOL_PATH: &str = "cartogram-cpp/build/Release/cartogram";

/// Flags passed to the cartogram generator after the two positional paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOptions {
    /// Input is already projected; don't reproject.
    pub skip_projection: bool,
    /// Render polygons to SVG.
    pub plot_polygons: bool,
    pub verbose: bool,
    /// Target point count for simplify/densify; the tool's own default when unset.
    pub target_points: Option<u32>,
    /// Run the tool's simplify/densify pass.
    pub simplify: bool,
    /// Also export the preprocessed input geometry.
    pub export_preprocessed: bool,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            skip_projection: true,
            plot_polygons: true,
            verbose: true,
            target_points: None,
            simplify: true,
            export_preprocessed: false,
        }
    }
}

impl ToolOptions {
    /// Flag arguments in the order the tool documents them.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.skip_projection { args.push("--skip_projection".to_string()) }
        if self.plot_polygons { args.push("--plot_polygons".to_string()) }
        if self.verbose { args.push("--verbose".to_string()) }
        if let Some(n) = self.target_points {
            args.push("--n_points".to_string());
            args.push(n.to_string());
        }
        if !self.simplify { args.push("--disable_simplify_and_densify".to_string()) }
        if self.export_preprocessed { args.push("--export_preprocessed".to_string()) }
        args
    }
}

/// Captured result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code; -1 if the process was terminated by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    #[inline] pub fn success(&self) -> bool { self.exit_code == 0 }
}

/// A cartogram generator the pipeline can drive.
pub trait CartogramTool {
    /// Where the tool lives, for diagnostics.
    fn path(&self) -> &Path;

    /// Whether the tool can be run at all; checked once before any scenario.
    fn is_available(&self) -> bool;

    /// Run the tool to completion with `working_dir` as its output directory.
    /// A nonzero exit is returned as a value; only a failure to start is an error.
    fn invoke(&self, geometry: &Path, table: &Path, working_dir: &Path, options: &ToolOptions) -> Result<ToolOutput>;
}

/// The real cartogram binary, run as a blocking child process.
#[derive(Debug, Clone)]
pub struct ExternalTool {
    path: PathBuf,
}

impl ExternalTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ExternalTool {
    fn default() -> Self { Self::new(DEFAULT_TOOL_PATH) }
}

impl CartogramTool for ExternalTool {
    #[inline] fn path(&self) -> &Path { &self.path }

    fn is_available(&self) -> bool { self.path.is_file() }

    fn invoke(&self, geometry: &Path, table: &Path, working_dir: &Path, options: &ToolOptions) -> Result<ToolOutput> {
        let mut cmd = Command::new(&self.path);
        cmd.arg(geometry)
            .arg(table)
            .args(options.to_args())
            .current_dir(working_dir)
            .stdin(Stdio::null());

        debug!("[tool] {cmd:?}");
        let output = cmd.output().map_err(|e| Error::io(&self.path, e))?;

        Ok(ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
