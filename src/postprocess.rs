//! Cleanup of one scenario's cartogram output.

use std::{fs, path::{Path, PathBuf}};

use tracing::{debug, warn};

use crate::common::remove_if_exists;
use crate::config::ScenarioConfig;
use crate::error::{Error, Result};
use crate::geom::{count_invalid, repair_file, RepairOptions};
use crate::io::{svg, FeatureCollection};

/// Suffix of the geometry the cartogram tool writes, after the table stem.
pub const CARTOGRAM_SUFFIX: &str = "_cartogram.geojson";

/// Suffix of the primary SVG rendering, which is kept and stamped.
pub const OUTPUT_SVG_SUFFIX: &str = "_output.svg";

/// Debug renderings deleted after each run.
pub const DEBUG_SVG_SUFFIXES: [&str; 3] = ["_C_cartogram.svg", "_C_input.svg", "_input.svg"];

/// What post-processing did for one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessResult {
    pub fixed_geometry_path: PathBuf,
    pub invalid_before: usize,
    pub invalid_after: usize,
    /// Whether the primary rendering had its fill rule rewritten.
    pub fill_rule_fixed: bool,
    pub removed_debug: Vec<PathBuf>,
    pub stamped_artifacts: Vec<PathBuf>,
}

impl PostProcessResult {
    /// More invalid features after repair than before: a defect in the repair logic.
    #[inline]
    pub fn is_regression(&self) -> bool {
        self.invalid_after > self.invalid_before
    }
}

/// Expected cartogram geometry for a scenario.
pub fn cartogram_output_path(scenario: &ScenarioConfig, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}{CARTOGRAM_SUFFIX}", scenario.table_stem()))
}

/// Sibling of `path` with `_valid` appended to the stem.
pub fn valid_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_valid{ext}"))
}

/// Re-validate and repair the raw cartogram geometry, fix the SVG fill rule,
/// delete debug renderings and stamp the kept rendering with `timestamp`.
///
/// Only `raw_output` is required; absent renderings are skipped.
pub fn post_process(
    scenario: &ScenarioConfig,
    raw_output: &Path,
    output_dir: &Path,
    timestamp: &str,
) -> Result<PostProcessResult> {
    if !raw_output.is_file() {
        return Err(Error::MissingArtifact(raw_output.to_path_buf()));
    }
    let stem = scenario.table_stem();

    let invalid_before = count_invalid(&FeatureCollection::read(raw_output)?)?;
    let fixed_geometry_path = valid_sibling(raw_output);
    repair_file(raw_output, &fixed_geometry_path, &RepairOptions::repair_only())?;
    let invalid_after = count_invalid(&FeatureCollection::read(&fixed_geometry_path)?)?;

    if invalid_after > invalid_before {
        warn!(
            "{}: repair regression, invalid geometries went from {invalid_before} to {invalid_after}",
            scenario.label,
        );
    } else if invalid_after > 0 {
        debug!("{}: {invalid_after} geometries still invalid after repair", scenario.label);
    }

    let output_svg = output_dir.join(format!("{stem}{OUTPUT_SVG_SUFFIX}"));
    let fill_rule_fixed = output_svg.is_file() && svg::fix_fill_rule(&output_svg)?;

    let mut removed_debug = Vec::new();
    for suffix in DEBUG_SVG_SUFFIXES {
        let debug_svg = output_dir.join(format!("{stem}{suffix}"));
        if remove_if_exists(&debug_svg)? {
            removed_debug.push(debug_svg);
        }
    }

    let stamped_artifacts = stamp_artifacts(&stem, timestamp, output_dir)?;

    Ok(PostProcessResult {
        fixed_geometry_path,
        invalid_before,
        invalid_after,
        fill_rule_fixed,
        removed_debug,
        stamped_artifacts,
    })
}

/// Rename `{stem}_output.svg` to `{stem}_{timestamp}_output.svg`.
fn stamp_artifacts(stem: &str, timestamp: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut stamped = Vec::new();
    for suffix in [OUTPUT_SVG_SUFFIX] {
        let src = output_dir.join(format!("{stem}{suffix}"));
        if src.is_file() {
            let dst = output_dir.join(format!("{stem}_{timestamp}{suffix}"));
            fs::rename(&src, &dst).map_err(|e| Error::io(&src, e))?;
            stamped.push(dst);
        }
    }
    Ok(stamped)
}
