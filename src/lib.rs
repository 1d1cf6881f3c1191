#![doc = "Geometry repair and derived-dataset pipeline for population cartograms"]
mod common;
mod config;
mod error;
mod geom;
mod io;
mod pipeline;
mod postprocess;
mod table;
mod tool;

#[doc(inline)]
pub use config::{default_scenarios, select_scenarios, PipelineConfig, ScenarioConfig, ScenarioFile, TableSchema};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use geom::{
    check_shape, count_invalid, is_valid_shape, repair, repair_file, Invalidity, RepairOptions, RepairOutcome,
    DEFAULT_MIN_POLYGON_AREA,
};

#[doc(inline)]
pub use io::{svg::fix_fill_rule, FeatureCollection, Shape};

#[doc(inline)]
pub use pipeline::{FailureKind, Pipeline, PipelineReport, ScenarioReport, ScenarioStatus, MISSING_OUTPUT_EXIT_CODE};

#[doc(inline)]
pub use postprocess::{cartogram_output_path, post_process, valid_sibling, PostProcessResult};

#[doc(inline)]
pub use table::{build_table, AttributeRow, AttributeTable};

#[doc(inline)]
pub use tool::{CartogramTool, ExternalTool, ToolOptions, ToolOutput, DEFAULT_TOOL_PATH};
