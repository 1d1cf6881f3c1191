use std::path::{Path, PathBuf};

/// Errors that abort a pipeline step.
///
/// Expected outcomes of a scenario run (nonzero tool exit, missing cartogram
/// output, absent optional artifacts) are reported as values, not errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Missing cartogram binary: {}", .0.display())]
    ToolMissing(PathBuf),

    #[error("Required artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("[geojson] {0}")]
    MalformedCollection(String),

    #[error("[geojson] feature {feature}: {message}")]
    GeometryParse { feature: usize, message: String },

    #[error("[table] feature {feature}: {message}")]
    Attribute { feature: usize, message: String },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("[io::csv] {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown scenario {0:?}")]
    UnknownScenario(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json { path: path.to_path_buf(), source }
    }

    /// Process exit code for a run aborted by this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingInput(_) => 1,
            Self::ToolMissing(_) => 2,
            _ => 1,
        }
    }
}
