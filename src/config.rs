//! Run configuration: scenarios, attribute table schema and pipeline settings.

use std::{collections::BTreeMap, fs, path::{Component, Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geom::DEFAULT_MIN_POLYGON_AREA;
use crate::tool::ToolOptions;

/// One named run (e.g. a historical year) with its own table and classification overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub label: String,
    /// Table file; relative paths are resolved against the output directory.
    pub table: PathBuf,
    /// Region name -> classification value, taking precedence over the stored property.
    #[serde(default)]
    pub overrides: BTreeMap<String, i64>,
}

impl ScenarioConfig {
    pub fn new(label: impl Into<String>, table: impl Into<PathBuf>) -> Self {
        Self { label: label.into(), table: table.into(), overrides: BTreeMap::new() }
    }

    pub fn with_override(mut self, name: impl Into<String>, class: i64) -> Self {
        self.overrides.insert(name.into(), class);
        self
    }

    /// Table file name without extension; the cartogram tool names its outputs after it.
    pub fn table_stem(&self) -> String {
        self.table.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.label.clone())
    }

    /// Location of the table inside `output_dir`.
    pub fn table_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.table)
    }

    /// Labels and tables name files in the output directory, so neither may leave it.
    fn check_paths(&self) -> Result<()> {
        let label = self.label.as_str();
        if label.is_empty() || label == "." || label == ".." || label.contains(['/', '\\']) {
            return Err(Error::Config(format!("scenario label {label:?} is not a plain file name component")));
        }
        let escapes = self.table.components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || self.table.file_stem().is_none() {
            return Err(Error::Config(format!(
                "scenario {label:?}: table {} must be a relative path inside the output directory",
                self.table.display(),
            )));
        }
        Ok(())
    }
}

/// The 1861 and 1863 scenarios of the Civil War population maps.
pub fn default_scenarios() -> Vec<ScenarioConfig> {
    vec![
        ScenarioConfig::new("1861", "us_state_1861_modern_data.csv")
            .with_override("Louisiana", 1)
            .with_override("Tennessee", 1)
            .with_override("Arkansas", 1),
        ScenarioConfig::new("1863", "us_state_1863_modern_data.csv"),
    ]
}

/// Keep the scenarios named in `labels`, in the order given. An empty selection keeps all.
pub fn select_scenarios(scenarios: &[ScenarioConfig], labels: &[String]) -> Result<Vec<ScenarioConfig>> {
    if labels.is_empty() { return Ok(scenarios.to_vec()) }
    labels.iter()
        .map(|label| scenarios.iter()
            .find(|s| &s.label == label)
            .cloned()
            .ok_or_else(|| Error::UnknownScenario(label.clone())))
        .collect()
}

/// Which feature properties feed the attribute table, and how it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub name_field: String,
    pub value_field: String,
    pub class_field: String,
    pub name_header: String,
    pub value_header: String,
    pub color_header: String,
    /// Color for classification value 1.
    pub class_one_color: String,
    /// Color for every other classification value.
    pub default_color: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            name_field: "statenam".into(),
            value_field: "pop1860nonslave_adj".into(),
            class_field: "confederate".into(),
            name_header: "statenam".into(),
            value_header: "Population".into(),
            color_header: "Color".into(),
            class_one_color: "#727272".into(),
            default_color: "#F1F1F1".into(),
        }
    }
}

/// Optional TOML file replacing the built-in scenarios and/or table schema.
///
/// ```toml
/// [table]
/// value_field = "pop1860"
///
/// [[scenario]]
/// label = "1861"
/// table = "us_state_1861_modern_data.csv"
/// overrides = { Louisiana = 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub table: Option<TableSchema>,
    #[serde(default, rename = "scenario")]
    pub scenarios: Vec<ScenarioConfig>,
}

impl ScenarioFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let file: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        let mut seen = std::collections::BTreeSet::new();
        for scenario in &file.scenarios {
            scenario.check_paths()?;
            if !seen.insert(scenario.label.as_str()) {
                return Err(Error::Config(format!("duplicate scenario label {:?}", scenario.label)));
            }
        }
        Ok(file)
    }
}

/// Everything one pipeline run needs. Paths are explicit; nothing is global.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub min_area: f64,
    pub skip_validation: bool,
    /// When false, no sub-polygon is discarded regardless of `min_area`.
    pub discard_small: bool,
    pub tool_options: ToolOptions,
    pub schema: TableSchema,
    /// Run in this order; the first failure stops the run.
    pub scenarios: Vec<ScenarioConfig>,
    /// Fixed run timestamp; the current local time is used when unset.
    pub timestamp: Option<String>,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            min_area: DEFAULT_MIN_POLYGON_AREA,
            skip_validation: false,
            discard_small: true,
            tool_options: ToolOptions::default(),
            schema: TableSchema::default(),
            scenarios: default_scenarios(),
            timestamp: None,
        }
    }

    /// Area threshold actually applied to the common input.
    #[inline]
    pub fn effective_min_area(&self) -> f64 {
        if self.discard_small { self.min_area } else { 0.0 }
    }

    /// `{input_stem}_valid.geojson` beside the input file.
    pub fn valid_input_path(&self) -> PathBuf {
        let stem = self.input.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.input.with_file_name(format!("{stem}_valid.geojson"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenarios_match_civil_war_years() {
        let scenarios = default_scenarios();
        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].label, "1861");
        assert_eq!(scenarios[0].overrides.get("Tennessee"), Some(&1));
        assert_eq!(scenarios[0].table_stem(), "us_state_1861_modern_data");
        assert!(scenarios[1].overrides.is_empty());
    }

    #[test]
    fn selection_follows_requested_order() {
        let all = default_scenarios();
        let picked = select_scenarios(&all, &["1863".into(), "1861".into()]).unwrap();
        assert_eq!(picked.iter().map(|s| s.label.as_str()).collect::<Vec<_>>(), ["1863", "1861"]);
        assert_eq!(select_scenarios(&all, &[]).unwrap(), all);
        assert!(matches!(select_scenarios(&all, &["1865".into()]), Err(Error::UnknownScenario(l)) if l == "1865"));
    }

    #[test]
    fn scenario_file_parses_partial_schema() {
        let file = ScenarioFile::parse(r#"
            [table]
            value_field = "pop1860"

            [[scenario]]
            label = "1862"
            table = "us_state_1862.csv"
            overrides = { Kentucky = 1 }

            [[scenario]]
            label = "1864"
            table = "us_state_1864.csv"
        "#).unwrap();

        let schema = file.table.unwrap();
        assert_eq!(schema.value_field, "pop1860");
        assert_eq!(schema.name_field, "statenam");
        assert_eq!(file.scenarios.len(), 2);
        assert_eq!(file.scenarios[0].overrides.get("Kentucky"), Some(&1));
        assert!(file.scenarios[1].overrides.is_empty());
    }

    #[test]
    fn scenario_file_rejects_duplicates() {
        let text = r#"
            [[scenario]]
            label = "1861"
            table = "a.csv"
            [[scenario]]
            label = "1861"
            table = "b.csv"
        "#;
        assert!(matches!(ScenarioFile::parse(text), Err(Error::Config(_))));
    }

    #[test]
    fn scenario_file_rejects_escaping_names() {
        for (label, table) in [("../1861", "a.csv"), ("18/61", "a.csv"), ("", "a.csv"), ("..", "a.csv"),
                               ("1861", "../a.csv"), ("1861", "/tmp/a.csv")] {
            let text = format!("[[scenario]]\nlabel = {label:?}\ntable = {table:?}\n");
            assert!(matches!(ScenarioFile::parse(&text), Err(Error::Config(_))), "{label} {table}");
        }
        let ok = ScenarioFile::parse("[[scenario]]\nlabel = \"1861-alt\"\ntable = \"tables/a.csv\"\n").unwrap();
        assert_eq!(ok.scenarios[0].label, "1861-alt");
    }

    #[test]
    fn paths_and_thresholds() {
        let mut config = PipelineConfig::new("data/us_state_1860_nspop_proj.geojson", "output");
        assert_eq!(config.valid_input_path(), Path::new("data/us_state_1860_nspop_proj_valid.geojson"));
        assert_eq!(config.effective_min_area(), DEFAULT_MIN_POLYGON_AREA);
        config.discard_small = false;
        assert_eq!(config.effective_min_area(), 0.0);
    }
}
