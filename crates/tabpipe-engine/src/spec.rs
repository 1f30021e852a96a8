use serde::{Deserialize, Serialize};

/// YAML description of a pipeline: a source, a chain of filters and an
/// optional sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub source: SourceSpec,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub sink: Option<SinkSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Paths, glob patterns or directories.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Text files listing further paths or globs, one per line.
    #[serde(default)]
    pub input_lists: Vec<String>,
    /// Glob pattern matching the last completed input of an earlier run.
    #[serde(default)]
    pub resume_from: Option<String>,
    /// Component spec of a loader to use instead of extension detection.
    #[serde(default)]
    pub custom_loader: Option<String>,
    /// Label column override: `first`, `last` or a 1-based number.
    #[serde(default)]
    pub label_index: Option<String>,
    /// Read row by row instead of one dataset per input.
    #[serde(default)]
    pub incremental: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Component spec of the transform to instantiate.
    #[serde(default)]
    pub transform: Option<String>,
    /// Rebind the transform on every batch instead of only the first.
    #[serde(default)]
    pub always_reinitialize: bool,
    /// Restore the transform from this persisted state file.
    #[serde(default)]
    pub load_from: Option<String>,
    /// Persist the bound transform state here after every call.
    #[serde(default)]
    pub save_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSpec {
    /// Output path template; may reference session placeholders such as
    /// `{INPUT_STEM}`.
    pub output: String,
    /// Component spec of a saver to use instead of extension detection.
    #[serde(default)]
    pub custom_saver: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_pipeline_document() {
        let text = r#"
source:
  inputs: ["data/*.arff"]
  resume_from: "*/0042.arff"
  label_index: last
filters:
  - transform: "normalize -scale 2.0"
    save_to: "out/normalize.state"
sink:
  output: "out/{INPUT_STEM}.csv"
"#;
        let spec: PipelineSpec = serde_yaml::from_str(text).unwrap();
        assert_eq!(spec.source.inputs, vec!["data/*.arff"]);
        assert_eq!(spec.source.label_index.as_deref(), Some("last"));
        assert_eq!(spec.filters.len(), 1);
        assert_eq!(
            spec.filters[0].transform.as_deref(),
            Some("normalize -scale 2.0")
        );
        assert_eq!(spec.sink.unwrap().output, "out/{INPUT_STEM}.csv");
    }

    #[test]
    fn sink_and_filters_are_optional() {
        let spec: PipelineSpec =
            serde_yaml::from_str("source:\n  inputs: [\"a.csv\"]\n").unwrap();
        assert!(spec.filters.is_empty());
        assert!(spec.sink.is_none());
    }
}
