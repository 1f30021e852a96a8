use std::path::PathBuf;

use tabpipe_sdk::{
    ComponentRegistry, ComponentSpec, DatasetSaver, PipelineError, Record, RecordKind, Result,
    Session,
};

use crate::spec::SinkSpec;

const DATASET_ONLY: &[RecordKind] = &[RecordKind::Dataset];

/// Serializes outgoing datasets, resolving the output template against the
/// session immediately before each write.
///
/// Resolution is per item, never cached, so one writer fans out to a
/// different physical path per incoming item when the template references
/// the current input.
pub struct RecordWriter {
    output: String,
    custom_saver: Option<String>,
    saver: Option<Box<dyn DatasetSaver>>,
}

impl RecordWriter {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            custom_saver: None,
            saver: None,
        }
    }

    pub fn from_spec(spec: &SinkSpec) -> Self {
        Self {
            output: spec.output.clone(),
            custom_saver: spec.custom_saver.clone(),
            saver: None,
        }
    }

    pub fn with_custom_saver(mut self, spec: impl Into<String>) -> Self {
        self.custom_saver = Some(spec.into());
        self
    }

    pub fn name(&self) -> &'static str {
        "save-records"
    }

    pub fn accepts(&self) -> &'static [RecordKind] {
        DATASET_ONLY
    }

    /// Instantiate the custom saver, if any.
    pub fn initialize(&mut self, registry: &ComponentRegistry) -> Result<()> {
        if let Some(text) = &self.custom_saver {
            let spec = ComponentSpec::parse(text)?;
            log::info!("instantiating custom saver: {spec}");
            self.saver = Some(registry.build_saver(&spec)?);
        }
        Ok(())
    }

    pub fn write(
        &mut self,
        records: Vec<Record>,
        session: &Session,
        registry: &ComponentRegistry,
    ) -> Result<()> {
        for record in records {
            let data = match record {
                Record::Dataset(data) => data,
                Record::Row(_) => {
                    return Err(PipelineError::UnsupportedRecord {
                        stage: self.name().to_string(),
                        kind: RecordKind::Row,
                    })
                }
            };
            let path = PathBuf::from(session.expand_placeholders(&self.output)?);

            let mut detected;
            let saver: &mut dyn DatasetSaver = match self.saver.as_deref_mut() {
                Some(saver) => saver,
                None => {
                    detected = registry.saver_for_path(&path)?;
                    &mut *detected
                }
            };

            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            log::info!("writing {} rows to {}", data.num_rows(), path.display());
            saver.save(&data, &path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tabpipe_sdk::{Attribute, Dataset, Schema, Value};

    /// Saver that records every path it was asked to write.
    struct SpySaver {
        written: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl DatasetSaver for SpySaver {
        fn save(&mut self, _data: &Dataset, path: &Path) -> Result<()> {
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn spy_registry(written: Arc<Mutex<Vec<PathBuf>>>) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register_saver("spy", move |_| {
            Ok(Box::new(SpySaver {
                written: Arc::clone(&written),
            }))
        });
        registry.register_saver_extension("csv", "spy");
        registry
    }

    fn dataset() -> Record {
        let schema = Arc::new(Schema::new("out", vec![Attribute::numeric("x")]));
        let mut data = Dataset::new(schema);
        data.push_row(vec![Value::Numeric(1.0)]).unwrap();
        Record::Dataset(data)
    }

    #[test]
    fn resolves_template_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let written = Arc::new(Mutex::new(Vec::new()));
        let registry = spy_registry(Arc::clone(&written));
        let template = dir.path().join("{INPUT_STEM}.csv");
        let mut writer = RecordWriter::new(template.to_string_lossy().into_owned());
        writer.initialize(&registry).unwrap();

        let mut session = Session::new();
        session.set_current_input(PathBuf::from("/in/first.dat"));
        writer.write(vec![dataset()], &session, &registry).unwrap();
        session.set_current_input(PathBuf::from("/in/second.dat"));
        writer.write(vec![dataset()], &session, &registry).unwrap();

        let written = written.lock().unwrap();
        assert_eq!(
            *written,
            vec![dir.path().join("first.csv"), dir.path().join("second.csv")]
        );
    }

    #[test]
    fn rejects_row_records() {
        let registry = ComponentRegistry::new();
        let schema = Arc::new(Schema::new("r", vec![Attribute::numeric("x")]));
        let row = tabpipe_sdk::Row::new(schema, vec![Value::Numeric(1.0)]).unwrap();
        let mut writer = RecordWriter::new("/tmp/out.csv");
        let session = Session::new();

        let err = writer
            .write(vec![Record::Row(row)], &session, &registry)
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedRecord { .. }));
    }

    #[test]
    fn missing_saver_is_fatal() {
        let registry = ComponentRegistry::new();
        let mut writer = RecordWriter::new("/tmp/out.unknown");
        let session = Session::new();

        let err = writer.write(vec![dataset()], &session, &registry).unwrap_err();
        assert!(matches!(err, PipelineError::NoSaver(_)));
    }
}
