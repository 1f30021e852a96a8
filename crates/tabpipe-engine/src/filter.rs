use tabpipe_sdk::{
    ComponentRegistry, ComponentSpec, PipelineError, Record, RecordKind, Result, Session,
    Transform,
};

use crate::spec::FilterSpec;

const BOTH_KINDS: &[RecordKind] = &[RecordKind::Dataset, RecordKind::Row];

/// A stateful stage binding a transformation to the schema of the first
/// record it sees, then applying it to every subsequent record.
///
/// The transformation comes from exactly one of two sources: a live
/// component spec, or a persisted state blob (which substitutes for the
/// first bind). With `always_reinitialize` the stage rebinds on every
/// call, discarding the previous binding; otherwise the state bound at
/// the first record is reused even when later schemas differ, which is
/// the caller's responsibility to avoid misusing.
pub struct TransformFilter {
    transform_spec: Option<String>,
    load_from: Option<String>,
    save_to: Option<String>,
    always_reinitialize: bool,
    transform: Option<Box<dyn Transform>>,
    first: bool,
}

impl TransformFilter {
    pub fn from_command(spec: impl Into<String>) -> Self {
        Self {
            transform_spec: Some(spec.into()),
            load_from: None,
            save_to: None,
            always_reinitialize: false,
            transform: None,
            first: true,
        }
    }

    pub fn from_saved(path: impl Into<String>) -> Self {
        Self {
            transform_spec: None,
            load_from: Some(path.into()),
            save_to: None,
            always_reinitialize: false,
            transform: None,
            first: true,
        }
    }

    pub fn from_spec(spec: &FilterSpec) -> Self {
        Self {
            transform_spec: spec.transform.clone(),
            load_from: spec.load_from.clone(),
            save_to: spec.save_to.clone(),
            always_reinitialize: spec.always_reinitialize,
            transform: None,
            first: true,
        }
    }

    pub fn always_reinitialize(mut self, always: bool) -> Self {
        self.always_reinitialize = always;
        self
    }

    pub fn save_to(mut self, path: impl Into<String>) -> Self {
        self.save_to = Some(path.into());
        self
    }

    pub fn name(&self) -> &'static str {
        "filter-records"
    }

    pub fn accepts(&self) -> &'static [RecordKind] {
        BOTH_KINDS
    }

    pub fn generates(&self) -> &'static [RecordKind] {
        BOTH_KINDS
    }

    /// Validate the configuration and reset to the unbound state.
    pub fn initialize(&mut self) -> Result<()> {
        if self.transform_spec.is_none() && self.load_from.is_none() {
            return Err(PipelineError::Config(
                "either a transform command or a saved state file must be supplied".to_string(),
            ));
        }
        if self.transform_spec.is_some() && self.load_from.is_some() {
            return Err(PipelineError::Config(
                "a transform command and a saved state file are mutually exclusive".to_string(),
            ));
        }
        self.transform = None;
        self.first = true;
        Ok(())
    }

    /// Apply the transformation item by item, returning a list of the same
    /// cardinality and record kinds.
    pub fn process(
        &mut self,
        records: Vec<Record>,
        session: &Session,
        registry: &ComponentRegistry,
    ) -> Result<Vec<Record>> {
        if records.is_empty() {
            return Ok(records);
        }

        let mut restored = false;
        if self.first {
            if let Some(text) = &self.transform_spec {
                let spec = ComponentSpec::parse(text)?;
                log::info!("instantiating transform: {spec}");
                self.transform = Some(registry.build_transform(&spec)?);
            } else if let Some(template) = &self.load_from {
                let path = session.expand_placeholders(template)?;
                log::info!("restoring transform state from {path}");
                let blob = std::fs::read(&path)?;
                self.transform = Some(registry.restore_transform(&blob)?);
                restored = true;
            }
        }
        let transform = match self.transform.as_mut() {
            Some(transform) => transform,
            None => {
                return Err(PipelineError::Config(
                    "filter processed a record before initialization".to_string(),
                ))
            }
        };

        // A restored state substitutes for the first bind; the
        // always-reinitialize policy overrides that and rebinds anyway.
        let bind = if self.first {
            !restored || self.always_reinitialize
        } else {
            self.always_reinitialize
        };
        if bind {
            let schema = records[0].schema();
            log::info!("binding transform to relation {}", schema.relation());
            transform.configure(schema)?;
        }

        let mut result = Vec::with_capacity(records.len());
        for record in &records {
            match record {
                Record::Dataset(data) => {
                    result.push(Record::Dataset(transform.transform_dataset(data)?));
                }
                Record::Row(row) => result.push(Record::Row(transform.transform_row(row)?)),
            }
        }

        if let Some(template) = &self.save_to {
            let path = session.expand_placeholders(template)?;
            log::info!("saving transform state to {path}");
            let blob = transform.serialize()?;
            std::fs::write(&path, blob)?;
        }

        self.first = false;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tabpipe_sdk::{Attribute, Dataset, Row, Schema, Value};

    /// Transform that records every schema it is configured with.
    struct SpyTransform {
        bound: Arc<Mutex<Vec<String>>>,
    }

    impl Transform for SpyTransform {
        fn configure(&mut self, schema: &Arc<Schema>) -> Result<()> {
            self.bound.lock().unwrap().push(schema.relation().to_string());
            Ok(())
        }

        fn transform_dataset(&mut self, data: &Dataset) -> Result<Dataset> {
            Ok(data.clone())
        }

        fn transform_row(&mut self, row: &Row) -> Result<Row> {
            Ok(row.clone())
        }

        fn serialize(&self) -> Result<Vec<u8>> {
            Ok(b"spy-state".to_vec())
        }
    }

    fn spy_registry(bound: Arc<Mutex<Vec<String>>>) -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register_transform("spy", move |_| {
            Ok(Box::new(SpyTransform {
                bound: Arc::clone(&bound),
            }))
        });
        registry
    }

    fn dataset(relation: &str) -> Record {
        let schema = Arc::new(Schema::new(relation, vec![Attribute::numeric("x")]));
        let mut data = Dataset::new(schema);
        data.push_row(vec![Value::Numeric(1.0)]).unwrap();
        Record::Dataset(data)
    }

    #[test]
    fn neither_source_is_a_config_error() {
        let mut filter = TransformFilter::from_spec(&FilterSpec::default());
        assert!(matches!(
            filter.initialize(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn both_sources_are_a_config_error() {
        let mut filter = TransformFilter::from_spec(&FilterSpec {
            transform: Some("spy".to_string()),
            load_from: Some("/tmp/state.bin".to_string()),
            ..FilterSpec::default()
        });
        assert!(matches!(
            filter.initialize(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn binds_once_by_default() {
        let bound = Arc::new(Mutex::new(Vec::new()));
        let registry = spy_registry(Arc::clone(&bound));
        let mut filter = TransformFilter::from_command("spy");
        filter.initialize().unwrap();
        let session = Session::new();

        filter
            .process(vec![dataset("s1")], &session, &registry)
            .unwrap();
        filter
            .process(vec![dataset("s2")], &session, &registry)
            .unwrap();
        assert_eq!(*bound.lock().unwrap(), vec!["s1"]);
    }

    #[test]
    fn always_reinitialize_rebinds_per_batch() {
        let bound = Arc::new(Mutex::new(Vec::new()));
        let registry = spy_registry(Arc::clone(&bound));
        let mut filter = TransformFilter::from_command("spy").always_reinitialize(true);
        filter.initialize().unwrap();
        let session = Session::new();

        filter
            .process(vec![dataset("s1")], &session, &registry)
            .unwrap();
        filter
            .process(vec![dataset("s2")], &session, &registry)
            .unwrap();
        assert_eq!(*bound.lock().unwrap(), vec!["s1", "s2"]);
    }

    #[test]
    fn preserves_cardinality_and_kind() {
        let bound = Arc::new(Mutex::new(Vec::new()));
        let registry = spy_registry(bound);
        let mut filter = TransformFilter::from_command("spy");
        filter.initialize().unwrap();
        let session = Session::new();

        let out = filter
            .process(vec![dataset("s1"), dataset("s1")], &session, &registry)
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.kind() == RecordKind::Dataset));
    }

    #[test]
    fn saves_state_after_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("state.bin");
        let bound = Arc::new(Mutex::new(Vec::new()));
        let registry = spy_registry(bound);
        let mut filter = TransformFilter::from_command("spy")
            .save_to(target.to_string_lossy().into_owned());
        filter.initialize().unwrap();
        let session = Session::new();

        filter
            .process(vec![dataset("s1")], &session, &registry)
            .unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"spy-state");
        std::fs::remove_file(&target).unwrap();
        filter
            .process(vec![dataset("s2")], &session, &registry)
            .unwrap();
        assert!(target.exists(), "state must be rewritten on every call");
    }

    #[test]
    fn restored_state_substitutes_for_the_first_bind() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("state.bin");
        std::fs::write(&saved, b"spy-state").unwrap();

        let bound = Arc::new(Mutex::new(Vec::new()));
        let restore_bound = Arc::clone(&bound);
        let mut registry = ComponentRegistry::new();
        registry.register_restore_transform(move |_| {
            Ok(Box::new(SpyTransform {
                bound: Arc::clone(&restore_bound),
            }))
        });

        let mut filter = TransformFilter::from_saved(saved.to_string_lossy().into_owned());
        filter.initialize().unwrap();
        let session = Session::new();
        filter
            .process(vec![dataset("s1")], &session, &registry)
            .unwrap();
        assert!(bound.lock().unwrap().is_empty(), "no live bind after restore");
    }

    #[test]
    fn always_reinitialize_overrides_restored_state() {
        let dir = tempfile::tempdir().unwrap();
        let saved = dir.path().join("state.bin");
        std::fs::write(&saved, b"spy-state").unwrap();

        let bound = Arc::new(Mutex::new(Vec::new()));
        let restore_bound = Arc::clone(&bound);
        let mut registry = ComponentRegistry::new();
        registry.register_restore_transform(move |_| {
            Ok(Box::new(SpyTransform {
                bound: Arc::clone(&restore_bound),
            }))
        });

        let mut filter = TransformFilter::from_saved(saved.to_string_lossy().into_owned())
            .always_reinitialize(true);
        filter.initialize().unwrap();
        let session = Session::new();
        filter
            .process(vec![dataset("s1")], &session, &registry)
            .unwrap();
        assert_eq!(*bound.lock().unwrap(), vec!["s1"]);
    }
}
