use std::collections::VecDeque;
use std::path::PathBuf;

use tabpipe_sdk::{
    ComponentRegistry, ComponentSpec, DatasetLoader, LabelIndex, PipelineError, Record,
    RecordKind, Result, Session,
};

use crate::locate::locate_files;
use crate::spec::SourceSpec;

const DATASET_ONLY: &[RecordKind] = &[RecordKind::Dataset];
const ROW_ONLY: &[RecordKind] = &[RecordKind::Row];

/// Reads datasets (or rows, in incremental mode) from a resolved list of
/// input resources, one resource per pull.
///
/// The resource list is resolved exactly once, on the first pull, and then
/// consumed destructively front to back. Each pull publishes the popped
/// path as the session's current input before any record is produced.
pub struct RecordReader {
    sources: Vec<String>,
    source_lists: Vec<String>,
    resume_from: Option<String>,
    custom_loader: Option<String>,
    label: Option<LabelIndex>,
    incremental: bool,
    inputs: Option<VecDeque<PathBuf>>,
    loader: Option<Box<dyn DatasetLoader>>,
}

impl RecordReader {
    pub fn new(sources: Vec<String>) -> Self {
        Self {
            sources,
            source_lists: Vec::new(),
            resume_from: None,
            custom_loader: None,
            label: None,
            incremental: false,
            inputs: None,
            loader: None,
        }
    }

    pub fn from_spec(spec: &SourceSpec) -> Result<Self> {
        let mut reader = Self::new(spec.inputs.clone());
        reader.source_lists = spec.input_lists.clone();
        reader.resume_from = spec.resume_from.clone();
        reader.custom_loader = spec.custom_loader.clone();
        reader.incremental = spec.incremental;
        if let Some(label) = &spec.label_index {
            reader.label = Some(LabelIndex::parse(label)?);
        }
        Ok(reader)
    }

    pub fn with_source_lists(mut self, lists: Vec<String>) -> Self {
        self.source_lists = lists;
        self
    }

    pub fn with_resume_from(mut self, pattern: impl Into<String>) -> Self {
        self.resume_from = Some(pattern.into());
        self
    }

    pub fn with_custom_loader(mut self, spec: impl Into<String>) -> Self {
        self.custom_loader = Some(spec.into());
        self
    }

    pub fn with_label(mut self, label: LabelIndex) -> Self {
        self.label = Some(label);
        self
    }

    pub fn incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn name(&self) -> &'static str {
        "load-records"
    }

    pub fn generates(&self) -> &'static [RecordKind] {
        if self.incremental {
            ROW_ONLY
        } else {
            DATASET_ONLY
        }
    }

    /// Instantiate the custom loader, if any, and reset the resource list.
    pub fn initialize(&mut self, registry: &ComponentRegistry) -> Result<()> {
        if let Some(text) = &self.custom_loader {
            let spec = ComponentSpec::parse(text)?;
            log::info!("instantiating custom loader: {spec}");
            self.loader = Some(registry.build_loader(&spec)?);
        }
        self.inputs = None;
        Ok(())
    }

    /// Whether every resolved resource has been consumed.
    pub fn has_finished(&self) -> bool {
        matches!(&self.inputs, Some(queue) if queue.is_empty())
    }

    /// Produce the records of the next resource: one dataset in batch
    /// mode, a one-shot row stream in incremental mode.
    pub fn read(
        &mut self,
        session: &mut Session,
        registry: &ComponentRegistry,
    ) -> Result<Box<dyn Iterator<Item = Result<Record>>>> {
        if self.inputs.is_none() {
            let files = locate_files(
                &self.sources,
                &self.source_lists,
                self.resume_from.as_deref(),
                true,
            )?;
            self.inputs = Some(files.into());
        }
        let current = self
            .inputs
            .as_mut()
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                PipelineError::Config("read called on an exhausted reader".to_string())
            })?;
        session.set_current_input(current.clone());
        log::info!("reading from {}", current.display());

        let mut detected;
        let loader: &mut dyn DatasetLoader = match self.loader.as_deref_mut() {
            Some(loader) => loader,
            None => {
                detected = registry.loader_for_path(&current)?;
                log::debug!("auto-detected loader for {}", current.display());
                &mut *detected
            }
        };

        if self.incremental {
            let rows = loader.stream(&current, self.label)?;
            Ok(Box::new(rows.map(|row| row.map(Record::Row))))
        } else {
            let data = loader.load(&current, self.label)?;
            Ok(Box::new(std::iter::once(Ok(Record::Dataset(data)))))
        }
    }
}
