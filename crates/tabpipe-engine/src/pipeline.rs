use tabpipe_sdk::{
    ComponentRegistry, Lifecycle, PipelineError, Record, RecordKind, Result, Session,
};

use crate::filter::TransformFilter;
use crate::read::RecordReader;
use crate::write::RecordWriter;

/// A validated reader → filters → writer composition.
///
/// Built once, executed once. Composition errors surface at build time,
/// before any record is pulled.
pub struct Pipeline {
    reader: RecordReader,
    filters: Vec<TransformFilter>,
    writer: Option<RecordWriter>,
}

impl Pipeline {
    /// Initialize every stage and validate the composition contract.
    pub fn build(
        mut reader: RecordReader,
        mut filters: Vec<TransformFilter>,
        mut writer: Option<RecordWriter>,
        registry: &ComponentRegistry,
    ) -> Result<Self> {
        reader.initialize(registry)?;
        for filter in &mut filters {
            filter.initialize()?;
        }
        if let Some(writer) = &mut writer {
            writer.initialize(registry)?;
        }
        let pipeline = Self {
            reader,
            filters,
            writer,
        };
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Check that each stage's generated kinds intersect the next stage's
    /// accepted kinds.
    fn validate(&self) -> Result<()> {
        let mut producer = self.reader.name();
        let mut generated = self.reader.generates();
        for filter in &self.filters {
            check_link(producer, generated, filter.name(), filter.accepts())?;
            producer = filter.name();
            generated = filter.generates();
        }
        if let Some(writer) = &self.writer {
            check_link(producer, generated, writer.name(), writer.accepts())?;
        }
        Ok(())
    }

    /// Run the pipeline to completion, driving one produced unit at a time
    /// through every stage before pulling the next.
    ///
    /// When lifecycle hooks are supplied, `start` runs before the first
    /// pull and `stop` runs after completion or failure; a stop failure
    /// never masks the original error.
    pub fn execute(
        &mut self,
        session: &mut Session,
        registry: &ComponentRegistry,
        lifecycle: Option<&mut dyn Lifecycle>,
    ) -> Result<()> {
        match lifecycle {
            Some(hooks) => {
                hooks.start(session)?;
                let outcome = self.drive(session, registry);
                let stopped = hooks.stop(session);
                match outcome {
                    Ok(()) => stopped,
                    Err(err) => {
                        if let Err(stop_err) = stopped {
                            log::warn!("lifecycle stop failed after pipeline error: {stop_err}");
                        }
                        Err(err)
                    }
                }
            }
            None => self.drive(session, registry),
        }
    }

    fn drive(&mut self, session: &mut Session, registry: &ComponentRegistry) -> Result<()> {
        while !self.reader.has_finished() {
            let produced = self.reader.read(session, registry)?;
            for record in produced {
                let mut items = vec![record?];
                for filter in &mut self.filters {
                    guard_kinds(filter.name(), filter.accepts(), &items)?;
                    items = filter.process(items, session, registry)?;
                }
                if let Some(writer) = &mut self.writer {
                    guard_kinds(writer.name(), writer.accepts(), &items)?;
                    writer.write(items, session, registry)?;
                }
            }
        }
        Ok(())
    }
}

fn check_link(
    producer: &str,
    generated: &[RecordKind],
    consumer: &str,
    accepted: &[RecordKind],
) -> Result<()> {
    if generated.iter().any(|kind| accepted.contains(kind)) {
        Ok(())
    } else {
        Err(PipelineError::Composition {
            producer: producer.to_string(),
            consumer: consumer.to_string(),
        })
    }
}

fn guard_kinds(stage: &str, accepted: &[RecordKind], items: &[Record]) -> Result<()> {
    for item in items {
        if !accepted.contains(&item.kind()) {
            return Err(PipelineError::UnsupportedRecord {
                stage: stage.to_string(),
                kind: item.kind(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incompatible_link_is_rejected() {
        let err = check_link(
            "load-records",
            &[RecordKind::Row],
            "save-records",
            &[RecordKind::Dataset],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Composition { .. }));
    }

    #[test]
    fn overlapping_link_is_accepted() {
        check_link(
            "load-records",
            &[RecordKind::Dataset],
            "filter-records",
            &[RecordKind::Dataset, RecordKind::Row],
        )
        .unwrap();
    }
}
