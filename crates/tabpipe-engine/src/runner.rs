use tabpipe_sdk::{ComponentRegistry, Lifecycle, Result, Session};

use crate::filter::TransformFilter;
use crate::pipeline::Pipeline;
use crate::read::RecordReader;
use crate::spec::PipelineSpec;
use crate::write::RecordWriter;

/// Build a validated pipeline from its YAML description.
pub fn build_pipeline(spec: &PipelineSpec, registry: &ComponentRegistry) -> Result<Pipeline> {
    let reader = RecordReader::from_spec(&spec.source)?;
    let filters = spec.filters.iter().map(TransformFilter::from_spec).collect();
    let writer = spec.sink.as_ref().map(RecordWriter::from_spec);
    Pipeline::build(reader, filters, writer, registry)
}

/// Build and run a pipeline in a fresh session.
pub fn run_pipeline(
    spec: &PipelineSpec,
    registry: &ComponentRegistry,
    lifecycle: Option<&mut dyn Lifecycle>,
) -> Result<()> {
    let mut pipeline = build_pipeline(spec, registry)?;
    let mut session = Session::new();
    pipeline.execute(&mut session, registry, lifecycle)
}
