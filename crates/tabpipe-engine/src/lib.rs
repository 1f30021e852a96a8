pub mod filter;
pub mod locate;
pub mod pipeline;
pub mod read;
pub mod runner;
pub mod spec;
pub mod write;

pub use filter::TransformFilter;
pub use locate::locate_files;
pub use pipeline::Pipeline;
pub use read::RecordReader;
pub use runner::{build_pipeline, run_pipeline};
pub use spec::{FilterSpec, PipelineSpec, SinkSpec, SourceSpec};
pub use write::RecordWriter;
