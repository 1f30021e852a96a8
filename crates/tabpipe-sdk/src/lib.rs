pub mod component;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod session;

pub use component::ComponentSpec;
pub use engine::{DatasetLoader, DatasetSaver, Lifecycle, RowStream, Transform};
pub use error::{PipelineError, Result};
pub use record::{
    Attribute, AttributeKind, Dataset, LabelIndex, Record, RecordKind, Row, Schema, Value,
};
pub use registry::ComponentRegistry;
pub use session::Session;
