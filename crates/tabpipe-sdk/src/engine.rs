//! Traits implemented by the wrapped external engine.
//!
//! The pipeline core never implements transformations or file formats
//! itself; it drives these traits and leaves the semantics to whichever
//! backend populated the [`crate::ComponentRegistry`].

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::record::{Dataset, LabelIndex, Row, Schema};
use crate::session::Session;

/// One-shot, forward-only row sequence for a single resource.
///
/// Consumed exactly once, front to back; there is no rewind.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// A configurable transformation bound to a schema.
///
/// Lifecycle: unbound until [`Transform::configure`] is called with the
/// schema of the first applicable record; re-configuring discards the
/// previous binding. The serialized form is an opaque blob whose format
/// is owned by the engine backend.
pub trait Transform {
    /// Bind the transformation to a schema.
    fn configure(&mut self, schema: &Arc<Schema>) -> Result<()>;

    fn transform_dataset(&mut self, data: &Dataset) -> Result<Dataset>;

    fn transform_row(&mut self, row: &Row) -> Result<Row>;

    /// Serialize the bound state to an opaque blob.
    fn serialize(&self) -> Result<Vec<u8>>;
}

/// Loads one resource into records, whole or row by row.
pub trait DatasetLoader {
    /// Load the whole resource as one dataset.
    fn load(&mut self, path: &Path, label: Option<LabelIndex>) -> Result<Dataset>;

    /// Open the resource for row-by-row iteration.
    fn stream(&mut self, path: &Path, label: Option<LabelIndex>) -> Result<RowStream>;
}

/// Serializes one dataset to a resource.
pub trait DatasetSaver {
    fn save(&mut self, data: &Dataset, path: &Path) -> Result<()>;
}

/// Start/stop hooks for the external heavy runtime.
///
/// `start` runs before the first reader pull, `stop` after the pipeline
/// completes or fails; the driver guarantees `stop` runs exactly once on
/// either path.
pub trait Lifecycle {
    fn start(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }
}
