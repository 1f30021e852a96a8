use std::path::PathBuf;

use crate::record::RecordKind;

/// Error taxonomy for pipeline construction and execution.
///
/// All variants are fatal: they propagate to the pipeline driver, which
/// releases the external runtime and re-raises. External engine failures
/// pass through unmodified via [`PipelineError::External`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or contradictory setup, raised at initialization.
    #[error("configuration error: {0}")]
    Config(String),

    /// The resolved input set was empty.
    #[error("no input resources resolved")]
    EmptyInput,

    /// The resume pattern matched none of the resolved inputs.
    #[error("resume pattern matched no resolved input: {0}")]
    ResumeNotMatched(String),

    /// No loader registered for the file's extension.
    #[error("no loader found for: {}", .0.display())]
    NoLoader(PathBuf),

    /// No saver registered for the file's extension.
    #[error("no saver found for: {}", .0.display())]
    NoSaver(PathBuf),

    /// A component spec referenced an identifier the registry does not know.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// Adjacent stages have no record kind in common, raised at build time.
    #[error("incompatible stages: {producer} cannot feed {consumer}")]
    Composition { producer: String, consumer: String },

    /// A stage received a record kind outside its accepted set.
    #[error("stage {stage} does not accept {kind} records")]
    UnsupportedRecord { stage: String, kind: RecordKind },

    /// An output template could not be fully resolved.
    #[error("unresolved placeholder: {0}")]
    Placeholder(String),

    /// A record violated its schema (wrong arity, bad label index).
    #[error("schema violation: {0}")]
    Schema(String),

    /// Failure raised by the external engine, passed through unmodified.
    #[error(transparent)]
    External(#[from] anyhow::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
