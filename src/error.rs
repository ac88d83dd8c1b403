use std::path::PathBuf;

use thiserror::Error;

/// Typed failures of the ingestion pipeline.
///
/// File-level I/O and format errors travel as `anyhow::Error` with context;
/// these variants stay downcastable through that context.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A cell could not be interpreted as its column's type.
    #[error("row {row}, column '{column}': cannot read {value:?} ({reason})")]
    MalformedInput {
        column: String,
        row: usize,
        value: String,
        reason: String,
    },

    /// A required column is absent from a loaded table.
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    /// Roster position outside the known set.
    #[error("unknown position label '{0}'")]
    UnknownPosition(String),

    /// The processed export could not be written.
    #[error("cannot write processed table to {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;
