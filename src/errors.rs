use thiserror::Error;

use crate::types::{ColumnName, RecordId, SourceId};

/// Error type for categorization, intersection, and orchestration failures.
///
/// Cross-source disagreement is never an error; it is represented as
/// [`crate::consistency::Collapsed::Conflicting`] and stays visible to
/// callers who want to inspect conflicts instead of discarding them.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("source '{source_id}' produced a malformed annotation signal: {details}")]
    InvalidSignal {
        source_id: SourceId,
        details: String,
    },
    #[error("intersection requires a non-empty input: {0}")]
    EmptyInput(&'static str),
    #[error("source '{source_id}' has no column '{column}' requested as a join key")]
    SchemaMismatch {
        source_id: SourceId,
        column: ColumnName,
    },
    #[error("source '{source_id}' already contains record '{id}'")]
    DuplicateId { source_id: SourceId, id: RecordId },
    #[error("record '{id}' violates the taxonomy: {details}")]
    InvalidRecord { id: RecordId, details: String },
    #[error("row arity {actual} does not match the {expected}-column table")]
    RowArityMismatch { expected: usize, actual: usize },
    #[error("slicer state is not initialized: {0}")]
    NotInitialized(&'static str),
    #[error("slicer collection is empty: {0}")]
    EmptyCollection(&'static str),
}
