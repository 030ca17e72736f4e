#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Categorization of raw annotation signals.
pub mod categorize;
/// Consistency resolution over merged per-source column families.
pub mod consistency;
/// Centralized constants for the universe, columns, and categorizer defaults.
pub mod constants;
/// Record, category taxonomy, and cell value types.
pub mod data;
/// Cross-source intersection engine.
pub mod merge;
/// Validation signature encoding.
pub mod signature;
/// Top-level reconciliation orchestrator.
pub mod slicer;
/// Per-source record tables and materialized table views.
pub mod table;
/// Shared type aliases.
pub mod types;
/// The closed identifier universe shared by all sources.
pub mod universe;

mod errors;

pub use categorize::{AnnotationSignal, Categorizer, ReviewTag, VoteCounts};
pub use consistency::{
    collapse, collapse_row, collapse_values, filter_inconsistent, partition_consistent,
    Attribute, Collapsed,
};
pub use data::{Category, CategoryOutcome, Record, Value};
pub use errors::ReconcileError;
pub use merge::{find_all_intersections, intersect_and_merge, JoinKey, MergedRow, MergedTable, RowKey};
pub use signature::{build_signature, row_signature};
pub use slicer::Slicer;
pub use table::{RecordTable, Table};
pub use types::{ColumnName, Label, RawLabel, RecordId, SourceId};
pub use universe::{FixedUniverse, UniverseResolver, ValidationUniverse};
