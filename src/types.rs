/// Unique record identifier, drawn from a shared identifier space across
/// all annotation sources (enables cross-source joins).
/// Example: `ILSVRC2012_val_00000001.JPEG`
pub type RecordId = String;
/// Identifier for the annotation source that produced a record.
/// Examples: `consensus_relabel`, `multi_label`, `label_errors`
pub type SourceId = String;
/// Validated integer class label.
/// Example: `65` (a class index inside the configured label space)
pub type Label = u32;
/// Unvalidated label as it appears in a raw annotation signal.
/// Negative or out-of-range values are rejected by the categorizer.
pub type RawLabel = i64;
/// Name of a materialized table column.
/// Examples: `id`, `category`, `validation`, `is_problematic`
pub type ColumnName = String;
