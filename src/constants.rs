/// Constants describing the canonical identifier universe.
pub mod universe {
    /// Prefix shared by every canonical validation-set identifier.
    pub const VALIDATION_ID_PREFIX: &str = "ILSVRC2012_val_";
    /// Suffix shared by every canonical validation-set identifier.
    pub const VALIDATION_ID_SUFFIX: &str = ".JPEG";
    /// Zero-padded width of the numeric portion of an identifier.
    pub const VALIDATION_ID_WIDTH: usize = 8;
    /// Number of records in the canonical validation set.
    pub const VALIDATION_SET_SIZE: usize = 50_000;
}

/// Canonical column names shared by materialized tables.
pub mod columns {
    /// Record identifier column.
    pub const ID: &str = "id";
    /// Category column (one of the five taxonomy letters).
    pub const CATEGORY: &str = "category";
    /// Validation signature column.
    pub const VALIDATION: &str = "validation";
    /// Original (pre-re-annotation) label column.
    pub const ORIGINAL_LABEL: &str = "original_label";
    /// Proposed replacement labels column.
    pub const PROPOSED_LABELS: &str = "proposed_labels";
    /// Per-source manual evaluation flag column.
    pub const MANUALLY_EVALUATED: &str = "manually_evaluated";
    /// Canonical column order for concatenated verified tables.
    pub const VERIFIED_COLUMN_ORDER: [&str; 5] =
        [ID, CATEGORY, VALIDATION, ORIGINAL_LABEL, PROPOSED_LABELS];
}

/// Constants used by validation signature encoding.
pub mod signature {
    /// Mark emitted once per source that manually confirmed a record.
    pub const CONFIRM_MARK: char = '+';
    /// Mark emitted once per source that declined (did not confirm) a record.
    pub const DECLINE_MARK: char = '*';
    /// Fixed position of the `validation` column in verified tables.
    pub const VALIDATION_COLUMN_POSITION: usize = 2;
}

/// Default categorizer configuration values.
pub mod categorize {
    /// Default size of the class-label space; labels must fall in `0..space`.
    pub const DEFAULT_LABEL_SPACE: u32 = 1_000;
    /// Default vote count a quorum outcome must reach to win.
    pub const DEFAULT_QUORUM_MAJORITY: u32 = 3;
    /// Delimiter used when rendering proposed labels as a single string.
    pub const PROPOSED_LABELS_DELIMITER: &str = ", ";
}
