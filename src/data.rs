use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::categorize::PROPOSED_LABELS_DELIMITER;
use crate::errors::ReconcileError;

pub use crate::types::{ColumnName, Label, RecordId, SourceId};

/// Fixed re-annotation taxonomy.
///
/// Every categorized record falls into exactly one of these buckets, and the
/// bucket constrains the shape of its proposed labels (see [`Record`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Single proposed label, matches the original label.
    A,
    /// Single proposed label, differs from the original label.
    B,
    /// Multiple distinct proposed labels (genuinely multi-label item).
    M,
    /// Ambiguous: annotators did not reach agreement; no usable proposal.
    X,
    /// No proposal at all (record rejected or unusable).
    Z,
}

impl Category {
    /// All taxonomy values in canonical order.
    pub const ALL: [Category; 5] =
        [Category::A, Category::B, Category::M, Category::X, Category::Z];

    /// Return the single-letter name of this category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::M => "M",
            Category::X => "X",
            Category::Z => "Z",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of categorizing one raw annotation signal.
///
/// Produced by [`crate::categorize::Categorizer`]; the categorizer guarantees
/// the taxonomy invariants linking `category` to `proposed_labels`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOutcome {
    /// Taxonomy bucket derived from the signal.
    pub category: Category,
    /// Resolved replacement labels; empty for `X` and `Z`.
    pub proposed_labels: Vec<Label>,
    /// Whether a human reviewed this record in this source, when known.
    pub manually_evaluated: Option<bool>,
}

/// Typed cell value for source-specific extra columns and materialized tables.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// String cell.
    Str(String),
    /// Integer cell.
    Int(i64),
    /// Ordered label sequence cell.
    Labels(Vec<Label>),
    /// Boolean cell.
    Bool(bool),
    /// Category cell.
    Category(Category),
    /// Missing/absent cell.
    Null,
}

impl Value {
    /// True when the cell carries no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(text) => f.write_str(text),
            Value::Int(value) => write!(f, "{value}"),
            Value::Labels(labels) => f.write_str(&render_labels(labels)),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Category(category) => f.write_str(category.as_str()),
            Value::Null => Ok(()),
        }
    }
}

/// Render an ordered label sequence as a delimiter-joined string.
pub fn render_labels(labels: &[Label]) -> String {
    labels
        .iter()
        .map(|label| label.to_string())
        .collect::<Vec<_>>()
        .join(PROPOSED_LABELS_DELIMITER)
}

/// One annotated item from one source.
///
/// The category is a deterministic function of the raw annotation signal,
/// computed once at construction and never mutated afterward. Construction
/// validates the [`CategoryOutcome`] against the taxonomy, so the invariants
/// hold for every live record:
/// - `X`/`Z` => no proposed labels
/// - `A` => exactly one proposal, equal to the original label
/// - `B` => exactly one proposal, different from the original label
/// - `M` => two or more distinct proposals
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    category: Category,
    original_label: Label,
    proposed_labels: Vec<Label>,
    manually_evaluated: Option<bool>,
    is_duplicate: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    extras: IndexMap<ColumnName, Value>,
}

impl Record {
    /// Build a record from a categorization outcome.
    ///
    /// Fails with [`ReconcileError::InvalidRecord`] when the outcome breaks
    /// the link between its category and its proposed labels, so an
    /// invariant-violating record can never come to exist.
    pub fn new(
        id: impl Into<RecordId>,
        original_label: Label,
        outcome: CategoryOutcome,
    ) -> Result<Self, ReconcileError> {
        let id = id.into();
        if let Some(details) = taxonomy_violation(original_label, &outcome) {
            return Err(ReconcileError::InvalidRecord { id, details });
        }
        Ok(Self {
            id,
            category: outcome.category,
            original_label,
            proposed_labels: outcome.proposed_labels,
            manually_evaluated: outcome.manually_evaluated,
            is_duplicate: false,
            extras: IndexMap::new(),
        })
    }

    /// Append a source-specific extra column value.
    pub fn with_extra(mut self, column: impl Into<ColumnName>, value: Value) -> Self {
        self.extras.insert(column.into(), value);
        self
    }

    /// Record identifier.
    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Taxonomy bucket assigned at construction.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Class label assigned before re-annotation.
    pub fn original_label(&self) -> Label {
        self.original_label
    }

    /// Replacement labels proposed by the source; empty for `X`/`Z`.
    pub fn proposed_labels(&self) -> &[Label] {
        &self.proposed_labels
    }

    /// Whether a human reviewed this record in this source, when known.
    pub fn manually_evaluated(&self) -> Option<bool> {
        self.manually_evaluated
    }

    /// Downstream deduplication flag; always false at construction.
    pub fn is_duplicate(&self) -> bool {
        self.is_duplicate
    }

    /// Flag this record as a duplicate.
    ///
    /// The reconciliation path never calls this; it is the extension point
    /// for downstream deduplication owners.
    pub fn mark_duplicate(&mut self) {
        self.is_duplicate = true;
    }

    /// Source-specific extra columns in insertion order.
    pub fn extras(&self) -> &IndexMap<ColumnName, Value> {
        &self.extras
    }
}

fn taxonomy_violation(original_label: Label, outcome: &CategoryOutcome) -> Option<String> {
    let proposed = &outcome.proposed_labels;
    match outcome.category {
        Category::X | Category::Z if !proposed.is_empty() => Some(format!(
            "category {} admits no proposed labels, got {proposed:?}",
            outcome.category
        )),
        Category::A if proposed.len() != 1 || proposed[0] != original_label => Some(format!(
            "category A requires exactly the original label {original_label}, got {proposed:?}"
        )),
        Category::B if proposed.len() != 1 || proposed[0] == original_label => Some(format!(
            "category B requires one label differing from {original_label}, got {proposed:?}"
        )),
        Category::M if proposed.len() < 2 || has_repeats(proposed) => Some(format!(
            "category M requires two or more distinct labels, got {proposed:?}"
        )),
        _ => None,
    }
}

fn has_repeats(labels: &[Label]) -> bool {
    labels
        .iter()
        .enumerate()
        .any(|(idx, label)| labels[..idx].contains(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(category: Category, proposed: Vec<Label>) -> CategoryOutcome {
        CategoryOutcome {
            category,
            proposed_labels: proposed,
            manually_evaluated: Some(true),
        }
    }

    #[test]
    fn record_exposes_outcome_fields() {
        let record = Record::new("r1", 7, outcome(Category::B, vec![9])).unwrap();
        assert_eq!(record.id(), "r1");
        assert_eq!(record.category(), Category::B);
        assert_eq!(record.original_label(), 7);
        assert_eq!(record.proposed_labels(), &[9]);
        assert_eq!(record.manually_evaluated(), Some(true));
        assert!(!record.is_duplicate());
    }

    #[test]
    fn mark_duplicate_is_the_only_mutation() {
        let mut record = Record::new("r1", 7, outcome(Category::A, vec![7])).unwrap();
        record.mark_duplicate();
        assert!(record.is_duplicate());
        assert_eq!(record.category(), Category::A);
    }

    #[test]
    fn extras_preserve_insertion_order() {
        let record = Record::new("r1", 1, outcome(Category::Z, Vec::new()))
            .unwrap()
            .with_extra("is_problematic", Value::Bool(false))
            .with_extra("url", Value::Str("https://example".into()));
        let keys: Vec<&ColumnName> = record.extras().keys().collect();
        assert_eq!(keys, ["is_problematic", "url"]);
    }

    #[test]
    fn value_display_renders_labels_comma_joined() {
        assert_eq!(Value::Labels(vec![3, 14, 15]).to_string(), "3, 14, 15");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Category(Category::M).to_string(), "M");
    }

    #[test]
    fn construction_rejects_taxonomy_violations() {
        let violations = [
            outcome(Category::A, Vec::new()),
            outcome(Category::A, vec![8]),
            outcome(Category::B, vec![7]),
            outcome(Category::B, vec![8, 9]),
            outcome(Category::M, vec![8]),
            outcome(Category::M, vec![8, 8]),
            outcome(Category::X, vec![7]),
            outcome(Category::Z, vec![7]),
        ];
        for violation in violations {
            let result = Record::new("r1", 7, violation.clone());
            assert!(
                matches!(result, Err(ReconcileError::InvalidRecord { .. })),
                "{violation:?} must not produce a live record"
            );
        }
    }

    #[test]
    fn category_names_cover_the_taxonomy() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["A", "B", "M", "X", "Z"]);
    }
}
