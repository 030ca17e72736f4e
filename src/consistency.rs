//! Consistency resolution over merged per-source column families.
//!
//! A merged row carries one value per source for each logical attribute.
//! Collapsing replaces the family with a single value when all sources agree
//! and with an explicit conflict marker otherwise. Conflict is a tagged
//! result, never a sentinel mixed into the value domain, so it can never be
//! confused with a legitimate label.

use serde::{Deserialize, Serialize};

use crate::data::{Record, Value};
use crate::merge::{MergedRow, MergedTable};
use crate::types::ColumnName;

/// Result of collapsing a per-source value family.
///
/// `Consistent(None)` means every source left the attribute missing; a mix
/// of missing and present values is a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collapsed<T> {
    /// All non-missing values agreed (or all were missing).
    Consistent(Option<T>),
    /// The sources disagree on this attribute.
    Conflicting,
}

impl<T> Collapsed<T> {
    /// True when the family disagreed.
    pub fn is_conflicting(&self) -> bool {
        matches!(self, Collapsed::Conflicting)
    }

    /// The agreed value, if the family was consistent and present.
    pub fn consistent_value(&self) -> Option<&T> {
        match self {
            Collapsed::Consistent(value) => value.as_ref(),
            Collapsed::Conflicting => None,
        }
    }
}

/// A logical record attribute carried once per source in a merged row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// Taxonomy category.
    Category,
    /// Label assigned before re-annotation.
    OriginalLabel,
    /// Proposed replacement labels; an empty list reads as missing.
    ProposedLabels,
    /// Manual-evaluation flag.
    ManuallyEvaluated,
    /// Source-specific extra column; a null cell reads as missing.
    Extra(ColumnName),
}

impl Attribute {
    /// Extract this attribute from one source's record, `None` when missing.
    pub fn value_of(&self, record: &Record) -> Option<Value> {
        match self {
            Attribute::Category => Some(Value::Category(record.category())),
            Attribute::OriginalLabel => Some(Value::Int(i64::from(record.original_label()))),
            Attribute::ProposedLabels => {
                if record.proposed_labels().is_empty() {
                    None
                } else {
                    Some(Value::Labels(record.proposed_labels().to_vec()))
                }
            }
            Attribute::ManuallyEvaluated => record.manually_evaluated().map(Value::Bool),
            Attribute::Extra(column) => record
                .extras()
                .get(column)
                .filter(|value| !value.is_null())
                .cloned(),
        }
    }
}

/// Collapse an explicit value family.
///
/// Idempotent: a single-element family collapses to its own value unchanged.
pub fn collapse_values<T: PartialEq + Clone>(values: &[Option<T>]) -> Collapsed<T> {
    let Some(first) = values.first() else {
        return Collapsed::Consistent(None);
    };
    if values[1..].iter().all(|value| value == first) {
        Collapsed::Consistent(first.clone())
    } else {
        Collapsed::Conflicting
    }
}

/// Collapse one attribute family of a merged row.
pub fn collapse_row(row: &MergedRow, attribute: &Attribute) -> Collapsed<Value> {
    let values: Vec<Option<Value>> = row
        .cells
        .iter()
        .map(|record| attribute.value_of(record))
        .collect();
    collapse_values(&values)
}

/// Collapse one attribute family for every row, row-aligned with the table.
pub fn collapse(table: &MergedTable, attribute: &Attribute) -> Vec<Collapsed<Value>> {
    table
        .rows()
        .iter()
        .map(|row| collapse_row(row, attribute))
        .collect()
}

/// Split a merged table into (consistent, conflicting) halves for an
/// attribute, preserving row order on both sides.
pub fn partition_consistent(
    table: &MergedTable,
    attribute: &Attribute,
) -> (MergedTable, MergedTable) {
    let mut consistent = Vec::new();
    let mut conflicting = Vec::new();
    for row in table.rows() {
        if collapse_row(row, attribute).is_conflicting() {
            conflicting.push(row.clone());
        } else {
            consistent.push(row.clone());
        }
    }
    (table.with_rows(consistent), table.with_rows(conflicting))
}

/// Keep only rows whose attribute family agrees across all sources.
pub fn filter_inconsistent(table: &MergedTable, attribute: &Attribute) -> MergedTable {
    partition_consistent(table, attribute).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Category, CategoryOutcome};
    use crate::merge::{intersect_and_merge, JoinKey};
    use crate::table::RecordTable;

    fn record(id: &str, category: Category, original: u32, proposed: Vec<u32>) -> Record {
        Record::new(
            id,
            original,
            CategoryOutcome {
                category,
                proposed_labels: proposed,
                manually_evaluated: None,
            },
        )
        .unwrap()
    }

    fn merged(tables: &[&RecordTable]) -> MergedTable {
        intersect_and_merge(tables, &[JoinKey::Id], None).unwrap().0
    }

    #[test]
    fn collapse_values_distinguishes_missing_patterns() {
        assert_eq!(
            collapse_values(&[Some(3), Some(3)]),
            Collapsed::Consistent(Some(3))
        );
        assert_eq!(collapse_values(&[Some(3), Some(4)]), Collapsed::Conflicting);
        assert_eq!(
            collapse_values::<u32>(&[None, None]),
            Collapsed::Consistent(None)
        );
        assert_eq!(collapse_values(&[None, Some(3)]), Collapsed::Conflicting);
        assert_eq!(collapse_values(&[Some(3), None]), Collapsed::Conflicting);
    }

    #[test]
    fn collapse_is_idempotent_on_single_column_families() {
        assert_eq!(
            collapse_values(&[Some("same")]),
            Collapsed::Consistent(Some("same"))
        );
        assert_eq!(collapse_values::<u32>(&[None]), Collapsed::Consistent(None));
    }

    #[test]
    fn category_disagreement_collapses_to_conflict() {
        let left = RecordTable::from_records(
            "left",
            vec![record("a", Category::A, 1, vec![1])],
        )
        .unwrap();
        let right = RecordTable::from_records(
            "right",
            vec![record("a", Category::B, 1, vec![2])],
        )
        .unwrap();

        let overlap = merged(&[&left, &right]);
        let collapsed = collapse(&overlap, &Attribute::Category);
        assert_eq!(collapsed, vec![Collapsed::Conflicting]);

        let filtered = filter_inconsistent(&overlap, &Attribute::Category);
        assert!(filtered.is_empty());
    }

    #[test]
    fn partition_keeps_conflicting_rows_visible() {
        let left = RecordTable::from_records(
            "left",
            vec![
                record("a", Category::A, 1, vec![1]),
                record("b", Category::B, 2, vec![5]),
            ],
        )
        .unwrap();
        let right = RecordTable::from_records(
            "right",
            vec![
                record("a", Category::A, 1, vec![1]),
                record("b", Category::B, 2, vec![6]),
            ],
        )
        .unwrap();

        let overlap = merged(&[&left, &right]);
        let (agree, disagree) = partition_consistent(&overlap, &Attribute::ProposedLabels);
        assert_eq!(agree.ids().collect::<Vec<_>>(), ["a"]);
        assert_eq!(disagree.ids().collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn original_label_conflict_matches_shared_and_differing_rows() {
        let left = RecordTable::from_records(
            "left",
            vec![
                record("a", Category::A, 7, vec![7]),
                record("b", Category::A, 3, vec![3]),
            ],
        )
        .unwrap();
        let right = RecordTable::from_records(
            "right",
            vec![
                record("a", Category::A, 7, vec![7]),
                record("b", Category::A, 4, vec![4]),
            ],
        )
        .unwrap();

        let overlap = merged(&[&left, &right]);
        let collapsed = collapse(&overlap, &Attribute::OriginalLabel);
        assert_eq!(collapsed[0], Collapsed::Consistent(Some(Value::Int(7))));
        assert_eq!(collapsed[1], Collapsed::Conflicting);
    }

    #[test]
    fn all_missing_flags_collapse_consistently() {
        let left =
            RecordTable::from_records("left", vec![record("a", Category::Z, 1, Vec::new())])
                .unwrap();
        let right =
            RecordTable::from_records("right", vec![record("a", Category::Z, 1, Vec::new())])
                .unwrap();

        let overlap = merged(&[&left, &right]);
        assert_eq!(
            collapse(&overlap, &Attribute::ManuallyEvaluated),
            vec![Collapsed::Consistent(None)]
        );
        assert_eq!(
            collapse(&overlap, &Attribute::ProposedLabels),
            vec![Collapsed::Consistent(None)]
        );
    }
}
