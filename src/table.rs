//! Per-source record tables and the generic materialized table view.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::categorize::{AnnotationSignal, Categorizer};
use crate::constants::columns;
use crate::data::{Category, Record, Value};
use crate::errors::ReconcileError;
use crate::types::{ColumnName, RecordId, SourceId};

/// An ordered collection of categorized records from one source, keyed by id.
///
/// Identifier uniqueness within a table is required; inserting a repeated id
/// is a caller error and is rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordTable {
    source: SourceId,
    rows: IndexMap<RecordId, Record>,
}

impl RecordTable {
    /// Create an empty table for `source`.
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
            rows: IndexMap::new(),
        }
    }

    /// Build a table from prebuilt records, preserving their order.
    pub fn from_records(
        source: impl Into<SourceId>,
        records: Vec<Record>,
    ) -> Result<Self, ReconcileError> {
        let mut table = Self::new(source);
        for record in records {
            table.insert(record)?;
        }
        Ok(table)
    }

    /// Build a table by categorizing raw annotation signals.
    ///
    /// This is the seam toward data-acquisition collaborators: they supply
    /// `(id, signal)` pairs in source order, and every signal must be
    /// well-formed.
    pub fn from_signals(
        source: impl Into<SourceId>,
        categorizer: &Categorizer,
        signals: Vec<(RecordId, AnnotationSignal)>,
    ) -> Result<Self, ReconcileError> {
        let source = source.into();
        let mut table = Self::new(source.clone());
        for (id, signal) in signals {
            let record = categorizer.categorize_record(&source, id, &signal)?;
            table.insert(record)?;
        }
        Ok(table)
    }

    /// Append a record, rejecting duplicate identifiers.
    pub fn insert(&mut self, record: Record) -> Result<(), ReconcileError> {
        if self.rows.contains_key(record.id()) {
            return Err(ReconcileError::DuplicateId {
                source_id: self.source.clone(),
                id: record.id().clone(),
            });
        }
        self.rows.insert(record.id().clone(), record);
        Ok(())
    }

    /// Source identifier for this table.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.rows.get(id)
    }

    /// True when the table holds `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.rows.values()
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.rows.keys()
    }

    /// New table containing only records in the given categories.
    pub fn filter_by_categories(&self, categories: &[Category]) -> RecordTable {
        let rows = self
            .rows
            .iter()
            .filter(|(_, record)| categories.contains(&record.category()))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        RecordTable {
            source: self.source.clone(),
            rows,
        }
    }

    /// Per-category record counts (the visualization collaborator's input).
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for record in self.rows.values() {
            *counts.entry(record.category()).or_insert(0) += 1;
        }
        counts
    }

    /// Union of source-specific extra column names, in first-seen order.
    pub fn extra_columns(&self) -> Vec<ColumnName> {
        let mut seen: Vec<ColumnName> = Vec::new();
        for record in self.rows.values() {
            for column in record.extras().keys() {
                if !seen.contains(column) {
                    seen.push(column.clone());
                }
            }
        }
        seen
    }

    /// True when any record carries the extra column `column`.
    pub fn has_extra_column(&self, column: &str) -> bool {
        self.rows
            .values()
            .any(|record| record.extras().contains_key(column))
    }

    /// Materialize the uniform tabular view.
    ///
    /// Columns are `id, category, original_label, proposed_labels,
    /// manually_evaluated`, then source-specific extras appended after the
    /// common ones. Empty proposals and unknown flags render as null cells.
    pub fn materialize(&self) -> Table {
        let extras = self.extra_columns();
        let mut column_names: Vec<ColumnName> = vec![
            columns::ID.to_string(),
            columns::CATEGORY.to_string(),
            columns::ORIGINAL_LABEL.to_string(),
            columns::PROPOSED_LABELS.to_string(),
            columns::MANUALLY_EVALUATED.to_string(),
        ];
        column_names.extend(extras.iter().cloned());

        let mut table = Table::new(column_names);
        for record in self.rows.values() {
            let mut row = vec![
                Value::Str(record.id().clone()),
                Value::Category(record.category()),
                Value::Int(i64::from(record.original_label())),
                if record.proposed_labels().is_empty() {
                    Value::Null
                } else {
                    Value::Labels(record.proposed_labels().to_vec())
                },
                record
                    .manually_evaluated()
                    .map(Value::Bool)
                    .unwrap_or(Value::Null),
            ];
            for column in &extras {
                row.push(record.extras().get(column).cloned().unwrap_or(Value::Null));
            }
            // Arity matches the column list by construction.
            table.rows.push(row);
        }
        table
    }
}

/// Generic materialized table: named columns over rows of typed cells.
///
/// Used for output surfaces (the tabular contract and verified tables); the
/// reconciliation engine itself operates on typed records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<ColumnName>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<ColumnName>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting arity mismatches against the column list.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), ReconcileError> {
        if row.len() != self.columns.len() {
            return Err(ReconcileError::RowArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// Rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// New table with columns reordered to `order`.
    ///
    /// Columns absent from this table are omitted, never synthesized;
    /// columns not named in `order` are dropped.
    pub fn select_columns(&self, order: &[&str]) -> Table {
        let picks: Vec<usize> = order
            .iter()
            .filter_map(|column| self.column_index(column))
            .collect();
        let columns = picks.iter().map(|&idx| self.columns[idx].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| picks.iter().map(|&idx| row[idx].clone()).collect())
            .collect();
        Table { columns, rows }
    }

    /// Concatenate tables row-wise, preserving table order.
    ///
    /// Columns are unioned in first-seen order; cells missing from a source
    /// table are filled with nulls.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<ColumnName> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        let mut result = Table::new(columns);
        for table in tables {
            for row in &table.rows {
                let cells = result
                    .columns
                    .iter()
                    .map(|column| {
                        table
                            .column_index(column)
                            .map(|idx| row[idx].clone())
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                // One cell per unioned column by construction.
                result.rows.push(cells);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CategoryOutcome;

    fn record(id: &str, category: Category, original: u32, proposed: Vec<u32>) -> Record {
        Record::new(
            id,
            original,
            CategoryOutcome {
                category,
                proposed_labels: proposed,
                manually_evaluated: Some(true),
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut table = RecordTable::new("src");
        table.insert(record("a", Category::A, 1, vec![1])).unwrap();
        let result = table.insert(record("a", Category::B, 1, vec![2]));
        assert!(matches!(result, Err(ReconcileError::DuplicateId { .. })));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn records_keep_insertion_order() {
        let table = RecordTable::from_records(
            "src",
            vec![
                record("b", Category::A, 1, vec![1]),
                record("a", Category::B, 1, vec![2]),
            ],
        )
        .unwrap();
        let ids: Vec<&RecordId> = table.ids().collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn filter_by_categories_keeps_matching_rows() {
        let table = RecordTable::from_records(
            "src",
            vec![
                record("a", Category::A, 1, vec![1]),
                record("b", Category::B, 1, vec![2]),
                record("z", Category::Z, 1, Vec::new()),
            ],
        )
        .unwrap();
        let filtered = table.filter_by_categories(&[Category::A, Category::B]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.contains("a"));
        assert!(filtered.contains("b"));
        assert!(!filtered.contains("z"));

        let counts = table.category_counts();
        assert_eq!(counts.get(&Category::A), Some(&1));
        assert_eq!(counts.get(&Category::Z), Some(&1));
    }

    #[test]
    fn materialize_appends_extras_after_common_columns() {
        let table = RecordTable::from_records(
            "src",
            vec![
                record("a", Category::A, 1, vec![1])
                    .with_extra("is_problematic", Value::Bool(false)),
                record("b", Category::Z, 2, Vec::new()),
            ],
        )
        .unwrap();
        let view = table.materialize();
        assert_eq!(
            view.columns(),
            [
                "id",
                "category",
                "original_label",
                "proposed_labels",
                "manually_evaluated",
                "is_problematic"
            ]
        );
        // Row without the extra column gets a null cell, not a fabricated value.
        assert_eq!(view.rows()[1][5], Value::Null);
        // Empty proposals render as null.
        assert_eq!(view.rows()[1][3], Value::Null);
    }

    #[test]
    fn push_row_rejects_arity_mismatches() {
        let mut table = Table::new(vec!["id".into()]);
        let result = table.push_row(vec![Value::Str("a".into()), Value::Null]);
        assert!(matches!(
            result,
            Err(ReconcileError::RowArityMismatch {
                expected: 1,
                actual: 2
            })
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn select_columns_omits_absent_names() {
        let mut table = Table::new(vec!["id".into(), "category".into()]);
        table
            .push_row(vec![Value::Str("a".into()), Value::Category(Category::A)])
            .unwrap();
        let selected = table.select_columns(&["category", "validation", "id"]);
        assert_eq!(selected.columns(), ["category", "id"]);
        assert_eq!(
            selected.rows()[0],
            vec![Value::Category(Category::A), Value::Str("a".into())]
        );
    }

    #[test]
    fn concat_unions_columns_with_null_fill() {
        let mut left = Table::new(vec!["id".into(), "validation".into()]);
        left.push_row(vec![Value::Str("a".into()), Value::Str("+*".into())])
            .unwrap();
        let mut right = Table::new(vec!["id".into(), "original_label".into()]);
        right
            .push_row(vec![Value::Str("b".into()), Value::Int(4)])
            .unwrap();

        let combined = Table::concat(&[left, right]);
        assert_eq!(combined.columns(), ["id", "validation", "original_label"]);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.rows()[0][2], Value::Null);
        assert_eq!(combined.rows()[1][1], Value::Null);
    }
}
