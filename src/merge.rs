//! Cross-source intersection engine.
//!
//! Joins per-source record tables on structured keys, excludes rows already
//! attributed to larger overlaps, and merges the full rows of every
//! participating table. All transformations are immutable: input tables are
//! read, never modified, and merged output is built fresh.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::data::{Category, Record, Value};
use crate::errors::ReconcileError;
use crate::table::RecordTable;
use crate::types::{ColumnName, RecordId, SourceId};

/// A join column understood by the intersection engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKey {
    /// Join on the record identifier.
    Id,
    /// Join on the taxonomy category (same-category overlap).
    Category,
    /// Join on a source-specific extra column.
    Extra(ColumnName),
}

/// Structured join key extracted from one record.
///
/// Replaces name-prefix conventions: the key carries exactly the fields that
/// participated in the join, so exclusion sets and overlap bookkeeping never
/// depend on column naming.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowKey {
    /// Record identifier, when `JoinKey::Id` participated.
    pub id: Option<RecordId>,
    /// Category, when `JoinKey::Category` participated.
    pub category: Option<Category>,
    /// Extra-column values, when `JoinKey::Extra` keys participated.
    pub extras: Vec<(ColumnName, Value)>,
}

impl RowKey {
    fn for_record(record: &Record, keys: &[JoinKey]) -> RowKey {
        let mut key = RowKey {
            id: None,
            category: None,
            extras: Vec::new(),
        };
        for join in keys {
            match join {
                JoinKey::Id => key.id = Some(record.id().clone()),
                JoinKey::Category => key.category = Some(record.category()),
                JoinKey::Extra(column) => key.extras.push((
                    column.clone(),
                    record.extras().get(column).cloned().unwrap_or(Value::Null),
                )),
            }
        }
        key
    }
}

/// One row of a merged overlap: the join key plus the full record from every
/// participating source, index-aligned with [`MergedTable::sources`].
#[derive(Clone, Debug)]
pub struct MergedRow {
    /// Join key shared by all cells.
    pub key: RowKey,
    /// Full per-source records, one per participating table.
    pub cells: Vec<Record>,
}

impl MergedRow {
    /// Record identifier shared by all cells of this row.
    pub fn id(&self) -> &RecordId {
        self.cells[0].id()
    }
}

/// Rows present in every table of one source combination.
#[derive(Clone, Debug)]
pub struct MergedTable {
    sources: Vec<SourceId>,
    keys: Vec<JoinKey>,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Participating source identifiers, in combination order.
    pub fn sources(&self) -> &[SourceId] {
        &self.sources
    }

    /// Join keys this overlap was computed on.
    pub fn keys(&self) -> &[JoinKey] {
        &self.keys
    }

    /// Merged rows in first-table insertion order.
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    /// Number of merged rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the overlap is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifiers of the merged rows, in row order.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.rows.iter().map(MergedRow::id)
    }

    /// Rebuild this overlap with a row subset, keeping sources and keys.
    pub(crate) fn with_rows(&self, rows: Vec<MergedRow>) -> MergedTable {
        MergedTable {
            sources: self.sources.clone(),
            keys: self.keys.clone(),
            rows,
        }
    }
}

/// Inner-join `tables` on `keys`, drop `exclude` rows, and merge full rows.
///
/// Returns the merged table and the surviving join keys. Row order follows
/// the first table's insertion order. `exclude` implements the anti-join
/// that keeps a record out of smaller overlaps once a larger combination
/// claimed it.
///
/// The engine expects `JoinKey::Id` among the keys for exact one-row-per-id
/// joins; without it, each first-table row matches the earliest key-equal
/// row of every other table.
pub fn intersect_and_merge(
    tables: &[&RecordTable],
    keys: &[JoinKey],
    exclude: Option<&HashSet<RowKey>>,
) -> Result<(MergedTable, Vec<RowKey>), ReconcileError> {
    if tables.is_empty() {
        return Err(ReconcileError::EmptyInput("the list of tables is empty"));
    }
    if keys.is_empty() {
        return Err(ReconcileError::EmptyInput("the list of join keys is empty"));
    }
    for table in tables {
        for join in keys {
            if let JoinKey::Extra(column) = join {
                if !table.has_extra_column(column) {
                    return Err(ReconcileError::SchemaMismatch {
                        source_id: table.source().clone(),
                        column: column.clone(),
                    });
                }
            }
        }
    }

    let by_id = keys.contains(&JoinKey::Id);
    let mut rows = Vec::new();
    let mut surviving_keys = Vec::new();

    for record in tables[0].records() {
        let key = RowKey::for_record(record, keys);
        if exclude.is_some_and(|set| set.contains(&key)) {
            continue;
        }
        let mut cells = vec![record.clone()];
        let mut complete = true;
        for table in &tables[1..] {
            let candidate = if by_id {
                table
                    .get(record.id())
                    .filter(|other| RowKey::for_record(other, keys) == key)
            } else {
                table
                    .records()
                    .find(|other| RowKey::for_record(other, keys) == key)
            };
            match candidate {
                Some(other) => cells.push(other.clone()),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            surviving_keys.push(key.clone());
            rows.push(MergedRow { key, cells });
        }
    }

    let merged = MergedTable {
        sources: tables.iter().map(|table| table.source().clone()).collect(),
        keys: keys.to_vec(),
        rows,
    };
    Ok((merged, surviving_keys))
}

/// Intersect every combination of `k` tables, excluding `prior` keys.
///
/// Combinations are enumerated in lexicographic order over table positions
/// and results preserve that order. `prior` is held fixed across the whole
/// sweep of one `k`; callers iterate `k = N, N-1, .., 2` and thread the
/// accumulated keys forward so each record is attributed to the largest
/// combination of sources it belongs to.
pub fn find_all_intersections(
    tables: &[&RecordTable],
    k: usize,
    keys: &[JoinKey],
    prior: &HashSet<RowKey>,
) -> Result<(Vec<MergedTable>, Vec<RowKey>), ReconcileError> {
    if tables.is_empty() {
        return Err(ReconcileError::EmptyInput("the list of tables is empty"));
    }
    if k == 0 {
        return Err(ReconcileError::EmptyInput("the combination length is zero"));
    }

    let mut merged_tables = Vec::new();
    let mut all_keys = Vec::new();
    for combination in combinations(tables.len(), k) {
        let subset: Vec<&RecordTable> = combination.iter().map(|&idx| tables[idx]).collect();
        let (merged, surviving) = intersect_and_merge(&subset, keys, Some(prior))?;
        merged_tables.push(merged);
        all_keys.extend(surviving);
    }
    Ok((merged_tables, all_keys))
}

/// Lexicographic k-combinations of `0..n`.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }
    if k == 0 {
        // The single empty combination; the advance loop below assumes k > 0.
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    let mut current: Vec<usize> = (0..k).collect();
    loop {
        result.push(current.clone());
        // Advance the rightmost index that still has room.
        let mut pos = k;
        while pos > 0 {
            pos -= 1;
            if current[pos] != pos + n - k {
                current[pos] += 1;
                for next in pos + 1..k {
                    current[next] = current[next - 1] + 1;
                }
                break;
            }
            if pos == 0 {
                return result;
            }
        }
    }
}
