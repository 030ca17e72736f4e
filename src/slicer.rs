//! Top-level reconciliation orchestrator.
//!
//! Drives the intersection engine, consistency resolver, and signature
//! builder over an ordered list of per-source tables. Derived slices are
//! written once per `reconcile` run; the source tables themselves are never
//! mutated.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::consistency::{collapse_row, partition_consistent, Attribute};
use crate::constants::columns;
use crate::data::Value;
use crate::errors::ReconcileError;
use crate::merge::{find_all_intersections, JoinKey, MergedTable, RowKey};
use crate::signature::row_signature;
use crate::table::{RecordTable, Table};
use crate::types::RecordId;
use crate::universe::{UniverseResolver, ValidationUniverse};

/// Reconciliation driver over an ordered list of per-source record tables.
///
/// `reconcile` sweeps combination sizes from all sources down to pairs so
/// every record is attributed to the largest combination it belongs to, then
/// splits the overlaps into same-category, different-category, verified, and
/// inconsistent slices.
pub struct Slicer {
    tables: Vec<RecordTable>,
    universe: Box<dyn UniverseResolver>,
    intersected: Option<Vec<MergedTable>>,
    intersected_same_cat: Option<Vec<MergedTable>>,
    intersected_diff_cat: Option<Vec<MergedTable>>,
    verified: Option<Vec<Table>>,
    inconsistent: Option<Vec<MergedTable>>,
    not_intersected: Option<BTreeSet<RecordId>>,
    verified_flat: Option<Table>,
}

impl Slicer {
    /// Slicer over `tables` with the canonical validation-set universe.
    pub fn new(tables: Vec<RecordTable>) -> Self {
        Self::with_universe(tables, ValidationUniverse::new())
    }

    /// Slicer with an injected universe resolver (synthetic domains, tests).
    pub fn with_universe(
        tables: Vec<RecordTable>,
        universe: impl UniverseResolver + 'static,
    ) -> Self {
        Self {
            tables,
            universe: Box::new(universe),
            intersected: None,
            intersected_same_cat: None,
            intersected_diff_cat: None,
            verified: None,
            inconsistent: None,
            not_intersected: None,
            verified_flat: None,
        }
    }

    /// The source tables, in orchestration order.
    pub fn tables(&self) -> &[RecordTable] {
        &self.tables
    }

    /// All identifiers: the universe when no tables are given, otherwise the
    /// union of ids across the provided tables.
    pub fn all_ids(&self, tables: Option<&[RecordTable]>) -> BTreeSet<RecordId> {
        match tables {
            None => self.universe.all_ids(),
            Some(tables) => tables
                .iter()
                .flat_map(|table| table.ids().cloned())
                .collect(),
        }
    }

    /// Universe (or caller-supplied superset) minus `intersected` ids.
    pub fn not_intersected_ids(
        &self,
        intersected: &BTreeSet<RecordId>,
        all_ids: Option<&BTreeSet<RecordId>>,
    ) -> BTreeSet<RecordId> {
        let universe = match all_ids {
            Some(ids) => ids.clone(),
            None => self.universe.all_ids(),
        };
        universe.difference(intersected).cloned().collect()
    }

    /// Run the reconciliation sweep and populate the derived slices.
    pub fn reconcile(&mut self) -> Result<(), ReconcileError> {
        let refs: Vec<&RecordTable> = self.tables.iter().collect();
        let source_count = refs.len();

        let mut intersected = Vec::new();
        let mut same_cat = Vec::new();
        let mut diff_cat = Vec::new();
        let mut verified = Vec::new();
        let mut inconsistent = Vec::new();

        let mut prior_all: HashSet<RowKey> = HashSet::new();
        let mut prior_same: HashSet<RowKey> = HashSet::new();

        if source_count >= 2 {
            for k in (2..=source_count).rev() {
                let (overlaps, claimed) =
                    find_all_intersections(&refs, k, &[JoinKey::Id], &prior_all)?;
                let (same_overlaps, same_claimed) = find_all_intersections(
                    &refs,
                    k,
                    &[JoinKey::Id, JoinKey::Category],
                    &prior_same,
                )?;
                debug!(
                    combination_size = k,
                    combinations = overlaps.len(),
                    overlap_rows = claimed.len(),
                    same_category_rows = same_claimed.len(),
                    "intersection sweep step"
                );

                for overlap in &overlaps {
                    let (_, category_conflicts) =
                        partition_consistent(overlap, &Attribute::Category);
                    if !category_conflicts.is_empty() {
                        diff_cat.push(category_conflicts);
                    }
                }
                intersected.extend(overlaps);

                for overlap in &same_overlaps {
                    let (label_agree, label_conflict) =
                        partition_consistent(overlap, &Attribute::ProposedLabels);
                    let (agreeing, original_conflict) =
                        partition_consistent(&label_agree, &Attribute::OriginalLabel);
                    if !label_conflict.is_empty() {
                        inconsistent.push(label_conflict);
                    }
                    if !original_conflict.is_empty() {
                        inconsistent.push(original_conflict);
                    }
                    verified.push(verified_table(&agreeing)?);
                }
                same_cat.extend(same_overlaps);

                prior_all.extend(claimed);
                prior_same.extend(same_claimed);
            }
        }

        let intersected_ids: BTreeSet<RecordId> = intersected
            .iter()
            .flat_map(|table| table.ids().cloned())
            .collect();
        self.not_intersected = Some(self.not_intersected_ids(&intersected_ids, None));

        self.intersected = Some(intersected);
        self.intersected_same_cat = Some(same_cat);
        self.intersected_diff_cat = Some(diff_cat);
        self.verified = Some(verified);
        self.inconsistent = Some(inconsistent);
        self.verified_flat = None;
        Ok(())
    }

    /// Per-combination overlaps joined on id, largest combinations first.
    pub fn intersected(&self) -> Option<&[MergedTable]> {
        self.intersected.as_deref()
    }

    /// Per-combination overlaps joined on id and category.
    pub fn intersected_same_cat(&self) -> Option<&[MergedTable]> {
        self.intersected_same_cat.as_deref()
    }

    /// Overlap rows whose category family conflicts across sources.
    ///
    /// Combinations without any conflicting row contribute no table here,
    /// mirroring [`Slicer::inconsistent`].
    pub fn intersected_diff_cat(&self) -> Option<&[MergedTable]> {
        self.intersected_diff_cat.as_deref()
    }

    /// Per-combination verified tables in canonical column order.
    pub fn verified(&self) -> Option<&[Table]> {
        self.verified.as_deref()
    }

    /// Same-category overlap rows dropped for label disagreement.
    pub fn inconsistent(&self) -> Option<&[MergedTable]> {
        self.inconsistent.as_deref()
    }

    /// Identifiers not attributed to any overlap.
    pub fn not_intersected(&self) -> Option<&BTreeSet<RecordId>> {
        self.not_intersected.as_ref()
    }

    /// Identifiers across all id-joined overlaps.
    pub fn all_intersected_ids(&self) -> Result<BTreeSet<RecordId>, ReconcileError> {
        merged_ids(self.intersected.as_deref(), "intersected tables")
    }

    /// Identifiers across all same-category overlaps.
    pub fn all_same_cat_ids(&self) -> Result<BTreeSet<RecordId>, ReconcileError> {
        merged_ids(
            self.intersected_same_cat.as_deref(),
            "same-category tables",
        )
    }

    /// Identifiers across all verified tables.
    pub fn all_verified_ids(&self) -> Result<BTreeSet<RecordId>, ReconcileError> {
        let verified = self
            .verified
            .as_deref()
            .ok_or(ReconcileError::NotInitialized("verified tables"))?;
        let mut ids = BTreeSet::new();
        for table in verified {
            if let Some(idx) = table.column_index(columns::ID) {
                for row in table.rows() {
                    if let Value::Str(id) = &row[idx] {
                        ids.insert(id.clone());
                    }
                }
            }
        }
        Ok(ids)
    }

    /// Concatenate all verified tables into one, in canonical column order
    /// (`id, category, validation, original_label, proposed_labels`).
    ///
    /// Source-table order is preserved. Fails with `NotInitialized` before a
    /// reconciliation run and `EmptyCollection` when the run produced no
    /// verified tables.
    pub fn concat_verified(&mut self) -> Result<Table, ReconcileError> {
        let verified = self
            .verified
            .as_deref()
            .ok_or(ReconcileError::NotInitialized("verified tables"))?;
        if verified.is_empty() {
            return Err(ReconcileError::EmptyCollection("the verified table list"));
        }
        let flat = Table::concat(verified).select_columns(&columns::VERIFIED_COLUMN_ORDER);
        self.verified_flat = Some(flat.clone());
        Ok(flat)
    }

    /// The cached result of the last `concat_verified` call.
    pub fn verified_flat(&self) -> Option<&Table> {
        self.verified_flat.as_ref()
    }
}

fn merged_ids(
    tables: Option<&[MergedTable]>,
    what: &'static str,
) -> Result<BTreeSet<RecordId>, ReconcileError> {
    let tables = tables.ok_or(ReconcileError::NotInitialized(what))?;
    Ok(tables
        .iter()
        .flat_map(|table| table.ids().cloned())
        .collect())
}

/// Materialize a fully-agreeing overlap as a verified table.
///
/// Per-source flag columns are dropped in favor of the validation signature,
/// which sits at its fixed third-column position.
fn verified_table(merged: &MergedTable) -> Result<Table, ReconcileError> {
    let mut table = Table::new(
        columns::VERIFIED_COLUMN_ORDER
            .iter()
            .map(|column| column.to_string())
            .collect(),
    );
    for row in merged.rows() {
        let category = Value::Category(row.cells[0].category());
        let original_label = collapse_row(row, &Attribute::OriginalLabel)
            .consistent_value()
            .cloned()
            .unwrap_or(Value::Null);
        let proposed = collapse_row(row, &Attribute::ProposedLabels)
            .consistent_value()
            .cloned()
            .unwrap_or(Value::Null);
        table.push_row(vec![
            Value::Str(row.id().clone()),
            category,
            Value::Str(row_signature(row)),
            original_label,
            proposed,
        ])?;
    }
    Ok(table)
}
