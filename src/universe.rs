//! The closed identifier universe shared by all annotation sources.

use std::collections::BTreeSet;

use crate::constants::universe::{
    VALIDATION_ID_PREFIX, VALIDATION_ID_SUFFIX, VALIDATION_ID_WIDTH, VALIDATION_SET_SIZE,
};
use crate::types::RecordId;

/// Produces the complete, deterministic set of record identifiers expected
/// across all sources.
///
/// Implementations must be pure: no I/O, same output on every call. The
/// slicer takes a resolver by injection so tests can substitute a small
/// synthetic universe for the canonical 50,000-item one.
pub trait UniverseResolver {
    /// Every identifier expected to exist, in lexicographic order.
    fn all_ids(&self) -> BTreeSet<RecordId>;

    /// Number of identifiers in the universe.
    fn len(&self) -> usize {
        self.all_ids().len()
    }

    /// True when the universe is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Canonical validation-set universe: zero-padded sequential identifiers
/// (`ILSVRC2012_val_00000001.JPEG` through the configured count).
#[derive(Clone, Copy, Debug)]
pub struct ValidationUniverse {
    count: usize,
}

impl Default for ValidationUniverse {
    fn default() -> Self {
        Self {
            count: VALIDATION_SET_SIZE,
        }
    }
}

impl ValidationUniverse {
    /// The canonical 50,000-identifier universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Universe with the same naming scheme but a custom size.
    pub fn with_count(count: usize) -> Self {
        Self { count }
    }

    /// Identifier for a 1-based index in the naming scheme.
    pub fn id_for(index: usize) -> RecordId {
        let width = VALIDATION_ID_WIDTH;
        format!("{VALIDATION_ID_PREFIX}{index:0width$}{VALIDATION_ID_SUFFIX}")
    }
}

impl UniverseResolver for ValidationUniverse {
    fn all_ids(&self) -> BTreeSet<RecordId> {
        (1..=self.count).map(ValidationUniverse::id_for).collect()
    }

    fn len(&self) -> usize {
        self.count
    }
}

/// Explicit-id universe for domains without a naming scheme (mostly tests).
#[derive(Clone, Debug, Default)]
pub struct FixedUniverse {
    ids: BTreeSet<RecordId>,
}

impl FixedUniverse {
    /// Universe holding exactly the given identifiers.
    pub fn new(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }
}

impl UniverseResolver for FixedUniverse {
    fn all_ids(&self) -> BTreeSet<RecordId> {
        self.ids.clone()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_for_pads_to_eight_digits() {
        assert_eq!(
            ValidationUniverse::id_for(1),
            "ILSVRC2012_val_00000001.JPEG"
        );
        assert_eq!(
            ValidationUniverse::id_for(50_000),
            "ILSVRC2012_val_00050000.JPEG"
        );
    }

    #[test]
    fn small_universe_is_complete_and_distinct() {
        let universe = ValidationUniverse::with_count(25);
        let ids = universe.all_ids();
        assert_eq!(ids.len(), 25);
        assert_eq!(universe.len(), 25);
        assert!(ids.contains("ILSVRC2012_val_00000025.JPEG"));
        assert!(!ids.contains("ILSVRC2012_val_00000026.JPEG"));
    }

    #[test]
    fn fixed_universe_returns_exactly_its_ids() {
        let universe = FixedUniverse::new(["b".to_string(), "a".to_string()]);
        let ids = universe.all_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.iter().next().map(String::as_str), Some("a"));
    }
}
