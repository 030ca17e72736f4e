//! Validation signature encoding.
//!
//! A merged row carries one manual-evaluation flag per source; the signature
//! collapses them into an ordered string of confirmation marks followed by
//! decline marks. Its length always equals the number of sources that
//! contributed a non-missing flag.

use crate::constants::signature::{CONFIRM_MARK, DECLINE_MARK};
use crate::merge::MergedRow;

/// Build a signature from per-source manual-evaluation flags.
///
/// All confirmations come first, then all declines; the marks are grouped by
/// outcome, not interleaved per source. Missing flags contribute nothing.
pub fn build_signature(flags: &[Option<bool>]) -> String {
    let confirmed = flags.iter().filter(|flag| **flag == Some(true)).count();
    let declined = flags.iter().filter(|flag| **flag == Some(false)).count();
    let mut signature = String::with_capacity(confirmed + declined);
    for _ in 0..confirmed {
        signature.push(CONFIRM_MARK);
    }
    for _ in 0..declined {
        signature.push(DECLINE_MARK);
    }
    signature
}

/// Signature for a merged row's per-source flags, in source order.
pub fn row_signature(row: &MergedRow) -> String {
    let flags: Vec<Option<bool>> = row
        .cells
        .iter()
        .map(|record| record.manually_evaluated())
        .collect();
    build_signature(&flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmations_precede_declines() {
        assert_eq!(build_signature(&[Some(false), Some(true), Some(true)]), "++*");
        assert_eq!(build_signature(&[Some(true), Some(true)]), "++");
        assert_eq!(build_signature(&[Some(false)]), "*");
    }

    #[test]
    fn length_equals_non_missing_flag_count() {
        let flags = [Some(true), None, Some(false), Some(true)];
        let signature = build_signature(&flags);
        assert_eq!(signature.len(), 3);
        assert_eq!(signature, "++*");
    }

    #[test]
    fn all_missing_flags_produce_an_empty_signature() {
        assert_eq!(build_signature(&[None, None]), "");
        assert_eq!(build_signature(&[]), "");
    }
}
