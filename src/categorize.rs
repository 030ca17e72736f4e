//! Categorization of raw annotation signals.
//!
//! Each annotation source emits a different raw signal shape; the categorizer
//! is a closed dispatch over those shapes. Every path either produces a
//! [`CategoryOutcome`] satisfying the taxonomy invariants or fails with
//! [`ReconcileError::InvalidSignal`]; a malformed signal is never silently
//! defaulted to a category.

use serde::{Deserialize, Serialize};

use crate::constants::categorize::{DEFAULT_LABEL_SPACE, DEFAULT_QUORUM_MAJORITY};
use crate::data::{Category, CategoryOutcome, Record};
use crate::errors::ReconcileError;
use crate::types::{Label, RawLabel, RecordId};

/// Crowd vote counts for a quorum-style source.
///
/// `given` counts votes for the original label, `guessed` for the reviewer's
/// candidate label, `both` for both labels applying, `neither` for neither.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    /// Votes confirming the original label.
    pub given: u32,
    /// Votes confirming the reviewer's candidate label instead.
    pub guessed: u32,
    /// Votes confirming both labels.
    pub both: u32,
    /// Votes confirming neither label.
    pub neither: u32,
}

/// Reviewer tag attached by tag-driven sources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewTag {
    /// Reviewer confirmed the original label without further proposals.
    Easy,
    /// Reviewers did not reach agreement; no usable proposal.
    Ambiguous,
    /// Record judged unusable; no proposal.
    Unusable,
}

/// Raw per-record annotation signal, one variant per source kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationSignal {
    /// Plain proposal-list sources (consensus relabeling, multi-label sets).
    Direct {
        /// Label assigned before re-annotation.
        original_label: RawLabel,
        /// Replacement labels proposed by the source; may be empty.
        proposed_labels: Vec<RawLabel>,
        /// Manual-review flag reported by the source, when known.
        manually_evaluated: Option<bool>,
    },
    /// Crowd-vote sources deciding between the original label and a
    /// reviewer-provided candidate. Quorum records are always manually
    /// evaluated.
    Quorum {
        /// Label assigned before re-annotation.
        original_label: RawLabel,
        /// Reviewer's candidate replacement label.
        review_label: RawLabel,
        /// Vote tallies across the quorum outcomes.
        votes: VoteCounts,
    },
    /// Tag-driven sources where a reviewer tag overrides the proposal list.
    /// Tagged records are always manually evaluated.
    Tagged {
        /// Label assigned before re-annotation.
        original_label: RawLabel,
        /// Replacement labels proposed by the source; may be empty.
        proposed_labels: Vec<RawLabel>,
        /// Reviewer tag; `None` falls back to the direct proposal rule.
        tag: Option<ReviewTag>,
    },
}

impl AnnotationSignal {
    /// The raw original label carried by any signal variant.
    pub fn original_label(&self) -> RawLabel {
        match self {
            AnnotationSignal::Direct { original_label, .. }
            | AnnotationSignal::Quorum { original_label, .. }
            | AnnotationSignal::Tagged { original_label, .. } => *original_label,
        }
    }
}

/// Maps raw annotation signals to categorization outcomes.
///
/// Thresholds are configuration, not constants: the label space bounds every
/// label id, and the quorum majority is the vote count a quorum outcome must
/// reach to win.
#[derive(Clone, Copy, Debug)]
pub struct Categorizer {
    label_space: u32,
    quorum_majority: u32,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self {
            label_space: DEFAULT_LABEL_SPACE,
            quorum_majority: DEFAULT_QUORUM_MAJORITY,
        }
    }
}

impl Categorizer {
    /// Categorizer with the canonical label space and quorum majority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the label space; labels must fall in `0..label_space`.
    pub fn with_label_space(mut self, label_space: u32) -> Self {
        self.label_space = label_space;
        self
    }

    /// Override the vote count a quorum outcome must reach to win.
    pub fn with_quorum_majority(mut self, majority: u32) -> Self {
        self.quorum_majority = majority;
        self
    }

    /// Categorize one raw signal into `(category, proposed labels, flag)`.
    pub fn categorize(
        &self,
        source_id: &str,
        signal: &AnnotationSignal,
    ) -> Result<CategoryOutcome, ReconcileError> {
        match signal {
            AnnotationSignal::Direct {
                original_label,
                proposed_labels,
                manually_evaluated,
            } => {
                let original = self.validate_label(source_id, *original_label)?;
                let proposed = self.validate_labels(source_id, proposed_labels)?;
                Ok(direct_outcome(original, proposed, *manually_evaluated))
            }
            AnnotationSignal::Quorum {
                original_label,
                review_label,
                votes,
            } => {
                let original = self.validate_label(source_id, *original_label)?;
                let review = self.validate_label(source_id, *review_label)?;
                if review == original {
                    return Err(ReconcileError::InvalidSignal {
                        source_id: source_id.to_string(),
                        details: format!(
                            "quorum review label {review} duplicates the original label"
                        ),
                    });
                }
                Ok(self.quorum_outcome(original, review, votes))
            }
            AnnotationSignal::Tagged {
                original_label,
                proposed_labels,
                tag,
            } => {
                let original = self.validate_label(source_id, *original_label)?;
                let proposed = self.validate_labels(source_id, proposed_labels)?;
                Ok(tagged_outcome(original, proposed, *tag))
            }
        }
    }

    /// Categorize a signal and build the record for it in one step.
    pub fn categorize_record(
        &self,
        source_id: &str,
        id: impl Into<RecordId>,
        signal: &AnnotationSignal,
    ) -> Result<Record, ReconcileError> {
        let original = self.validate_label(source_id, signal.original_label())?;
        let outcome = self.categorize(source_id, signal)?;
        Record::new(id, original, outcome)
    }

    fn quorum_outcome(&self, original: Label, review: Label, votes: &VoteCounts) -> CategoryOutcome {
        let majority = self.quorum_majority;
        // Outcome precedence is fixed: given, guessed, both, neither.
        let (category, proposed_labels) = if votes.given >= majority {
            (Category::A, vec![original])
        } else if votes.guessed >= majority {
            (Category::B, vec![review])
        } else if votes.both >= majority {
            (Category::M, vec![original, review])
        } else if votes.neither >= majority {
            (Category::Z, Vec::new())
        } else {
            (Category::X, Vec::new())
        };
        CategoryOutcome {
            category,
            proposed_labels,
            manually_evaluated: Some(true),
        }
    }

    fn validate_label(&self, source_id: &str, raw: RawLabel) -> Result<Label, ReconcileError> {
        let space = RawLabel::from(self.label_space);
        if raw < 0 || raw >= space {
            return Err(ReconcileError::InvalidSignal {
                source_id: source_id.to_string(),
                details: format!("label id {raw} is outside the label space 0..{space}"),
            });
        }
        Ok(raw as Label)
    }

    fn validate_labels(
        &self,
        source_id: &str,
        raw: &[RawLabel],
    ) -> Result<Vec<Label>, ReconcileError> {
        raw.iter()
            .map(|label| self.validate_label(source_id, *label))
            .collect()
    }
}

/// Canonical proposal-cardinality rule shared by direct and untagged signals.
fn direct_outcome(
    original: Label,
    proposed: Vec<Label>,
    manually_evaluated: Option<bool>,
) -> CategoryOutcome {
    let distinct = dedup_preserving_order(proposed);
    let category = match distinct.as_slice() {
        [] => Category::Z,
        [single] if *single == original => Category::A,
        [_] => Category::B,
        _ => Category::M,
    };
    CategoryOutcome {
        category,
        proposed_labels: distinct,
        manually_evaluated,
    }
}

fn tagged_outcome(original: Label, proposed: Vec<Label>, tag: Option<ReviewTag>) -> CategoryOutcome {
    match tag {
        None => direct_outcome(original, proposed, Some(true)),
        Some(ReviewTag::Easy) => CategoryOutcome {
            category: Category::A,
            proposed_labels: vec![original],
            manually_evaluated: Some(true),
        },
        Some(ReviewTag::Ambiguous) => CategoryOutcome {
            category: Category::X,
            proposed_labels: Vec::new(),
            manually_evaluated: Some(true),
        },
        Some(ReviewTag::Unusable) => CategoryOutcome {
            category: Category::Z,
            proposed_labels: Vec::new(),
            manually_evaluated: Some(true),
        },
    }
}

fn dedup_preserving_order(labels: Vec<Label>) -> Vec<Label> {
    let mut seen = Vec::with_capacity(labels.len());
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    seen
}
