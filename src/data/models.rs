use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Venue row id.
pub type VenueId = i64;
/// Submission row id.
pub type ItemId = i64;
/// User row id.
pub type UserId = i64;

/// One submission as seen through the read port. `mean`/`stdev` are absent
/// until the item has been through at least one ranking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item: ItemId,
    pub author: UserId,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub percentile: Option<f64>,
}

/// A stored reviewer comparison.
///
/// The `ordering` is kept in the reviewer-entered direction, highest
/// perceived quality first. Engine code reverses it before any model update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub reviewer: UserId,
    pub ordering: Vec<ItemId>,
    /// The one item the reviewer had not seen before this comparison.
    pub new_item: Option<ItemId>,
    pub is_valid: Option<bool>,
    pub date: DateTime<Utc>,
}

impl ComparisonRecord {
    /// A comparison counts unless it is explicitly marked invalid.
    pub fn is_usable(&self) -> bool {
        self.is_valid.unwrap_or(true)
    }

    /// The stored ordering reversed into model direction, lowest quality
    /// first.
    pub fn sorted_low_to_high(&self) -> Vec<ItemId> {
        let mut items = self.ordering.clone();
        items.reverse();
        items
    }
}

/// Per-venue knobs read through the port.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VenueSettings {
    pub submissions_per_reviewer: Option<u32>,
}

/// Reviewer scoring row, upserted after accuracy and reputation passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccuracyRecord {
    pub accuracy: f64,
    pub reputation: Option<f64>,
    pub n_ratings: usize,
}

/// Final grade row, fully replaced on each grade computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    pub user: UserId,
    pub grade: f64,
    pub percentile: f64,
}

/// Read direction for stored comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    Ascending,
    Descending,
}

/// Venue bookkeeping written after an engine pass: which of the three
/// `latest_*_date` fields to stamp, and an optional algorithm description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueTouch {
    pub at: DateTime<Utc>,
    pub rank_update: bool,
    pub reviewers_evaluation: bool,
    pub final_grades: bool,
    pub description: Option<String>,
}

impl VenueTouch {
    pub fn rank_update(at: DateTime<Utc>) -> Self {
        Self {
            at,
            rank_update: true,
            reviewers_evaluation: false,
            final_grades: false,
            description: None,
        }
    }

    pub fn reviewers_evaluation(at: DateTime<Utc>) -> Self {
        Self {
            at,
            rank_update: false,
            reviewers_evaluation: true,
            final_grades: false,
            description: None,
        }
    }

    pub fn final_grades(at: DateTime<Utc>) -> Self {
        Self {
            at,
            rank_update: false,
            reviewers_evaluation: false,
            final_grades: true,
            description: None,
        }
    }

    pub fn full_pass(at: DateTime<Utc>) -> Self {
        Self {
            at,
            rank_update: true,
            reviewers_evaluation: true,
            final_grades: true,
            description: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_low_to_high_reverses() {
        let comparison = ComparisonRecord {
            reviewer: 7,
            ordering: vec![3, 2, 1],
            new_item: None,
            is_valid: None,
            date: Utc::now(),
        };
        assert_eq!(comparison.sorted_low_to_high(), vec![1, 2, 3]);
    }

    #[test]
    fn test_validity_defaults_to_usable() {
        let mut comparison = ComparisonRecord {
            reviewer: 7,
            ordering: vec![1, 2],
            new_item: None,
            is_valid: None,
            date: Utc::now(),
        };
        assert!(comparison.is_usable());
        comparison.is_valid = Some(false);
        assert!(!comparison.is_usable());
    }
}
