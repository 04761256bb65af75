//! Progress aggregation. Pure functions over the catalogue and one
//! student's progress records, re-derived from source data on every call so
//! the percentages can never drift from the stored records.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalogue::{category_leaf_count, total_leaf_count, Catalogue};
use crate::models::{ProgressStatus, TrainingProgress};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallProgress {
    pub total_items: usize,
    pub total_completed: usize,
    pub completion_percentage: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBuckets {
    pub once: usize,
    pub twice: usize,
    pub thrice: usize,
}

impl StatusBuckets {
    fn add(&mut self, status: ProgressStatus) {
        match status {
            ProgressStatus::NotStarted => {}
            ProgressStatus::Once => self.once += 1,
            ProgressStatus::Twice => self.twice += 1,
            ProgressStatus::Thrice => self.thrice += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.once + self.twice + self.thrice
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub total_items: usize,
    pub completed_items: StatusBuckets,
    pub total_completed: usize,
    pub completion_percentage: i64,
    pub color: String,
}

/// Shared rounding rule for both aggregations: equal state must yield equal
/// percentages no matter which operation computed them. An empty catalogue
/// yields 0, not an error.
fn percentage(completed: usize, total: usize) -> i64 {
    if total == 0 {
        0
    } else {
        (completed as f64 * 100.0 / total as f64).round() as i64
    }
}

/// Storage enforces key-tuple uniqueness, but records predating that
/// constraint may be duplicated; the first match per key tuple is canonical.
fn canonical_records(records: &[TrainingProgress]) -> Vec<&TrainingProgress> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert((r.category.as_str(), r.subcategory.as_str(), r.item.as_str())))
        .collect()
}

/// Single completion number across the whole catalogue.
pub fn overall_progress(catalogue: &Catalogue, records: &[TrainingProgress]) -> OverallProgress {
    let total_items = total_leaf_count(catalogue);
    let total_completed = canonical_records(records)
        .iter()
        .filter(|r| r.status != ProgressStatus::NotStarted)
        .count();

    OverallProgress {
        total_items,
        total_completed,
        completion_percentage: percentage(total_completed, total_items),
    }
}

/// Per-category breakdown with status buckets. Every catalogue category
/// appears in the result, including untouched ones, in catalogue order.
pub fn progress_stats(
    catalogue: &Catalogue,
    records: &[TrainingProgress],
) -> IndexMap<String, CategoryStats> {
    let canonical = canonical_records(records);

    catalogue
        .iter()
        .map(|(key, category)| {
            let mut completed_items = StatusBuckets::default();
            for record in canonical.iter().filter(|r| r.category == *key) {
                completed_items.add(record.status);
            }

            let total_items = category_leaf_count(category);
            let total_completed = completed_items.total();

            (
                key.clone(),
                CategoryStats {
                    total_items,
                    completion_percentage: percentage(total_completed, total_items),
                    total_completed,
                    completed_items,
                    color: category.color.clone(),
                },
            )
        })
        .collect()
}
