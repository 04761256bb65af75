use chrono::Utc;

use crate::catalogue::{catalogue, category_leaf_count, Catalogue};
use crate::models::{ProgressStatus, TrainingProgress};
use crate::stats::{overall_progress, progress_stats};

fn record(
    category: &str,
    subcategory: &str,
    item: &str,
    status: ProgressStatus,
) -> TrainingProgress {
    TrainingProgress {
        id: uuid::Uuid::new_v4().to_string(),
        student_id: "student".to_string(),
        category: category.to_string(),
        subcategory: subcategory.to_string(),
        item: item.to_string(),
        status,
        notes: None,
        last_updated: Utc::now(),
    }
}

#[test]
fn empty_records_yield_zeroes_everywhere() {
    let overall = overall_progress(catalogue(), &[]);
    assert_eq!(overall.total_completed, 0);
    assert_eq!(overall.completion_percentage, 0);
    assert!(overall.total_items > 0);

    let stats = progress_stats(catalogue(), &[]);
    assert_eq!(stats.len(), catalogue().len());
    for category in stats.values() {
        assert_eq!(category.total_completed, 0);
        assert_eq!(category.completion_percentage, 0);
    }
}

#[test]
fn empty_catalogue_yields_zero_percentage_not_panic() {
    let empty = Catalogue::new();
    let records = [record("grundstufe", "pedale", "Pedale", ProgressStatus::Once)];

    let overall = overall_progress(&empty, &records);
    assert_eq!(overall.total_items, 0);
    assert_eq!(overall.completion_percentage, 0);
}

#[test]
fn duplicate_key_tuples_count_once() {
    let records = [
        record("grundstufe", "einstellen", "Sitz", ProgressStatus::Twice),
        record("grundstufe", "einstellen", "Sitz", ProgressStatus::Once),
        record("grundstufe", "einstellen", "Spiegel", ProgressStatus::Once),
    ];

    let overall = overall_progress(catalogue(), &records);
    assert_eq!(overall.total_completed, 2);

    // The first record per tuple wins, so Sitz lands in the twice bucket.
    let stats = progress_stats(catalogue(), &records);
    let grundstufe = &stats["grundstufe"];
    assert_eq!(grundstufe.completed_items.twice, 1);
    assert_eq!(grundstufe.completed_items.once, 1);
    assert_eq!(grundstufe.total_completed, 2);
}

#[test]
fn not_started_records_do_not_count_as_completed() {
    let records = [
        record("grundstufe", "pedale", "Pedale", ProgressStatus::NotStarted),
        record("grundstufe", "einstellen", "Sitz", ProgressStatus::Thrice),
    ];

    let overall = overall_progress(catalogue(), &records);
    assert_eq!(overall.total_completed, 1);

    let stats = progress_stats(catalogue(), &records);
    assert_eq!(stats["grundstufe"].total_completed, 1);
    assert_eq!(stats["grundstufe"].completed_items.thrice, 1);
}

#[test]
fn both_aggregations_round_the_same_way() {
    let records = [record("grundstufe", "einstellen", "Sitz", ProgressStatus::Twice)];

    let stats = progress_stats(catalogue(), &records);
    let grundstufe = &stats["grundstufe"];
    assert_eq!(grundstufe.total_items, 24);
    // 1 of 24 rounds to 4, not truncates to 0.
    assert_eq!(grundstufe.completion_percentage, 4);

    let mut only_grundstufe = Catalogue::new();
    only_grundstufe.insert(
        "grundstufe".to_string(),
        catalogue()["grundstufe"].clone(),
    );
    let overall = overall_progress(&only_grundstufe, &records);
    assert_eq!(
        overall.total_items,
        category_leaf_count(&catalogue()["grundstufe"])
    );
    assert_eq!(overall.completion_percentage, 4);
}

#[test]
fn example_scenario_lands_in_twice_bucket() {
    let records = [record("grundstufe", "einstellen", "Sitz", ProgressStatus::Twice)];

    let stats = progress_stats(catalogue(), &records);
    let grundstufe = &stats["grundstufe"];
    assert_eq!(grundstufe.completed_items.twice, 1);
    assert_eq!(grundstufe.completed_items.once, 0);
    assert_eq!(grundstufe.completed_items.thrice, 0);
    assert_eq!(grundstufe.total_items, 24);

    for (key, category) in &stats {
        if key != "grundstufe" {
            assert_eq!(category.total_completed, 0);
        }
    }
}
