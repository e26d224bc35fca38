use super::{filter_labeled, summarize_guides};
use crate::model::cell::{CellRecord, CellSet};
use crate::model::labels::PublishedLabel;
use crate::model::thresholds::QcGuides;

fn cell(id: &str, total: u64, mito: f32, label: Option<&str>) -> CellRecord {
    let mut c = CellRecord::new(id.to_string(), 0);
    c.total_count = total;
    c.feature_count = (total / 2) as u32;
    c.mito_fraction = mito;
    c.published = match label {
        Some(l) => PublishedLabel::Labeled(l.to_string()),
        None => PublishedLabel::Unlabeled,
    };
    c
}

fn set() -> CellSet {
    CellSet::new(vec![
        cell("A-1", 100, 0.5, Some("MTCs")),
        cell("B-1", 20_000, 0.0, Some("PC-1")),
        cell("C-1", 1_000, 0.01, None),
        cell("D-1", 2_000, 0.02, Some("B-c1")),
    ])
}

#[test]
fn test_filter_keeps_exactly_labeled_cells() {
    let out = filter_labeled(&set());
    let ids: Vec<&str> = out.iter().map(|c| c.cell_id.as_str()).collect();
    assert_eq!(ids, vec!["A-1", "B-1", "D-1"]);
    assert!(out.iter().all(|c| c.published.is_labeled()));
}

#[test]
fn test_guides_are_not_applied() {
    // A-1 and B-1 fail the guides but carry labels, so they stay
    let out = filter_labeled(&set());
    assert!(out.iter().any(|c| c.cell_id == "A-1"));
    assert!(out.iter().any(|c| c.cell_id == "B-1"));
}

#[test]
fn test_guide_summary_counts() {
    let summary = summarize_guides(&set(), &QcGuides::default_v1());
    assert_eq!(summary.n_cells, 4);
    assert_eq!(summary.below_min_count, 1);
    assert_eq!(summary.above_max_count, 1);
    assert_eq!(summary.above_max_mito, 1);
    assert_eq!(summary.outside_any, 2);
    // even count: mean of the two middle values
    assert_eq!(summary.median_total_count, 1_500.0);
}

#[test]
fn test_guide_summary_median_interpolates() {
    let cells = CellSet::new(vec![
        cell("A-1", 100, 0.0, Some("MTCs")),
        cell("B-1", 300, 0.2, Some("PC-1")),
    ]);
    let summary = summarize_guides(&cells, &QcGuides::default_v1());
    assert_eq!(summary.median_total_count, 200.0);
    assert_eq!(summary.median_feature_count, 100.0);
    assert!((summary.median_mito_fraction - 0.1).abs() < 1e-6);
}

#[test]
fn test_guide_summary_on_empty_set() {
    let summary = summarize_guides(&CellSet::default(), &QcGuides::default_v1());
    assert_eq!(summary.n_cells, 0);
    assert_eq!(summary.median_total_count, 0.0);
}
