use super::{coarse_from_predicted, coarse_from_published, relabel};
use crate::model::cell::{CellRecord, CellSet};
use crate::model::labels::{CoarseLabel, Prediction, PublishedLabel};

fn published(label: &str) -> PublishedLabel {
    PublishedLabel::Labeled(label.to_string())
}

fn predicted(label: &str) -> Prediction {
    Prediction::Label(label.to_string())
}

#[test]
fn test_published_mapping() {
    assert_eq!(coarse_from_published(&published("MTCs")), CoarseLabel::Malignant);
    assert_eq!(coarse_from_published(&published("PC-1")), CoarseLabel::Stromal);
    assert_eq!(coarse_from_published(&published("B-c1")), CoarseLabel::Stromal);
    // exact, case-sensitive match only
    assert_eq!(coarse_from_published(&published("mtcs")), CoarseLabel::Stromal);
}

#[test]
fn test_predicted_mapping() {
    assert_eq!(
        coarse_from_predicted(Some(&predicted("Melanocytes"))),
        CoarseLabel::Malignant
    );
    assert_eq!(
        coarse_from_predicted(Some(&predicted("Fibroblasts"))),
        CoarseLabel::Stromal
    );
    assert_eq!(
        coarse_from_predicted(Some(&Prediction::NoCall)),
        CoarseLabel::Stromal
    );
    assert_eq!(coarse_from_predicted(None), CoarseLabel::Stromal);
}

#[test]
fn test_relabel_fills_both_columns() {
    let mut a = CellRecord::new("A-1".into(), 0);
    a.published = published("MTCs");
    a.predicted = Some(predicted("Melanocytes"));
    let mut b = CellRecord::new("B-1".into(), 1);
    b.published = published("PC-1");
    b.predicted = Some(Prediction::NoCall);

    let out = relabel(&CellSet::new(vec![a, b]));
    assert_eq!(out.cells[0].coarse_published, Some(CoarseLabel::Malignant));
    assert_eq!(out.cells[0].coarse_predicted, Some(CoarseLabel::Malignant));
    assert_eq!(out.cells[1].coarse_published, Some(CoarseLabel::Stromal));
    assert_eq!(out.cells[1].coarse_predicted, Some(CoarseLabel::Stromal));
    // fine labels are left untouched
    assert_eq!(out.cells[1].predicted, Some(Prediction::NoCall));
}
