use crate::model::cell::CellSet;
use crate::model::labels::{CoarseLabel, Prediction, PublishedLabel};
use crate::model::thresholds::{PREDICTED_MALIGNANT, PUBLISHED_MALIGNANT};

/// Only the published malignant label maps to `Malignant`.
pub fn coarse_from_published(label: &PublishedLabel) -> CoarseLabel {
    match label {
        PublishedLabel::Labeled(l) if l == PUBLISHED_MALIGNANT => CoarseLabel::Malignant,
        _ => CoarseLabel::Stromal,
    }
}

/// Only the reference malignant label maps to `Malignant`. No-calls and
/// unclassified cells fall into `Stromal`.
pub fn coarse_from_predicted(prediction: Option<&Prediction>) -> CoarseLabel {
    match prediction.and_then(Prediction::label) {
        Some(l) if l == PREDICTED_MALIGNANT => CoarseLabel::Malignant,
        _ => CoarseLabel::Stromal,
    }
}

pub fn relabel(cells: &CellSet) -> CellSet {
    let out: Vec<_> = cells
        .iter()
        .map(|cell| {
            let mut cell = cell.clone();
            cell.coarse_published = Some(coarse_from_published(&cell.published));
            cell.coarse_predicted = Some(coarse_from_predicted(cell.predicted.as_ref()));
            cell
        })
        .collect();

    let no_calls = out
        .iter()
        .filter(|c| matches!(c.predicted, Some(Prediction::NoCall)))
        .count();
    if no_calls > 0 {
        tracing::info!(no_calls, "no-call predictions counted as stromal");
    }
    CellSet::new(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_relabel.rs"]
mod tests;
