use serde::Serialize;

use crate::model::cell::CellSet;
use crate::model::thresholds::QcGuides;
use crate::stats::median;

/// How the cells sit relative to the QC guides. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QcGuideSummary {
    pub min_count: u64,
    pub max_count: u64,
    pub max_mito_fraction: f32,
    pub n_cells: usize,
    pub below_min_count: usize,
    pub above_max_count: usize,
    pub above_max_mito: usize,
    pub outside_any: usize,
    pub median_total_count: f32,
    pub median_feature_count: f32,
    pub median_mito_fraction: f32,
}

pub fn summarize_guides(cells: &CellSet, guides: &QcGuides) -> QcGuideSummary {
    let mut below = 0usize;
    let mut above = 0usize;
    let mut mito = 0usize;
    let mut outside = 0usize;
    for cell in cells.iter() {
        let low = cell.total_count < guides.min_count;
        let high = cell.total_count > guides.max_count;
        let mt = cell.mito_fraction > guides.max_mito_fraction;
        below += low as usize;
        above += high as usize;
        mito += mt as usize;
        outside += (low || high || mt) as usize;
    }

    let totals: Vec<f64> = cells.iter().map(|c| c.total_count as f64).collect();
    let features: Vec<f64> = cells.iter().map(|c| c.feature_count as f64).collect();
    let fractions: Vec<f64> = cells.iter().map(|c| c.mito_fraction as f64).collect();

    QcGuideSummary {
        min_count: guides.min_count,
        max_count: guides.max_count,
        max_mito_fraction: guides.max_mito_fraction,
        n_cells: cells.len(),
        below_min_count: below,
        above_max_count: above,
        above_max_mito: mito,
        outside_any: outside,
        median_total_count: median_or_zero(&totals),
        median_feature_count: median_or_zero(&features),
        median_mito_fraction: median_or_zero(&fractions),
    }
}

fn median_or_zero(values: &[f64]) -> f32 {
    median(values).unwrap_or(0.0) as f32
}

/// Keeps exactly the cells that carry a published label.
pub fn filter_labeled(cells: &CellSet) -> CellSet {
    let kept: Vec<_> = cells
        .iter()
        .filter(|c| c.published.is_labeled())
        .cloned()
        .collect();
    tracing::info!(
        kept = kept.len(),
        dropped = cells.len() - kept.len(),
        "retained cells with a published label"
    );
    CellSet::new(kept)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_filter.rs"]
mod tests;
