pub mod json;
pub mod text;

use serde::Serialize;

use crate::pipeline::stage3_filter::QcGuideSummary;
use crate::pipeline::stage7_concordance::SerializableTable;

#[derive(Debug, Clone, Serialize)]
pub struct PresetSummary {
    pub preset: String,
    pub quantile: f32,
    pub prune: bool,
    pub n_cells: usize,
    pub no_calls: usize,
    pub coarse_agreement: usize,
    pub coarse_agreement_fraction: f32,
    /// Cells malignant both as published and as predicted.
    pub malignant_both: usize,
    pub coarse: SerializableTable,
    pub fine: SerializableTable,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub input_dir: String,
    pub annotations: String,
    pub n_features_raw: usize,
    pub n_genes_indexed: usize,
    pub n_genes_kept: usize,
    pub n_genes_dropped: usize,
    pub min_cells_per_gene: u32,
    pub n_cells: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    /// Identifier column actually read, after the first-column fallback.
    pub id_column: String,
    pub label_column: String,
    pub annotation_rows: usize,
    pub ids_unchanged: usize,
    pub id_collisions: usize,
    pub n_labeled: usize,
    pub n_unlabeled: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: String,
    pub version: String,
    pub input: InputSummary,
    pub reconcile: ReconcileSummary,
    pub qc_guides: QcGuideSummary,
    pub n_retained: usize,
    pub presets: Vec<PresetSummary>,
}

pub fn format_f32_6(v: f32) -> String {
    format!("{:.6}", v)
}

pub fn fraction(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
