use crate::input::mtx::CountMatrix;
use crate::model::cell::{CellRecord, CellSet};
use crate::model::thresholds::MITO_PREFIX;

#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub matrix: CountMatrix,
    pub cells: CellSet,
    pub n_genes_dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcStats {
    pub feature_count: u32,
    pub total_count: u64,
    pub mito_fraction: f32,
}

pub fn run_stage1(raw: &CountMatrix, min_cells: u32) -> Stage1Output {
    let matrix = raw.retain_genes_in_min_cells(min_cells);
    let n_genes_dropped = raw.n_genes() - matrix.n_genes();
    tracing::info!(
        kept = matrix.n_genes(),
        dropped = n_genes_dropped,
        min_cells,
        "gene-presence filter applied"
    );

    let mito = mito_mask(&matrix.genes);
    let n_mito = mito.iter().filter(|&&m| m).count();
    if n_mito == 0 {
        tracing::warn!(
            prefix = MITO_PREFIX,
            "no mitochondrial genes matched; mito fractions will be 0"
        );
    }

    let cells = matrix
        .barcodes
        .iter()
        .enumerate()
        .map(|(column, barcode)| {
            let stats = qc_stats(matrix.column(column), &mito);
            CellRecord {
                feature_count: stats.feature_count,
                total_count: stats.total_count,
                mito_fraction: stats.mito_fraction,
                ..CellRecord::new(barcode.clone(), column)
            }
        })
        .collect();

    Stage1Output {
        matrix,
        cells: CellSet::new(cells),
        n_genes_dropped,
    }
}

pub fn mito_mask(genes: &[String]) -> Vec<bool> {
    genes.iter().map(|g| g.starts_with(MITO_PREFIX)).collect()
}

pub fn qc_stats(column: &[(u32, u64)], mito: &[bool]) -> QcStats {
    let mut feature_count = 0u32;
    let mut total_count = 0u64;
    let mut mito_count = 0u64;
    for &(gene, count) in column {
        if count == 0 {
            continue;
        }
        feature_count += 1;
        total_count += count;
        if mito[gene as usize] {
            mito_count += count;
        }
    }
    let mito_fraction = if total_count == 0 {
        0.0
    } else {
        (mito_count as f64 / total_count as f64) as f32
    };
    QcStats {
        feature_count,
        total_count,
        mito_fraction,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_ingest.rs"]
mod tests;
