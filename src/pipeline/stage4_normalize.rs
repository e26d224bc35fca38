use crate::input::mtx::CountMatrix;
use crate::model::cell::CellSet;

pub const DEFAULT_SCALE: f32 = 10_000.0;

/// Column-wise view over an expression matrix handed to the predictor.
pub trait ExprAccessor {
    fn n_cells(&self) -> usize;
    fn genes(&self) -> &[String];
    fn cell_id(&self, cell: usize) -> &str;
    fn for_cell(&self, cell: usize, f: &mut dyn FnMut(u32, f32));
}

pub struct RawCountsAccessor {
    matrix: CountMatrix,
    libsizes: Vec<f32>,
    scale: f32,
}

impl ExprAccessor for RawCountsAccessor {
    fn n_cells(&self) -> usize {
        self.matrix.n_cells()
    }

    fn genes(&self) -> &[String] {
        &self.matrix.genes
    }

    fn cell_id(&self, cell: usize) -> &str {
        &self.matrix.barcodes[cell]
    }

    fn for_cell(&self, cell: usize, f: &mut dyn FnMut(u32, f32)) {
        let lib = self.libsizes[cell] as f64;
        for &(gene_id, count) in self.matrix.column(cell) {
            let value = if lib == 0.0 {
                0.0
            } else {
                let scaled = (count as f64) / lib * (self.scale as f64);
                scaled.ln_1p() as f32
            };
            f(gene_id, value);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage4Params {
    /// Library size every cell is scaled to before `ln(1 + x)`.
    pub scale: f32,
}

impl Default for Stage4Params {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

/// Builds the accessor over exactly the columns of `cells`, in their order.
pub fn build_expr_accessor(
    matrix: &CountMatrix,
    cells: &CellSet,
    params: &Stage4Params,
) -> RawCountsAccessor {
    let subset = matrix.subset_columns(&cells.columns());
    let libsizes = subset
        .cols
        .iter()
        .map(|col| col.iter().map(|&(_, v)| v as f64).sum::<f64>() as f32)
        .collect();
    tracing::info!(
        cells = subset.n_cells(),
        genes = subset.n_genes(),
        scale = params.scale,
        "built expression accessor"
    );
    RawCountsAccessor {
        matrix: subset,
        libsizes,
        scale: params.scale,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_normalize.rs"]
mod tests;
