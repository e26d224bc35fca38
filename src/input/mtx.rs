use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::input::reader::{find_first_existing, open_maybe_gz};
use crate::input::{GeneIndex, InputError};

pub fn find_matrix_path(input_dir: &Path) -> Result<PathBuf, InputError> {
    find_first_existing(input_dir, &["matrix.mtx", "matrix.mtx.gz"]).ok_or_else(|| {
        InputError::MissingInput("missing matrix.mtx or matrix.mtx.gz".to_string())
    })
}

/// Sparse gene x cell count matrix stored column-major.
///
/// Every column is sorted by gene id and holds only non-zero counts.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    pub genes: Vec<String>,
    pub barcodes: Vec<String>,
    pub cols: Vec<Vec<(u32, u64)>>,
}

impl CountMatrix {
    pub fn n_genes(&self) -> usize {
        self.genes.len()
    }

    pub fn n_cells(&self) -> usize {
        self.cols.len()
    }

    pub fn column(&self, cell: usize) -> &[(u32, u64)] {
        &self.cols[cell]
    }

    /// Number of cells with a non-zero count, per gene.
    pub fn cells_per_gene(&self) -> Vec<u32> {
        let mut out = vec![0u32; self.genes.len()];
        for col in &self.cols {
            for &(gene, _) in col {
                out[gene as usize] += 1;
            }
        }
        out
    }

    /// Keeps genes detected in at least `min_cells` cells and re-indexes rows.
    pub fn retain_genes_in_min_cells(&self, min_cells: u32) -> CountMatrix {
        let detected = self.cells_per_gene();
        let mut remap: Vec<Option<u32>> = Vec::with_capacity(self.genes.len());
        let mut genes = Vec::new();
        for (gene, symbol) in self.genes.iter().enumerate() {
            if detected[gene] >= min_cells {
                remap.push(Some(genes.len() as u32));
                genes.push(symbol.clone());
            } else {
                remap.push(None);
            }
        }
        let cols = self
            .cols
            .iter()
            .map(|col| {
                col.iter()
                    .filter_map(|&(gene, v)| remap[gene as usize].map(|g| (g, v)))
                    .collect()
            })
            .collect();
        CountMatrix {
            genes,
            barcodes: self.barcodes.clone(),
            cols,
        }
    }

    /// Column view over `cells`, in the order given. Rows are untouched.
    pub fn subset_columns(&self, cells: &[usize]) -> CountMatrix {
        CountMatrix {
            genes: self.genes.clone(),
            barcodes: cells.iter().map(|&c| self.barcodes[c].clone()).collect(),
            cols: cells.iter().map(|&c| self.cols[c].clone()).collect(),
        }
    }
}

pub fn read_mtx_csc(
    path: &Path,
    n_features_raw: usize,
    barcodes: &[String],
    gene_index: &GeneIndex,
) -> Result<CountMatrix, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(InputError::Parse("matrix.mtx is empty".to_string()));
    }
    let header = buf.trim_end();
    if !header.starts_with("%%MatrixMarket") {
        return Err(InputError::Parse("missing MatrixMarket header".to_string()));
    }
    if !header.contains("coordinate") {
        return Err(InputError::Parse(
            "only coordinate MatrixMarket files are supported".to_string(),
        ));
    }

    // Skip comments to size line
    let (rows, cols) = loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            return Err(InputError::Parse("missing matrix size line".to_string()));
        }
        let line = buf.trim_end();
        if line.starts_with('%') || line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let rows = parse_field::<usize>(parts.next(), "row count")?;
        let cols = parse_field::<usize>(parts.next(), "column count")?;
        parse_field::<usize>(parts.next(), "nnz count")?;
        break (rows, cols);
    };

    if rows != n_features_raw {
        return Err(InputError::InvalidInput(format!(
            "matrix row count {} does not match features {}",
            rows, n_features_raw
        )));
    }
    if cols != barcodes.len() {
        return Err(InputError::InvalidInput(format!(
            "matrix column count {} does not match barcodes {}",
            cols,
            barcodes.len()
        )));
    }

    let mut per_col: Vec<BTreeMap<u32, u64>> = vec![BTreeMap::new(); cols];

    let mut line_no = 0usize;
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }
        let mut parts = line.split_whitespace();
        let row = parse_field::<usize>(parts.next(), "row index")?;
        let col = parse_field::<usize>(parts.next(), "col index")?;
        let val = parse_field::<u64>(parts.next(), "count value")?;
        if row == 0 || row > rows || col == 0 || col > cols {
            return Err(InputError::Parse(format!(
                "matrix entry out of bounds at line {}",
                line_no
            )));
        }
        if val == 0 {
            continue;
        }
        if let Some(gene_id) = gene_index.gene_id_by_feature[row - 1] {
            *per_col[col - 1].entry(gene_id as u32).or_insert(0) += val;
        }
    }

    let cols_vec = per_col
        .into_iter()
        .map(|map| map.into_iter().collect::<Vec<_>>())
        .collect();

    Ok(CountMatrix {
        genes: gene_index.symbols_by_gene_id.clone(),
        barcodes: barcodes.to_vec(),
        cols: cols_vec,
    })
}

fn parse_field<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T, InputError> {
    raw.ok_or_else(|| InputError::Parse(format!("missing {what}")))?
        .parse()
        .map_err(|_| InputError::Parse(format!("invalid {what}")))
}
