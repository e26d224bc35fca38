use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod annotations;
pub mod barcodes;
pub mod features;
pub mod mtx;
pub mod reader;
pub mod reference;

use barcodes::parse_barcodes;
use features::{Feature, parse_features};
use mtx::{CountMatrix, find_matrix_path, read_mtx_csc};
use reader::find_first_existing;

#[derive(Debug, Clone)]
pub struct GeneIndex {
    pub gene_id_by_feature: Vec<Option<usize>>,
    pub symbols_by_gene_id: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InputBundle {
    pub n_features_raw: usize,
    pub n_genes_indexed: usize,
    pub matrix: CountMatrix,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

pub fn load_input_tenx(input_dir: &Path) -> Result<InputBundle, InputError> {
    let mtx_path = find_matrix_path(input_dir)?;
    let features_path = find_features_path(input_dir)?;
    let barcodes_path = find_barcodes_path(input_dir)?;

    tracing::info!(
        mtx = %mtx_path.display(),
        features = %features_path.display(),
        barcodes = %barcodes_path.display(),
        "discovered input files"
    );

    let features = parse_features(&features_path)?;
    let n_features_raw = features.len();
    let gene_index = build_gene_index(&features);
    let n_genes_indexed = gene_index.symbols_by_gene_id.len();

    let barcodes = parse_barcodes(&barcodes_path)?;
    let matrix = read_mtx_csc(&mtx_path, n_features_raw, &barcodes, &gene_index)?;

    tracing::info!(
        features = n_features_raw,
        genes = n_genes_indexed,
        cells = matrix.n_cells(),
        "loaded count matrix"
    );

    Ok(InputBundle {
        n_features_raw,
        n_genes_indexed,
        matrix,
    })
}

/// Maps raw feature rows onto gene rows.
///
/// Non gene-expression features are dropped. Symbols are kept case-sensitive
/// because the mitochondrial prefix match is. Every remaining feature keeps its
/// own row; repeated symbols are made unique as `SYMBOL.1`, `SYMBOL.2`, ...
pub fn build_gene_index(features: &[Feature]) -> GeneIndex {
    let mut symbols_by_gene_id: Vec<String> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut repeats: HashMap<&str, usize> = HashMap::new();
    let mut gene_id_by_feature: Vec<Option<usize>> = Vec::with_capacity(features.len());
    let mut dropped_non_gex = 0usize;
    let mut renamed = 0usize;

    for (idx, feature) in features.iter().enumerate() {
        if feature.symbol.is_empty() {
            gene_id_by_feature.push(None);
            continue;
        }
        if !feature.is_gene_expression() {
            dropped_non_gex += 1;
            gene_id_by_feature.push(None);
            continue;
        }
        let mut symbol = feature.symbol.clone();
        if taken.contains(&symbol) {
            let n = repeats.entry(feature.symbol.as_str()).or_insert(0);
            while taken.contains(&symbol) {
                *n += 1;
                symbol = format!("{}.{}", feature.symbol, n);
            }
            tracing::debug!(
                feature_index = idx,
                feature_id = %feature.id,
                symbol = %feature.symbol,
                unique = %symbol,
                "duplicate gene symbol made unique"
            );
            renamed += 1;
        }
        taken.insert(symbol.clone());
        gene_id_by_feature.push(Some(symbols_by_gene_id.len()));
        symbols_by_gene_id.push(symbol);
    }

    if dropped_non_gex > 0 {
        tracing::info!(
            dropped = dropped_non_gex,
            "ignoring non gene-expression features"
        );
    }

    if renamed > 0 {
        tracing::warn!(renamed, "duplicate gene symbols suffixed to keep one row per feature");
    }

    GeneIndex {
        gene_id_by_feature,
        symbols_by_gene_id,
    }
}

fn find_features_path(input_dir: &Path) -> Result<PathBuf, InputError> {
    find_first_existing(
        input_dir,
        &[
            "features.tsv",
            "features.tsv.gz",
            "genes.tsv",
            "genes.tsv.gz",
        ],
    )
    .ok_or_else(|| InputError::MissingInput("missing features.tsv(.gz) or genes.tsv".to_string()))
}

fn find_barcodes_path(input_dir: &Path) -> Result<PathBuf, InputError> {
    find_first_existing(input_dir, &["barcodes.tsv", "barcodes.tsv.gz"]).ok_or_else(|| {
        InputError::MissingInput("missing barcodes.tsv or barcodes.tsv.gz".to_string())
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
