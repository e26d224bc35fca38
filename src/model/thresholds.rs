/// Genes detected in fewer cells than this are dropped at load time.
pub const MIN_CELLS_PER_GENE: u32 = 5;

/// Case-sensitive symbol prefix of mitochondrial genes.
pub const MITO_PREFIX: &str = "MT-";

/// QC thresholds shown for inspection. They are never applied as a filter;
/// retention is decided by label presence alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcGuides {
    pub min_count: u64,
    pub max_count: u64,
    pub max_mito_fraction: f32,
}

impl QcGuides {
    pub fn default_v1() -> Self {
        Self {
            min_count: 500,
            max_count: 9000,
            max_mito_fraction: 0.10,
        }
    }
}

/// Fixed annotation id rewrite for this dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRules {
    pub marker_pattern: String,
    pub cell_suffix: String,
}

impl ReconcileRules {
    pub fn default_v1() -> Self {
        Self {
            marker_pattern: r"^.*_E13bm_".to_string(),
            cell_suffix: "-1".to_string(),
        }
    }
}

/// Published label marking malignant cells.
pub const PUBLISHED_MALIGNANT: &str = "MTCs";

/// Reference label marking malignant cells.
pub const PREDICTED_MALIGNANT: &str = "Melanocytes";
