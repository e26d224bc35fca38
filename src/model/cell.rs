use crate::model::labels::{CoarseLabel, Prediction, PublishedLabel};

/// Per-cell record. Derived fields are filled stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub cell_id: String,
    /// Column index into the stage 1 count matrix.
    pub column: usize,
    pub feature_count: u32,
    pub total_count: u64,
    pub mito_fraction: f32,
    pub published: PublishedLabel,
    pub predicted: Option<Prediction>,
    pub coarse_published: Option<CoarseLabel>,
    pub coarse_predicted: Option<CoarseLabel>,
}

impl CellRecord {
    pub fn new(cell_id: String, column: usize) -> Self {
        Self {
            cell_id,
            column,
            feature_count: 0,
            total_count: 0,
            mito_fraction: 0.0,
            published: PublishedLabel::Unlabeled,
            predicted: None,
            coarse_published: None,
            coarse_predicted: None,
        }
    }
}

/// Ordered cell records; every pipeline stage returns a new set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellSet {
    pub cells: Vec<CellRecord>,
}

impl CellSet {
    pub fn new(cells: Vec<CellRecord>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CellRecord> {
        self.cells.iter()
    }

    pub fn columns(&self) -> Vec<usize> {
        self.cells.iter().map(|c| c.column).collect()
    }

    pub fn labeled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.published.is_labeled()).count()
    }
}
