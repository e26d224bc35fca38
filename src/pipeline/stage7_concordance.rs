use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use serde::Serialize;

use crate::model::cell::CellSet;
use crate::model::labels::{CoarseLabel, Prediction, PublishedLabel};

/// Cross-tabulation with keys in `Ord` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContingencyTable<R, C> {
    pub rows: Vec<R>,
    pub cols: Vec<C>,
    pub counts: Vec<Vec<usize>>,
}

impl<R: Ord + Clone, C: Ord + Clone> ContingencyTable<R, C> {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
    {
        let mut cells: BTreeMap<(R, C), usize> = BTreeMap::new();
        let mut rows = BTreeSet::new();
        let mut cols = BTreeSet::new();
        for (r, c) in pairs {
            rows.insert(r.clone());
            cols.insert(c.clone());
            *cells.entry((r, c)).or_insert(0) += 1;
        }
        let rows: Vec<R> = rows.into_iter().collect();
        let cols: Vec<C> = cols.into_iter().collect();
        let counts = rows
            .iter()
            .map(|r| {
                cols.iter()
                    .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                    .collect()
            })
            .collect();
        Self { rows, cols, counts }
    }

    pub fn get(&self, row: &R, col: &C) -> usize {
        let (Ok(r), Ok(c)) = (self.rows.binary_search(row), self.cols.binary_search(col)) else {
            return 0;
        };
        self.counts[r][c]
    }
}

impl<R, C> ContingencyTable<R, C> {
    pub fn row_totals(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn col_totals(&self) -> Vec<usize> {
        (0..self.cols.len())
            .map(|c| self.counts.iter().map(|row| row[c]).sum())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Sum of the cells whose row and column render to the same text.
    pub fn diagonal(&self) -> usize
    where
        R: Display,
        C: Display,
    {
        let mut sum = 0;
        for (r, row) in self.rows.iter().enumerate() {
            let key = row.to_string();
            for (c, col) in self.cols.iter().enumerate() {
                if key == col.to_string() {
                    sum += self.counts[r][c];
                }
            }
        }
        sum
    }

    pub fn to_serializable(&self) -> SerializableTable
    where
        R: Display,
        C: Display,
    {
        SerializableTable {
            rows: self.rows.iter().map(ToString::to_string).collect(),
            cols: self.cols.iter().map(ToString::to_string).collect(),
            counts: self.counts.clone(),
            total: self.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializableTable {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub counts: Vec<Vec<usize>>,
    pub total: usize,
}

pub type CoarseTable = ContingencyTable<CoarseLabel, CoarseLabel>;
pub type FineTable = ContingencyTable<PublishedLabel, Prediction>;

#[derive(Debug, Clone)]
pub struct Stage7Output {
    pub coarse: CoarseTable,
    pub fine: FineTable,
}

/// Published coarse labels (rows) against predicted coarse labels (columns).
pub fn coarse_table(cells: &CellSet) -> CoarseTable {
    ContingencyTable::from_pairs(cells.iter().map(|c| {
        (
            c.coarse_published.unwrap_or(CoarseLabel::Stromal),
            c.coarse_predicted.unwrap_or(CoarseLabel::Stromal),
        )
    }))
}

/// Published fine labels (rows) against predicted fine labels (columns).
pub fn fine_table(cells: &CellSet) -> FineTable {
    ContingencyTable::from_pairs(cells.iter().map(|c| {
        (
            c.published.clone(),
            c.predicted.clone().unwrap_or(Prediction::NoCall),
        )
    }))
}

pub fn run_stage7(cells: &CellSet) -> Stage7Output {
    let coarse = coarse_table(cells);
    let fine = fine_table(cells);
    tracing::info!(
        cells = cells.len(),
        coarse_agreement = coarse.diagonal(),
        fine_rows = fine.rows.len(),
        fine_cols = fine.cols.len(),
        "tabulated concordance"
    );
    Stage7Output { coarse, fine }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_concordance.rs"]
mod tests;
