use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

use crate::input::annotations::AnnotationTable;
use crate::model::cell::CellSet;
use crate::model::labels::PublishedLabel;
use crate::model::thresholds::ReconcileRules;

const MAX_LOGGED_EXAMPLES: usize = 5;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid id pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{count} annotation ids did not match the rewrite pattern (first: {first})")]
    PatternMismatch { count: usize, first: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    #[default]
    Warn,
    Fail,
}

/// Outcome of rewriting one annotation identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdRewrite {
    Rewritten(String),
    /// The pattern did not match; the id is passed through as-is.
    Unchanged(String),
}

impl IdRewrite {
    pub fn into_cell_id(self) -> String {
        match self {
            IdRewrite::Rewritten(id) | IdRewrite::Unchanged(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdRewriter {
    marker: Regex,
    suffix: String,
}

impl IdRewriter {
    pub fn new(rules: &ReconcileRules) -> Result<Self, ReconcileError> {
        let marker = Regex::new(&rules.marker_pattern).map_err(|source| ReconcileError::Pattern {
            pattern: rules.marker_pattern.clone(),
            source,
        })?;
        Ok(Self {
            marker,
            suffix: rules.cell_suffix.clone(),
        })
    }

    /// Strips everything up to and including the marker, then appends the
    /// per-sample suffix.
    pub fn rewrite(&self, raw: &str) -> IdRewrite {
        match self.marker.find(raw) {
            Some(m) => IdRewrite::Rewritten(format!("{}{}", &raw[m.end()..], self.suffix)),
            None => IdRewrite::Unchanged(raw.to_string()),
        }
    }
}

/// Rewritten cell id -> published label.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    pub labels: HashMap<String, String>,
    pub n_rows: usize,
    pub unchanged: Vec<String>,
    pub collisions: Vec<String>,
}

impl LabelMap {
    pub fn get(&self, cell_id: &str) -> Option<&str> {
        self.labels.get(cell_id).map(String::as_str)
    }
}

pub fn build_label_map(
    table: &AnnotationTable,
    rewriter: &IdRewriter,
    policy: MismatchPolicy,
) -> Result<LabelMap, ReconcileError> {
    let mut map = LabelMap {
        n_rows: table.rows.len(),
        ..LabelMap::default()
    };

    for row in &table.rows {
        let rewrite = rewriter.rewrite(&row.raw_id);
        if let IdRewrite::Unchanged(id) = &rewrite {
            map.unchanged.push(id.clone());
        }
        let cell_id = rewrite.into_cell_id();
        // Later rows win when two raw ids collapse onto one cell id.
        if map.labels.insert(cell_id.clone(), row.label.clone()).is_some() {
            map.collisions.push(cell_id);
        }
    }

    if !map.unchanged.is_empty() {
        match policy {
            MismatchPolicy::Fail => {
                return Err(ReconcileError::PatternMismatch {
                    count: map.unchanged.len(),
                    first: map.unchanged[0].clone(),
                });
            }
            MismatchPolicy::Warn => {
                let examples = &map.unchanged[..map.unchanged.len().min(MAX_LOGGED_EXAMPLES)];
                tracing::warn!(
                    count = map.unchanged.len(),
                    examples = ?examples,
                    "annotation ids did not match the rewrite pattern; passed through unchanged"
                );
            }
        }
    }
    if !map.collisions.is_empty() {
        let examples = &map.collisions[..map.collisions.len().min(MAX_LOGGED_EXAMPLES)];
        tracing::warn!(
            count = map.collisions.len(),
            examples = ?examples,
            "annotation ids collapsed onto the same cell id; keeping the last row"
        );
    }

    tracing::info!(
        id_column = %table.id_column,
        label_column = %table.label_column,
        rows = map.n_rows,
        cell_ids = map.labels.len(),
        "built published label map"
    );
    Ok(map)
}

/// Left-joins published labels onto every cell; misses become `Unlabeled`.
pub fn reconcile(cells: &CellSet, map: &LabelMap) -> CellSet {
    let out = cells
        .iter()
        .map(|cell| {
            let mut cell = cell.clone();
            cell.published = match map.get(&cell.cell_id) {
                Some(label) => PublishedLabel::Labeled(label.to_string()),
                None => PublishedLabel::Unlabeled,
            };
            cell
        })
        .collect();
    let out = CellSet::new(out);
    tracing::info!(
        cells = out.len(),
        labeled = out.labeled_count(),
        annotation_rows = map.n_rows,
        "reconciled published labels"
    );
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_reconcile.rs"]
mod tests;
