use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use crate::input::reference::ReferencePanel;
use crate::model::cell::CellSet;
use crate::model::labels::Prediction;
use crate::pipeline::stage4_normalize::ExprAccessor;
use crate::stats::{center, centered_correlation, mad, median, quantile, rank_average};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("query and reference share no genes")]
    NoSharedGenes,
    #[error("reference panel is empty")]
    EmptyReference,
    #[error("invalid predictor options: {0}")]
    InvalidOptions(String),
    #[error("predictor returned no result for cell {cell_id}")]
    MissingPrediction { cell_id: String },
}

/// Cell id -> prediction.
pub type Predictions = BTreeMap<String, Prediction>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictOptions {
    pub name: &'static str,
    /// Quantile of per-sample correlations used as a label's score.
    pub quantile: f32,
    /// Turn low-confidence assignments into no-calls.
    pub prune: bool,
}

impl PredictOptions {
    pub fn default_v1() -> Self {
        Self {
            name: "default",
            quantile: 0.8,
            prune: false,
        }
    }

    pub fn tuned_v1() -> Self {
        Self {
            name: "tuned",
            quantile: 0.85,
            prune: true,
        }
    }

    fn validate(&self) -> Result<(), ClassifyError> {
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(ClassifyError::InvalidOptions(format!(
                "quantile {} outside [0, 1]",
                self.quantile
            )));
        }
        Ok(())
    }
}

/// Reference-based label predictor.
pub trait LabelPredictor {
    fn predict(
        &self,
        expr: &dyn ExprAccessor,
        reference: &ReferencePanel,
        options: &PredictOptions,
    ) -> Result<Predictions, ClassifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPredictionPolicy {
    #[default]
    Abort,
    NoCall,
}

/// Rank-correlation predictor against labeled reference samples.
#[derive(Debug, Clone)]
pub struct CorrelationPredictor {
    pub nmads: f64,
    /// Overrides the per-pair marker count derived from the label count.
    pub markers_per_pair: Option<usize>,
}

impl Default for CorrelationPredictor {
    fn default() -> Self {
        Self {
            nmads: 3.0,
            markers_per_pair: None,
        }
    }
}

struct CellScores {
    best: Option<usize>,
    delta: f64,
}

impl LabelPredictor for CorrelationPredictor {
    fn predict(
        &self,
        expr: &dyn ExprAccessor,
        reference: &ReferencePanel,
        options: &PredictOptions,
    ) -> Result<Predictions, ClassifyError> {
        options.validate()?;
        if reference.n_samples() == 0 {
            return Err(ClassifyError::EmptyReference);
        }

        let shared = shared_genes(expr.genes(), &reference.genes);
        if shared.is_empty() {
            return Err(ClassifyError::NoSharedGenes);
        }

        let by_label = reference.samples_by_label();
        let labels: Vec<&str> = by_label.keys().copied().collect();
        let groups: Vec<&[usize]> = by_label.values().map(Vec::as_slice).collect();

        let mut markers = self.select_markers(reference, &shared, &groups);
        if markers.is_empty() {
            tracing::warn!("no label-specific marker genes found; scoring on all shared genes");
            markers = shared.clone();
        }
        tracing::info!(
            preset = options.name,
            shared_genes = shared.len(),
            markers = markers.len(),
            labels = labels.len(),
            "scoring cells against reference"
        );

        // query gene id -> marker position
        let mut marker_pos: HashMap<u32, usize> = HashMap::with_capacity(markers.len());
        for (pos, &(query_gene, _)) in markers.iter().enumerate() {
            marker_pos.insert(query_gene, pos);
        }

        let ref_ranked: Vec<(Vec<f64>, f64)> = reference
            .profiles
            .iter()
            .map(|profile| {
                let values: Vec<f64> = markers
                    .iter()
                    .map(|&(_, ref_row)| profile[ref_row] as f64)
                    .collect();
                center(&rank_average(&values))
            })
            .collect();

        let mut scored = Vec::with_capacity(expr.n_cells());
        for cell in 0..expr.n_cells() {
            let mut values = vec![0f64; markers.len()];
            expr.for_cell(cell, &mut |gene, value| {
                if let Some(&pos) = marker_pos.get(&gene) {
                    values[pos] = value as f64;
                }
            });
            let (query, query_norm) = center(&rank_average(&values));
            scored.push(score_cell(
                &query,
                query_norm,
                &ref_ranked,
                &groups,
                options.quantile as f64,
                options.prune,
            ));
        }

        let keep = if options.prune {
            self.prune(&scored)
        } else {
            vec![true; scored.len()]
        };

        let mut out = Predictions::new();
        let mut no_calls = 0usize;
        for (cell, (scores, keep)) in scored.iter().zip(keep).enumerate() {
            let prediction = match scores.best {
                Some(best) if keep => Prediction::Label(labels[best].to_string()),
                _ => {
                    no_calls += 1;
                    Prediction::NoCall
                }
            };
            out.insert(expr.cell_id(cell).to_string(), prediction);
        }
        tracing::info!(
            preset = options.name,
            cells = out.len(),
            no_calls,
            "predicted labels"
        );
        Ok(out)
    }
}

impl CorrelationPredictor {
    fn markers_per_pair(&self, n_labels: usize) -> usize {
        if let Some(n) = self.markers_per_pair {
            return n;
        }
        let n = 500.0 * (2.0f64 / 3.0).powf((n_labels as f64).log2());
        n.round().max(1.0) as usize
    }

    /// Union of the top genes up-regulated in each label against every
    /// other label, by difference of label medians.
    fn select_markers(
        &self,
        reference: &ReferencePanel,
        shared: &[(u32, usize)],
        groups: &[&[usize]],
    ) -> Vec<(u32, usize)> {
        if groups.len() < 2 {
            return shared.to_vec();
        }
        let medians: Vec<Vec<f64>> = groups
            .iter()
            .map(|samples| {
                shared
                    .iter()
                    .map(|&(_, ref_row)| {
                        let values: Vec<f64> = samples
                            .iter()
                            .map(|&s| reference.profiles[s][ref_row] as f64)
                            .collect();
                        median(&values).unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        let per_pair = self.markers_per_pair(groups.len());
        let mut chosen = BTreeSet::new();
        for (a, med_a) in medians.iter().enumerate() {
            for (b, med_b) in medians.iter().enumerate() {
                if a == b {
                    continue;
                }
                let mut diffs: Vec<(f64, usize)> = med_a
                    .iter()
                    .zip(med_b)
                    .enumerate()
                    .map(|(idx, (x, y))| (x - y, idx))
                    .filter(|(d, _)| *d > 0.0)
                    .collect();
                diffs.sort_by(|x, y| y.0.total_cmp(&x.0).then(x.1.cmp(&y.1)));
                chosen.extend(diffs.into_iter().take(per_pair).map(|(_, idx)| idx));
            }
        }
        chosen.into_iter().map(|idx| shared[idx]).collect()
    }

    /// Flags cells whose best-vs-median margin is an outlier within their
    /// assigned label.
    fn prune(&self, scored: &[CellScores]) -> Vec<bool> {
        let mut deltas_by_label: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for s in scored {
            if let (Some(best), true) = (s.best, s.delta.is_finite()) {
                deltas_by_label.entry(best).or_default().push(s.delta);
            }
        }
        let cutoffs: BTreeMap<usize, f64> = deltas_by_label
            .iter()
            .map(|(&label, deltas)| {
                let med = median(deltas).unwrap_or(0.0);
                let spread = mad(deltas).unwrap_or(0.0);
                (label, med - self.nmads * spread)
            })
            .collect();

        scored
            .iter()
            .map(|s| match s.best {
                Some(best) => cutoffs.get(&best).is_some_and(|&cut| s.delta >= cut),
                None => false,
            })
            .collect()
    }
}

fn shared_genes(query: &[String], reference: &[String]) -> Vec<(u32, usize)> {
    let mut ref_rows: HashMap<&str, usize> = HashMap::with_capacity(reference.len());
    for (row, gene) in reference.iter().enumerate() {
        ref_rows.entry(gene.as_str()).or_insert(row);
    }
    query
        .iter()
        .enumerate()
        .filter_map(|(gene_id, symbol)| {
            ref_rows
                .get(symbol.as_str())
                .map(|&row| (gene_id as u32, row))
        })
        .collect()
}

fn score_cell(
    query: &[f64],
    query_norm: f64,
    reference: &[(Vec<f64>, f64)],
    groups: &[&[usize]],
    q: f64,
    prune: bool,
) -> CellScores {
    // A cell with no marker signal has undefined correlations; it still gets
    // the first label unpruned, and a no-call when pruning.
    if query_norm == 0.0 && prune {
        return CellScores {
            best: None,
            delta: f64::NAN,
        };
    }

    let scores: Vec<f64> = groups
        .iter()
        .map(|samples| {
            let correlations: Vec<f64> = samples
                .iter()
                .map(|&s| {
                    let (ref_ranks, ref_norm) = &reference[s];
                    centered_correlation(query, query_norm, ref_ranks, *ref_norm).unwrap_or(0.0)
                })
                .collect();
            quantile(&correlations, q).unwrap_or(0.0)
        })
        .collect();

    let mut best = 0usize;
    for (idx, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = idx;
        }
    }
    let delta = scores[best] - median(&scores).unwrap_or(scores[best]);
    CellScores {
        best: Some(best),
        delta,
    }
}

/// Joins predictions onto cells by cell id.
pub fn attach_predictions(
    cells: &CellSet,
    predictions: &Predictions,
    policy: MissingPredictionPolicy,
) -> Result<CellSet, ClassifyError> {
    let mut out = Vec::with_capacity(cells.len());
    let mut missing = 0usize;
    for cell in cells.iter() {
        let prediction = match predictions.get(&cell.cell_id) {
            Some(p) => p.clone(),
            None => match policy {
                MissingPredictionPolicy::Abort => {
                    return Err(ClassifyError::MissingPrediction {
                        cell_id: cell.cell_id.clone(),
                    });
                }
                MissingPredictionPolicy::NoCall => {
                    missing += 1;
                    Prediction::NoCall
                }
            },
        };
        let mut cell = cell.clone();
        cell.predicted = Some(prediction);
        out.push(cell);
    }
    if missing > 0 {
        tracing::warn!(
            missing,
            "predictor returned no result for some cells; recorded as no-call"
        );
    }
    Ok(CellSet::new(out))
}

pub fn run_stage5(
    cells: &CellSet,
    expr: &dyn ExprAccessor,
    reference: &ReferencePanel,
    predictor: &dyn LabelPredictor,
    options: &PredictOptions,
    policy: MissingPredictionPolicy,
) -> Result<CellSet, ClassifyError> {
    let predictions = predictor.predict(expr, reference, options)?;
    attach_predictions(cells, &predictions, policy)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_classify.rs"]
mod tests;
