use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;

/// Read-only reference panel consumed by the label predictor.
///
/// `profiles[sample]` is a dense log-expression vector aligned with `genes`.
#[derive(Debug, Clone)]
pub struct ReferencePanel {
    pub genes: Vec<String>,
    pub samples: Vec<String>,
    pub labels: Vec<String>,
    pub profiles: Vec<Vec<f32>>,
}

impl ReferencePanel {
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Distinct labels in lexicographic order.
    pub fn label_set(&self) -> Vec<String> {
        let mut out: Vec<String> = self.labels.clone();
        out.sort();
        out.dedup();
        out
    }

    /// Sample indices grouped by label, labels in lexicographic order.
    pub fn samples_by_label(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut out: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, label) in self.labels.iter().enumerate() {
            out.entry(label.as_str()).or_default().push(idx);
        }
        out
    }
}

pub fn load_reference(expr_path: &Path, labels_path: &Path) -> Result<ReferencePanel, InputError> {
    let sample_labels = load_reference_labels(labels_path)?;
    let (genes, header_samples, columns) = load_reference_expr(expr_path)?;

    let mut seen: HashSet<&str> = HashSet::with_capacity(header_samples.len());
    for sample in &header_samples {
        if !seen.insert(sample.as_str()) {
            return Err(InputError::InvalidInput(format!(
                "duplicate reference sample {sample} in {}",
                expr_path.display()
            )));
        }
    }
    let mut unmatched: Vec<&str> = sample_labels
        .keys()
        .map(String::as_str)
        .filter(|sample| !seen.contains(sample))
        .collect();
    if !unmatched.is_empty() {
        unmatched.sort_unstable();
        return Err(InputError::InvalidInput(format!(
            "{} labeled reference samples have no expression profile (first: {})",
            unmatched.len(),
            unmatched[0]
        )));
    }

    let mut samples = Vec::new();
    let mut labels = Vec::new();
    let mut profiles = Vec::new();
    for (sample, column) in header_samples.into_iter().zip(columns) {
        match sample_labels.get(&sample) {
            Some(label) => {
                labels.push(label.clone());
                samples.push(sample);
                profiles.push(column);
            }
            None => {
                tracing::warn!(sample = %sample, "reference sample has no label; skipping");
            }
        }
    }

    let panel = ReferencePanel {
        genes,
        samples,
        labels,
        profiles,
    };
    tracing::info!(
        samples = panel.n_samples(),
        genes = panel.genes.len(),
        labels = panel.label_set().len(),
        "loaded reference panel"
    );
    Ok(panel)
}

fn load_reference_labels(path: &Path) -> Result<HashMap<String, String>, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut out = HashMap::new();
    for record in tsv.records() {
        let record = record?;
        let (Some(sample), Some(label)) = (record.get(0), record.get(1)) else {
            return Err(InputError::Parse(format!(
                "reference labels row has <2 columns in {}",
                path.display()
            )));
        };
        if out.insert(sample.to_string(), label.to_string()).is_some() {
            return Err(InputError::InvalidInput(format!(
                "duplicate reference sample {sample}"
            )));
        }
    }
    if out.is_empty() {
        return Err(InputError::Parse("reference labels file is empty".to_string()));
    }
    Ok(out)
}

type ReferenceExpr = (Vec<String>, Vec<String>, Vec<Vec<f32>>);

fn load_reference_expr(path: &Path) -> Result<ReferenceExpr, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut tsv = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let samples: Vec<String> = tsv.headers()?.iter().skip(1).map(str::to_string).collect();
    if samples.is_empty() {
        return Err(InputError::Parse(format!(
            "reference expression header has no samples in {}",
            path.display()
        )));
    }

    let mut genes = Vec::new();
    let mut columns: Vec<Vec<f32>> = vec![Vec::new(); samples.len()];
    for record in tsv.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let mut fields = record.iter();
        let gene = fields.next().unwrap_or_default().to_string();
        for (column, raw) in columns.iter_mut().zip(fields) {
            let value: f32 = raw.parse().map_err(|_| {
                InputError::Parse(format!(
                    "invalid reference value '{raw}' at line {line} of {}",
                    path.display()
                ))
            })?;
            column.push(value);
        }
        genes.push(gene);
    }

    if genes.is_empty() {
        return Err(InputError::Parse(format!(
            "reference expression file {} has no genes",
            path.display()
        )));
    }
    Ok((genes, samples, columns))
}
