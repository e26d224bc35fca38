use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::model::cell::CellSet;
use crate::model::labels::{CoarseLabel, Prediction};
use crate::pipeline::stage5_classify::PredictOptions;
use crate::pipeline::stage7_concordance::Stage7Output;
use crate::report::json::render_summary_json;
use crate::report::text::{render_report_text, render_table};
use crate::report::{PresetSummary, SummaryData, format_f32_6, fraction};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preset runs disagree on the retained cells")]
    MisalignedRuns,
}

/// Cells and concordance tables for one predictor configuration.
#[derive(Debug, Clone)]
pub struct PresetRun {
    pub options: PredictOptions,
    pub cells: CellSet,
    pub concordance: Stage7Output,
}

pub fn preset_summary(run: &PresetRun) -> PresetSummary {
    let no_calls = run
        .cells
        .iter()
        .filter(|c| matches!(c.predicted, Some(Prediction::NoCall)))
        .count();
    let agreement = run.concordance.coarse.diagonal();
    PresetSummary {
        preset: run.options.name.to_string(),
        quantile: run.options.quantile,
        prune: run.options.prune,
        n_cells: run.cells.len(),
        no_calls,
        coarse_agreement: agreement,
        coarse_agreement_fraction: fraction(agreement, run.cells.len()),
        malignant_both: run
            .concordance
            .coarse
            .get(&CoarseLabel::Malignant, &CoarseLabel::Malignant),
        coarse: run.concordance.coarse.to_serializable(),
        fine: run.concordance.fine.to_serializable(),
    }
}

pub fn render_tables(runs: &[PresetRun]) -> Vec<String> {
    let mut out = Vec::with_capacity(runs.len() * 2);
    for run in runs {
        out.push(render_table(
            &format!("[{}] coarse: published x predicted", run.options.name),
            "published",
            &run.concordance.coarse,
        ));
        out.push(render_table(
            &format!("[{}] fine: published x predicted", run.options.name),
            "published",
            &run.concordance.fine,
        ));
    }
    out
}

pub fn write_reports(
    out_dir: &Path,
    summary: &SummaryData,
    runs: &[PresetRun],
    tables: &[String],
) -> Result<(), ReportError> {
    fs::create_dir_all(out_dir)?;

    write_cell_tsv(runs, &out_dir.join("cells.tsv"))?;

    let json = render_summary_json(summary)?;
    write_text(&out_dir.join("summary.json"), &json)?;

    let report = render_report_text(summary, tables);
    write_text(&out_dir.join("report.txt"), &report)?;

    tracing::info!(out = %out_dir.display(), "wrote reports");
    Ok(())
}

fn write_cell_tsv(runs: &[PresetRun], path: &Path) -> Result<(), ReportError> {
    let Some(first) = runs.first() else {
        return Ok(());
    };
    for run in &runs[1..] {
        let same = run.cells.len() == first.cells.len()
            && run
                .cells
                .iter()
                .zip(first.cells.iter())
                .all(|(a, b)| a.cell_id == b.cell_id);
        if !same {
            return Err(ReportError::MisalignedRuns);
        }
    }

    let mut w = BufWriter::new(File::create(path)?);
    let mut header = vec![
        "barcode".to_string(),
        "feature_count".to_string(),
        "total_count".to_string(),
        "mito_fraction".to_string(),
        "published_label".to_string(),
        "coarse_published".to_string(),
    ];
    for run in runs {
        header.push(format!("predicted_{}", run.options.name));
        header.push(format!("coarse_predicted_{}", run.options.name));
    }
    writeln!(w, "{}", header.join("\t"))?;

    let mut row_order = (0..first.cells.len()).collect::<Vec<_>>();
    row_order.sort_by(|&a, &b| first.cells.cells[a].cell_id.cmp(&first.cells.cells[b].cell_id));

    for idx in row_order {
        let cell = &first.cells.cells[idx];
        let mut row = vec![
            cell.cell_id.clone(),
            cell.feature_count.to_string(),
            cell.total_count.to_string(),
            format_f32_6(cell.mito_fraction),
            cell.published.to_string(),
            coarse_name(cell.coarse_published),
        ];
        for run in runs {
            let cell = &run.cells.cells[idx];
            row.push(
                cell.predicted
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            );
            row.push(coarse_name(cell.coarse_predicted));
        }
        writeln!(w, "{}", row.join("\t"))?;
    }
    w.flush()?;
    Ok(())
}

fn coarse_name(label: Option<CoarseLabel>) -> String {
    label.map(|l| l.as_str().to_string()).unwrap_or_default()
}

fn write_text(path: &Path, content: &str) -> Result<(), ReportError> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(content.as_bytes())?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage8_report.rs"]
mod tests;
