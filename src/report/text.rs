use std::fmt::Display;

use crate::pipeline::stage7_concordance::ContingencyTable;
use crate::report::{PresetSummary, SummaryData, format_f32_6};

const TOTAL: &str = "Total";

/// Renders a contingency table with right-aligned counts and margins.
pub fn render_table<R: Display, C: Display>(
    title: &str,
    corner: &str,
    table: &ContingencyTable<R, C>,
) -> String {
    let row_names: Vec<String> = table.rows.iter().map(ToString::to_string).collect();
    let mut col_names: Vec<String> = table.cols.iter().map(ToString::to_string).collect();
    col_names.push(TOTAL.to_string());

    let row_totals = table.row_totals();
    let mut body: Vec<Vec<String>> = table
        .counts
        .iter()
        .zip(&row_totals)
        .map(|(row, total)| {
            row.iter()
                .chain(std::iter::once(total))
                .map(ToString::to_string)
                .collect()
        })
        .collect();
    let mut footer: Vec<String> = table.col_totals().iter().map(ToString::to_string).collect();
    footer.push(table.total().to_string());
    body.push(footer);

    let mut names = row_names;
    names.push(TOTAL.to_string());
    let name_width = names
        .iter()
        .map(|n| n.chars().count())
        .chain(std::iter::once(corner.chars().count()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = col_names
        .iter()
        .enumerate()
        .map(|(c, name)| {
            body.iter()
                .map(|row| row[c].len())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&format!("{:<name_width$}", corner));
    for (name, width) in col_names.iter().zip(&widths) {
        out.push_str(&format!("  {:>width$}", name));
    }
    out.push('\n');
    for (name, row) in names.iter().zip(&body) {
        out.push_str(&format!("{:<name_width$}", name));
        for (value, width) in row.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", value));
        }
        out.push('\n');
    }
    out
}

pub fn render_report_text(summary: &SummaryData, tables: &[String]) -> String {
    let mut out = String::new();

    out.push_str("Published vs Predicted Cell-Type Concordance Report\n");
    out.push_str("===================================================\n\n");

    out.push_str("1. Input\n");
    out.push_str(&format!("Cells in matrix: {}\n", summary.input.n_cells));
    out.push_str(&format!(
        "Genes: {} indexed, {} kept (detected in >= {} cells)\n\n",
        summary.input.n_genes_indexed,
        summary.input.n_genes_kept,
        summary.input.min_cells_per_gene
    ));

    out.push_str("2. Barcode reconciliation\n");
    out.push_str(&format!(
        "Annotation rows: {}\n",
        summary.reconcile.annotation_rows
    ));
    out.push_str(&format!(
        "Ids not matching the rewrite pattern: {}\n",
        summary.reconcile.ids_unchanged
    ));
    out.push_str(&format!(
        "Ids collapsed onto an existing cell (last row kept): {}\n",
        summary.reconcile.id_collisions
    ));
    out.push_str(&format!(
        "Labeled cells: {}\nUnlabeled cells: {}\n\n",
        summary.reconcile.n_labeled, summary.reconcile.n_unlabeled
    ));

    let qc = &summary.qc_guides;
    out.push_str("3. QC guides (shown for inspection, not applied)\n");
    out.push_str(&format!(
        "total_count < {}: {}\n",
        qc.min_count, qc.below_min_count
    ));
    out.push_str(&format!(
        "total_count > {}: {}\n",
        qc.max_count, qc.above_max_count
    ));
    out.push_str(&format!(
        "mito_fraction > {}: {}\n",
        format_f32_6(qc.max_mito_fraction),
        qc.above_max_mito
    ));
    out.push_str(&format!("Outside any guide: {}\n", qc.outside_any));
    out.push_str(&format!(
        "Median total_count: {}\nMedian feature_count: {}\nMedian mito_fraction: {}\n",
        format_f32_6(qc.median_total_count),
        format_f32_6(qc.median_feature_count),
        format_f32_6(qc.median_mito_fraction)
    ));
    out.push_str(&format!(
        "Retained cells (published label present): {}\n\n",
        summary.n_retained
    ));

    out.push_str("4. Concordance\n");
    for preset in &summary.presets {
        out.push_str(&preset_line(preset));
    }
    out.push('\n');
    for table in tables {
        out.push_str(table);
        out.push('\n');
    }

    out
}

fn preset_line(preset: &PresetSummary) -> String {
    format!(
        "{} (quantile={}, prune={}): coarse agreement {}/{} ({}), malignant in both {}, no-calls {}\n",
        preset.preset,
        preset.quantile,
        preset.prune,
        preset.coarse_agreement,
        preset.n_cells,
        format_f32_6(preset.coarse_agreement_fraction),
        preset.malignant_both,
        preset.no_calls
    )
}
