use super::{mito_mask, qc_stats, run_stage1};
use crate::input::mtx::CountMatrix;

fn matrix() -> CountMatrix {
    CountMatrix {
        genes: vec!["MT-CO1".into(), "mt-Co2".into(), "ACTB".into(), "RARE".into()],
        barcodes: vec!["AAAC-1".into(), "CCCG-1".into(), "GGGT-1".into()],
        cols: vec![
            vec![(0, 10), (1, 5), (2, 85)],
            vec![(1, 3), (2, 7), (3, 1)],
            vec![],
        ],
    }
}

#[test]
fn test_mito_prefix_is_case_sensitive() {
    let genes: Vec<String> = vec!["MT-CO1".into(), "mt-Co2".into(), "MTX".into()];
    assert_eq!(mito_mask(&genes), vec![true, false, false]);
}

#[test]
fn test_qc_stats_fraction() {
    let mito = vec![true, false, false];
    let stats = qc_stats(&[(0, 10), (1, 30), (2, 60)], &mito);
    assert_eq!(stats.feature_count, 3);
    assert_eq!(stats.total_count, 100);
    assert!((stats.mito_fraction - 0.10).abs() < 1e-6);
}

#[test]
fn test_qc_stats_empty_cell_has_zero_fraction() {
    let stats = qc_stats(&[], &[true]);
    assert_eq!(stats.total_count, 0);
    assert_eq!(stats.mito_fraction, 0.0);
}

#[test]
fn test_run_stage1_filters_genes_and_scores_cells() {
    let out = run_stage1(&matrix(), 2);
    // only genes seen in both non-empty cells survive
    assert_eq!(out.matrix.genes, vec!["mt-Co2", "ACTB"]);
    assert_eq!(out.n_genes_dropped, 2);
    assert_eq!(out.cells.len(), 3);

    let first = &out.cells.cells[0];
    assert_eq!(first.cell_id, "AAAC-1");
    assert_eq!(first.total_count, 90);
    assert_eq!(first.feature_count, 2);
    assert_eq!(first.mito_fraction, 0.0);

    let empty = &out.cells.cells[2];
    assert_eq!(empty.total_count, 0);
    assert_eq!(empty.mito_fraction, 0.0);
}

#[test]
fn test_mito_fraction_stays_in_unit_range() {
    let out = run_stage1(&matrix(), 0);
    for cell in out.cells.iter() {
        assert!((0.0..=1.0).contains(&cell.mito_fraction));
    }
    assert!((out.cells.cells[0].mito_fraction - 0.10).abs() < 1e-6);
}
