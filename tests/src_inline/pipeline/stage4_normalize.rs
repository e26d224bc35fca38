use super::{ExprAccessor, Stage4Params, build_expr_accessor};
use crate::input::mtx::CountMatrix;
use crate::model::cell::{CellRecord, CellSet};

fn matrix() -> CountMatrix {
    CountMatrix {
        genes: vec!["G1".into(), "G2".into()],
        barcodes: vec!["A-1".into(), "B-1".into(), "C-1".into()],
        cols: vec![vec![(0, 1), (1, 3)], vec![(1, 5)], vec![]],
    }
}

fn collect(expr: &dyn ExprAccessor, cell: usize) -> Vec<(u32, f32)> {
    let mut out = Vec::new();
    expr.for_cell(cell, &mut |gene, value| out.push((gene, value)));
    out
}

#[test]
fn test_accessor_follows_cell_order() {
    let cells = CellSet::new(vec![
        CellRecord::new("C-1".into(), 2),
        CellRecord::new("A-1".into(), 0),
    ]);
    let expr = build_expr_accessor(&matrix(), &cells, &Stage4Params::default());
    assert_eq!(expr.n_cells(), 2);
    assert_eq!(expr.cell_id(0), "C-1");
    assert_eq!(expr.cell_id(1), "A-1");
    assert_eq!(expr.genes(), &["G1".to_string(), "G2".to_string()]);
    assert!(collect(&expr, 0).is_empty());
}

#[test]
fn test_log_normalization() {
    let cells = CellSet::new(vec![CellRecord::new("A-1".into(), 0)]);
    let expr = build_expr_accessor(&matrix(), &cells, &Stage4Params::default());
    let values = collect(&expr, 0);
    assert_eq!(values.len(), 2);
    assert!((values[0].1 - 2500f32.ln_1p()).abs() < 1e-4);
    assert!((values[1].1 - 7500f32.ln_1p()).abs() < 1e-4);
}

#[test]
fn test_single_gene_cell_scales_to_target() {
    let cells = CellSet::new(vec![CellRecord::new("B-1".into(), 1)]);
    let params = Stage4Params { scale: 100.0 };
    let expr = build_expr_accessor(&matrix(), &cells, &params);
    let values = collect(&expr, 0);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].0, 1);
    assert!((values[0].1 - 100f32.ln_1p()).abs() < 1e-4);
}
