use super::{
    ClassifyError, CorrelationPredictor, LabelPredictor, MissingPredictionPolicy, PredictOptions,
    Predictions, attach_predictions, run_stage5,
};
use crate::input::mtx::CountMatrix;
use crate::input::reference::ReferencePanel;
use crate::model::cell::{CellRecord, CellSet};
use crate::model::labels::Prediction;
use crate::pipeline::stage4_normalize::{
    ExprAccessor, RawCountsAccessor, Stage4Params, build_expr_accessor,
};

const GENES: [&str; 6] = ["PMEL", "TYR", "MLANA", "CD3E", "CD2", "LCK"];

fn reference() -> ReferencePanel {
    ReferencePanel {
        genes: GENES.iter().map(|g| g.to_string()).collect(),
        samples: vec!["m1".into(), "m2".into(), "t1".into(), "t2".into()],
        labels: vec![
            "Melanocytes".into(),
            "Melanocytes".into(),
            "T_cells".into(),
            "T_cells".into(),
        ],
        profiles: vec![
            vec![5.0, 4.0, 3.0, 0.1, 0.2, 0.0],
            vec![4.5, 4.2, 2.5, 0.0, 0.3, 0.1],
            vec![0.1, 0.0, 0.2, 5.0, 4.0, 3.0],
            vec![0.0, 0.3, 0.1, 4.4, 4.1, 2.9],
        ],
    }
}

fn query(columns: Vec<(&str, Vec<(u32, u64)>)>) -> (CountMatrix, CellSet) {
    let cells = CellSet::new(
        columns
            .iter()
            .enumerate()
            .map(|(i, (id, _))| CellRecord::new(id.to_string(), i))
            .collect(),
    );
    let matrix = CountMatrix {
        genes: GENES.iter().map(|g| g.to_string()).collect(),
        barcodes: columns.iter().map(|(id, _)| id.to_string()).collect(),
        cols: columns.into_iter().map(|(_, col)| col).collect(),
    };
    (matrix, cells)
}

fn melanocyte_like() -> Vec<(u32, u64)> {
    vec![(0, 50), (1, 30), (2, 20)]
}

fn t_cell_like() -> Vec<(u32, u64)> {
    vec![(3, 40), (4, 30), (5, 10)]
}

fn accessor(matrix: &CountMatrix, cells: &CellSet) -> RawCountsAccessor {
    build_expr_accessor(matrix, cells, &Stage4Params::default())
}

struct FixedPredictor(Predictions);

impl LabelPredictor for FixedPredictor {
    fn predict(
        &self,
        _expr: &dyn ExprAccessor,
        _reference: &ReferencePanel,
        _options: &PredictOptions,
    ) -> Result<Predictions, ClassifyError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_presets() {
    let default = PredictOptions::default_v1();
    let tuned = PredictOptions::tuned_v1();
    assert!(!default.prune);
    assert!(tuned.prune);
    assert!((tuned.quantile - 0.85).abs() < 1e-6);
    assert_ne!(default.name, tuned.name);
}

#[test]
fn test_correlation_predictor_assigns_matching_label() {
    let (matrix, cells) = query(vec![("A-1", melanocyte_like()), ("B-1", t_cell_like())]);
    let expr = accessor(&matrix, &cells);
    let preds = CorrelationPredictor::default()
        .predict(&expr, &reference(), &PredictOptions::default_v1())
        .unwrap();
    assert_eq!(preds.len(), 2);
    assert_eq!(preds["A-1"], Prediction::Label("Melanocytes".into()));
    assert_eq!(preds["B-1"], Prediction::Label("T_cells".into()));
}

#[test]
fn test_zero_signal_cell_is_no_call_only_when_pruning() {
    let (matrix, cells) = query(vec![
        ("A-1", melanocyte_like()),
        ("B-1", t_cell_like()),
        ("E-1", vec![]),
    ]);
    let expr = accessor(&matrix, &cells);
    let predictor = CorrelationPredictor::default();

    let default = predictor
        .predict(&expr, &reference(), &PredictOptions::default_v1())
        .unwrap();
    assert!(default["E-1"].label().is_some());

    let tuned = predictor
        .predict(&expr, &reference(), &PredictOptions::tuned_v1())
        .unwrap();
    assert_eq!(tuned["E-1"], Prediction::NoCall);
    assert_eq!(tuned["A-1"], Prediction::Label("Melanocytes".into()));
    assert_eq!(tuned["B-1"], Prediction::Label("T_cells".into()));
}

#[test]
fn test_pruning_flags_low_margin_outlier() {
    let mixed = vec![(0, 50), (1, 30), (2, 20), (3, 25)];
    let (matrix, cells) = query(vec![
        ("A-1", melanocyte_like()),
        ("A-2", melanocyte_like()),
        ("M-1", mixed),
        ("B-1", t_cell_like()),
    ]);
    let expr = accessor(&matrix, &cells);
    let predictor = CorrelationPredictor::default();

    let default = predictor
        .predict(&expr, &reference(), &PredictOptions::default_v1())
        .unwrap();
    assert_eq!(default["M-1"], Prediction::Label("Melanocytes".into()));

    let tuned = predictor
        .predict(&expr, &reference(), &PredictOptions::tuned_v1())
        .unwrap();
    assert_eq!(tuned["M-1"], Prediction::NoCall);
    assert_eq!(tuned["A-1"], Prediction::Label("Melanocytes".into()));
    assert_eq!(tuned["A-2"], Prediction::Label("Melanocytes".into()));
}

#[test]
fn test_no_shared_genes_is_an_error() {
    let (mut matrix, cells) = query(vec![("A-1", melanocyte_like())]);
    matrix.genes = vec!["X1", "X2", "X3", "X4", "X5", "X6"]
        .into_iter()
        .map(String::from)
        .collect();
    let expr = accessor(&matrix, &cells);
    let err = CorrelationPredictor::default()
        .predict(&expr, &reference(), &PredictOptions::default_v1())
        .unwrap_err();
    assert!(matches!(err, ClassifyError::NoSharedGenes));
}

#[test]
fn test_invalid_quantile_rejected() {
    let (matrix, cells) = query(vec![("A-1", melanocyte_like())]);
    let expr = accessor(&matrix, &cells);
    let options = PredictOptions {
        quantile: 1.5,
        ..PredictOptions::default_v1()
    };
    let err = CorrelationPredictor::default()
        .predict(&expr, &reference(), &options)
        .unwrap_err();
    assert!(matches!(err, ClassifyError::InvalidOptions(_)));
}

#[test]
fn test_run_stage5_with_injected_predictor() {
    let (matrix, cells) = query(vec![("A-1", melanocyte_like()), ("B-1", t_cell_like())]);
    let expr = accessor(&matrix, &cells);
    let mut fixed = Predictions::new();
    fixed.insert("A-1".into(), Prediction::Label("Fibroblasts".into()));
    fixed.insert("B-1".into(), Prediction::NoCall);

    let out = run_stage5(
        &cells,
        &expr,
        &reference(),
        &FixedPredictor(fixed),
        &PredictOptions::default_v1(),
        MissingPredictionPolicy::Abort,
    )
    .unwrap();
    assert_eq!(
        out.cells[0].predicted,
        Some(Prediction::Label("Fibroblasts".into()))
    );
    assert_eq!(out.cells[1].predicted, Some(Prediction::NoCall));
}

#[test]
fn test_missing_prediction_policy() {
    let cells = CellSet::new(vec![
        CellRecord::new("A-1".into(), 0),
        CellRecord::new("B-1".into(), 1),
    ]);
    let mut preds = Predictions::new();
    preds.insert("A-1".into(), Prediction::Label("T_cells".into()));

    let err = attach_predictions(&cells, &preds, MissingPredictionPolicy::Abort).unwrap_err();
    assert!(matches!(err, ClassifyError::MissingPrediction { ref cell_id } if cell_id == "B-1"));

    let out = attach_predictions(&cells, &preds, MissingPredictionPolicy::NoCall).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out.cells[1].predicted, Some(Prediction::NoCall));
}
