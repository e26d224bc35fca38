use super::json::render_summary_json;
use super::text::render_table;
use super::*;
use crate::pipeline::stage7_concordance::ContingencyTable;

#[test]
fn test_fraction_handles_zero_total() {
    assert_eq!(fraction(0, 0), 0.0);
    assert_eq!(fraction(1, 4), 0.25);
    assert_eq!(format_f32_6(0.25), "0.250000");
}

#[test]
fn test_render_table_margins() {
    let table = ContingencyTable::from_pairs(vec![
        ("malignant", "malignant"),
        ("stromal", "malignant"),
        ("stromal", "stromal"),
    ]);
    let text = render_table("coarse", "published", &table);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "coarse");
    assert_eq!(lines[1], "published  malignant  stromal  Total");
    assert_eq!(lines[2], "malignant          1        0      1");
    assert_eq!(lines[3], "stromal            1        1      2");
    assert_eq!(lines[4], "Total              2        1      3");
}

#[test]
fn test_summary_json_is_pretty_and_terminated() {
    let summary = SummaryData {
        tool: "kira-annotqc".to_string(),
        version: "0.1.0".to_string(),
        input: InputSummary {
            input_dir: "data".to_string(),
            annotations: "annot.csv".to_string(),
            n_features_raw: 3,
            n_genes_indexed: 3,
            n_genes_kept: 2,
            n_genes_dropped: 1,
            min_cells_per_gene: 5,
            n_cells: 0,
        },
        reconcile: ReconcileSummary {
            id_column: "orig_row_names".to_string(),
            label_column: "Cell_Type".to_string(),
            annotation_rows: 0,
            ids_unchanged: 0,
            id_collisions: 0,
            n_labeled: 0,
            n_unlabeled: 0,
        },
        qc_guides: crate::pipeline::stage3_filter::summarize_guides(
            &crate::model::cell::CellSet::default(),
            &crate::model::thresholds::QcGuides::default_v1(),
        ),
        n_retained: 0,
        presets: Vec::new(),
    };
    let json = render_summary_json(&summary).unwrap();
    assert!(json.ends_with("}\n"));
    assert!(json.contains("\n  \"tool\": \"kira-annotqc\""));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["qc_guides"]["min_count"], 500);
    assert_eq!(value["input"]["n_genes_dropped"], 1);
}
