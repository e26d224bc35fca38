mod error;
mod input;
mod logging;
mod model;
mod pipeline;
mod report;
mod stats;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::AppError;
use crate::input::annotations::load_annotations;
use crate::input::load_input_tenx;
use crate::input::reference::load_reference;
use crate::model::thresholds::{MIN_CELLS_PER_GENE, QcGuides, ReconcileRules};
use crate::pipeline::stage1_ingest::run_stage1;
use crate::pipeline::stage2_reconcile::{IdRewriter, MismatchPolicy, build_label_map, reconcile};
use crate::pipeline::stage3_filter::{filter_labeled, summarize_guides};
use crate::pipeline::stage4_normalize::{Stage4Params, build_expr_accessor};
use crate::pipeline::stage5_classify::{
    CorrelationPredictor, MissingPredictionPolicy, PredictOptions, run_stage5,
};
use crate::pipeline::stage6_relabel::relabel;
use crate::pipeline::stage7_concordance::run_stage7;
use crate::pipeline::stage8_report::{PresetRun, preset_summary, render_tables, write_reports};
use crate::report::{InputSummary, ReconcileSummary, SummaryData};

#[derive(Debug, Parser)]
#[command(name = "kira-annotqc", version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile published labels, predict cell types and tabulate agreement.
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// 10x directory with matrix.mtx, features.tsv/genes.tsv and barcodes.tsv (optionally .gz).
    #[arg(long)]
    input: PathBuf,

    /// Published annotation CSV.
    #[arg(long)]
    annotations: PathBuf,

    /// Reference expression TSV (genes x reference samples).
    #[arg(long)]
    reference_expr: PathBuf,

    /// Reference labels TSV (sample, label).
    #[arg(long)]
    reference_labels: PathBuf,

    /// Directory for cells.tsv, summary.json and report.txt.
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Preset::Both)]
    preset: Preset,

    #[arg(long, default_value = "orig_row_names")]
    id_column: String,

    #[arg(long, default_value = "Cell_Type")]
    label_column: String,

    /// Fail when an annotation id does not match the rewrite pattern.
    #[arg(long)]
    strict_ids: bool,

    #[arg(long, value_enum, default_value_t = MissingPrediction::Abort)]
    missing_prediction: MissingPrediction,

    /// Drop genes detected in fewer cells than this.
    #[arg(long, default_value_t = MIN_CELLS_PER_GENE)]
    min_cells: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Default,
    Tuned,
    Both,
}

impl Preset {
    fn options(self) -> Vec<PredictOptions> {
        match self {
            Preset::Default => vec![PredictOptions::default_v1()],
            Preset::Tuned => vec![PredictOptions::tuned_v1()],
            Preset::Both => vec![PredictOptions::default_v1(), PredictOptions::tuned_v1()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MissingPrediction {
    Abort,
    NoCall,
}

impl From<MissingPrediction> for MissingPredictionPolicy {
    fn from(value: MissingPrediction) -> Self {
        match value {
            MissingPrediction::Abort => MissingPredictionPolicy::Abort,
            MissingPrediction::NoCall => MissingPredictionPolicy::NoCall,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let result = match cli.command {
        Command::Run(args) => run(&args),
    };
    if let Err(err) = result {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: &RunArgs) -> Result<(), AppError> {
    let bundle = load_input_tenx(&args.input)?;
    let stage1 = run_stage1(&bundle.matrix, args.min_cells);

    let annotations = load_annotations(&args.annotations, &args.id_column, &args.label_column)?;
    let rewriter = IdRewriter::new(&ReconcileRules::default_v1())?;
    let policy = if args.strict_ids {
        MismatchPolicy::Fail
    } else {
        MismatchPolicy::Warn
    };
    let label_map = build_label_map(&annotations, &rewriter, policy)?;
    let reconciled = reconcile(&stage1.cells, &label_map);

    let qc_guides = summarize_guides(&reconciled, &QcGuides::default_v1());
    let retained = filter_labeled(&reconciled);
    if retained.is_empty() {
        return Err(AppError::NoLabeledCells);
    }

    let reference = load_reference(&args.reference_expr, &args.reference_labels)?;
    let expr = build_expr_accessor(&stage1.matrix, &retained, &Stage4Params::default());
    let predictor = CorrelationPredictor::default();

    let mut runs = Vec::new();
    for options in args.preset.options() {
        let classified = run_stage5(
            &retained,
            &expr,
            &reference,
            &predictor,
            &options,
            args.missing_prediction.into(),
        )?;
        let relabeled = relabel(&classified);
        let concordance = run_stage7(&relabeled);
        runs.push(PresetRun {
            options,
            cells: relabeled,
            concordance,
        });
    }

    let summary = SummaryData {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        input: InputSummary {
            input_dir: args.input.display().to_string(),
            annotations: args.annotations.display().to_string(),
            n_features_raw: bundle.n_features_raw,
            n_genes_indexed: bundle.n_genes_indexed,
            n_genes_kept: stage1.matrix.n_genes(),
            n_genes_dropped: stage1.n_genes_dropped,
            min_cells_per_gene: args.min_cells,
            n_cells: stage1.cells.len(),
        },
        reconcile: ReconcileSummary {
            id_column: annotations.id_column.clone(),
            label_column: annotations.label_column.clone(),
            annotation_rows: label_map.n_rows,
            ids_unchanged: label_map.unchanged.len(),
            id_collisions: label_map.collisions.len(),
            n_labeled: reconciled.labeled_count(),
            n_unlabeled: reconciled.len() - reconciled.labeled_count(),
        },
        qc_guides,
        n_retained: retained.len(),
        presets: runs.iter().map(preset_summary).collect(),
    };

    let tables = render_tables(&runs);
    for table in &tables {
        println!("{table}");
    }

    if let Some(out) = &args.out {
        write_reports(out, &summary, &runs, &tables)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
