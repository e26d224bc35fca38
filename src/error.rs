use thiserror::Error;

use crate::input::InputError;
use crate::pipeline::stage2_reconcile::ReconcileError;
use crate::pipeline::stage5_classify::ClassifyError;
use crate::pipeline::stage8_report::ReportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("no cells carry a published label; check the id rewrite against the barcodes")]
    NoLabeledCells,
}
