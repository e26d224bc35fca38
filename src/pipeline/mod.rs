pub mod stage1_ingest;
pub mod stage2_reconcile;
pub mod stage3_filter;
pub mod stage4_normalize;
pub mod stage5_classify;
pub mod stage6_relabel;
pub mod stage7_concordance;
pub mod stage8_report;
