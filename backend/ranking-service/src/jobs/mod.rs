// ============================================
// Background Jobs Module
// ============================================
//
// Contains job runners for:
// 1. Score batch recomputation (persisted ranking_score)
// 2. Ranking inspection report
//
// These jobs are triggered via command line argument
// (--mode score-batch | --mode inspect) or a Kubernetes CronJob.

pub mod inspect;
pub mod score_batch;

pub use inspect::{build_inspection_report, InspectionReport};
pub use score_batch::{BatchJobStats, ScoreBatchConfig, ScoreBatchJob};
