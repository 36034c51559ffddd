//! Orchestrator: drives fetch → clean → store → report for one run.
//!
//! ```text
//! SourceAdapter (market, news) → cleaner → PipelineStore::upsert
//!                                              ↓
//!                      reporter ← PipelineStore::query (read-back)
//! ```
//!
//! The run ledger row is advanced through [`RunStatus`](crate::runs::RunStatus) as
//! each stage begins and finalized exactly once.

mod pipeline_model;
mod pipeline_service;
mod source;

#[cfg(test)]
mod pipeline_service_tests;

pub use pipeline_model::{DatasetOutcome, RunOptions, RunOutcome, StageFailure};
pub use pipeline_service::PipelineService;
pub use source::SourceAdapter;
