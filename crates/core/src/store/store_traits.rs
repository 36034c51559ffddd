//! Storage traits for the pipeline.
//!
//! The trait abstracts the persistence layer so the orchestrator can be exercised
//! against in-memory doubles; `tickerwire-storage-sqlite` provides the real backend.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::Result;
use crate::records::{Dataset, DatasetKind, RecordFilter};
use crate::runs::{PipelineRun, RunCounts, RunStatus};

/// Row counts keyed by table name.
pub type StoreStats = BTreeMap<String, i64>;

/// Durable keyed tables per dataset plus the run ledger.
///
/// # Contract
///
/// - `upsert` is insert-or-replace on the natural key and atomic per call: either
///   every row of the batch is committed or none is.
/// - Run rows only move forward through [`RunStatus`] and are finalized once.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    // =========================================================================
    // Records
    // =========================================================================

    /// Upserts a cleaned batch, returning the number of rows written.
    async fn upsert(&self, dataset: &Dataset) -> Result<usize>;

    /// Reads back records, newest fetch first, then by key.
    fn query(&self, kind: DatasetKind, filter: &RecordFilter, limit: Option<i64>)
        -> Result<Dataset>;

    // =========================================================================
    // Run ledger
    // =========================================================================

    /// Inserts a new `INITIALIZED` run row.
    async fn record_run_start(&self) -> Result<PipelineRun>;

    /// Persists an intermediate status.
    async fn record_run_progress(&self, run_id: &str, status: RunStatus) -> Result<()>;

    /// Finalizes a run with its terminal status.
    async fn record_run_end(
        &self,
        run_id: &str,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<String>,
    ) -> Result<PipelineRun>;

    /// Most recent runs first.
    fn history(&self, limit: i64) -> Result<Vec<PipelineRun>>;

    /// Row counts for every table.
    fn stats(&self) -> Result<StoreStats>;
}
