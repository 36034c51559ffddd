//! `PipelineStore` backed by one SQLite file.

use async_trait::async_trait;
use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::db::{self, spawn_writer, DbPool};
use crate::records::RecordRepository;
use crate::runs::RunRepository;
use tickerwire_core::errors::Result;
use tickerwire_core::records::{Dataset, DatasetKind, RecordFilter};
use tickerwire_core::runs::{PipelineRun, RunCounts, RunStatus};
use tickerwire_core::store::{PipelineStore, StoreStats};

const RUNS_TABLE: &str = "pipeline_metadata";

pub struct SqlitePipelineStore {
    records: RecordRepository,
    runs: RunRepository,
}

impl SqlitePipelineStore {
    /// Opens (or creates) the database at `db_path` and applies migrations.
    ///
    /// Spawns the writer task, so it must be called inside a Tokio runtime.
    pub fn open(db_path: &Path) -> Result<Self> {
        let url = db::init(db_path)?;
        let pool = db::create_pool(&url)?;
        db::run_migrations(&pool)?;
        info!("Opened pipeline database at {}", url);
        Ok(Self::with_pool(pool))
    }

    pub fn with_pool(pool: Arc<DbPool>) -> Self {
        let writer = spawn_writer(pool.as_ref().clone());
        Self {
            records: RecordRepository::new(pool.clone(), writer.clone()),
            runs: RunRepository::new(pool, writer),
        }
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<PipelineRun>> {
        self.runs.get(run_id)
    }
}

#[async_trait]
impl PipelineStore for SqlitePipelineStore {
    async fn upsert(&self, dataset: &Dataset) -> Result<usize> {
        self.records.upsert(dataset).await
    }

    fn query(
        &self,
        kind: DatasetKind,
        filter: &RecordFilter,
        limit: Option<i64>,
    ) -> Result<Dataset> {
        self.records.query(kind, filter, limit)
    }

    async fn record_run_start(&self) -> Result<PipelineRun> {
        self.runs.create(PipelineRun::new()).await
    }

    async fn record_run_progress(&self, run_id: &str, status: RunStatus) -> Result<()> {
        self.runs.advance(run_id, status).await
    }

    async fn record_run_end(
        &self,
        run_id: &str,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<String>,
    ) -> Result<PipelineRun> {
        self.runs
            .finalize(run_id, status, counts, error_message)
            .await
    }

    fn history(&self, limit: i64) -> Result<Vec<PipelineRun>> {
        self.runs.recent(limit)
    }

    fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::new();
        for kind in DatasetKind::ALL {
            stats.insert(kind.table_name().to_string(), self.records.count(kind)?);
        }
        stats.insert(RUNS_TABLE.to_string(), self.runs.count()?);
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
