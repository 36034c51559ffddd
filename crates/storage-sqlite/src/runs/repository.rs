use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::str::FromStr;
use std::sync::Arc;

use super::model::PipelineRunDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::pipeline_metadata;
use tickerwire_core::errors::{DatabaseError, Error, Result};
use tickerwire_core::runs::{PipelineRun, RunCounts, RunStatus};

/// Append-and-advance access to `pipeline_metadata`.
pub struct RunRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl RunRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub async fn create(&self, run: PipelineRun) -> Result<PipelineRun> {
        self.writer
            .exec(move |conn| {
                let row = PipelineRunDB::from(&run);
                diesel::insert_into(pipeline_metadata::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(run)
            })
            .await
    }

    /// Moves a live run to an intermediate status.
    pub async fn advance(&self, run_id: &str, status: RunStatus) -> Result<()> {
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = load_run(conn, &run_id)?;
                if row.end_time.is_some() {
                    return Err(Error::InvalidTransition {
                        from: RunStatus::from_str(&row.status)?,
                        to: status,
                    });
                }
                let current = RunStatus::from_str(&row.status)?;
                let next = current.transition(status)?;

                diesel::update(pipeline_metadata::table.find(&run_id))
                    .set(pipeline_metadata::status.eq(next.as_str()))
                    .execute(conn)
                    .into_core()?;
                debug!("run={} {} -> {}", run_id, current, next);
                Ok(())
            })
            .await
    }

    /// Writes the terminal status, end time and counts. A run is finalized once.
    pub async fn finalize(
        &self,
        run_id: &str,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<String>,
    ) -> Result<PipelineRun> {
        let run_id = run_id.to_string();
        self.writer
            .exec(move |conn| {
                let mut run = PipelineRun::try_from(load_run(conn, &run_id)?)
                    .map_err(Error::from)?;
                run.finalize(status, counts, error_message)?;

                diesel::update(pipeline_metadata::table.find(&run_id))
                    .set(&PipelineRunDB::from(&run))
                    .execute(conn)
                    .into_core()?;
                Ok(run)
            })
            .await
    }

    pub fn get(&self, run_id: &str) -> Result<Option<PipelineRun>> {
        let mut conn = get_connection(&self.pool)?;
        let row = pipeline_metadata::table
            .find(run_id)
            .select(PipelineRunDB::as_select())
            .first::<PipelineRunDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(PipelineRun::try_from).transpose()?)
    }

    /// Most recent runs first.
    pub fn recent(&self, limit: i64) -> Result<Vec<PipelineRun>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = pipeline_metadata::table
            .select(PipelineRunDB::as_select())
            .order((
                pipeline_metadata::start_time.desc(),
                pipeline_metadata::run_id.desc(),
            ))
            .limit(limit)
            .load::<PipelineRunDB>(&mut conn)
            .into_core()?;
        rows.into_iter()
            .map(|row| PipelineRun::try_from(row).map_err(Error::from))
            .collect()
    }

    pub fn count(&self) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        pipeline_metadata::table
            .count()
            .get_result::<i64>(&mut conn)
            .into_core()
    }
}

fn load_run(conn: &mut SqliteConnection, run_id: &str) -> Result<PipelineRunDB> {
    pipeline_metadata::table
        .find(run_id)
        .select(PipelineRunDB::as_select())
        .first::<PipelineRunDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::Database(DatabaseError::NotFound(format!("run {}", run_id))))
}
