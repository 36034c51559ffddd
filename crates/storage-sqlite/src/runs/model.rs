//! Database model for pipeline runs.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use std::str::FromStr;

use crate::errors::StorageError;
use tickerwire_core::runs::{PipelineRun, RunStatus};

/// Database model for a run ledger row. Times are RFC 3339 UTC text.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::pipeline_metadata)]
#[diesel(primary_key(run_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PipelineRunDB {
    pub run_id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: String,
    pub market_records_processed: i64,
    pub news_records_processed: i64,
    pub error_message: Option<String>,
}

impl From<&PipelineRun> for PipelineRunDB {
    fn from(run: &PipelineRun) -> Self {
        Self {
            run_id: run.run_id.clone(),
            start_time: format_time(&run.start_time),
            end_time: run.end_time.as_ref().map(format_time),
            status: run.status.as_str().to_string(),
            market_records_processed: run.market_records_processed,
            news_records_processed: run.news_records_processed,
            error_message: run.error_message.clone(),
        }
    }
}

impl TryFrom<PipelineRunDB> for PipelineRun {
    type Error = StorageError;

    fn try_from(db: PipelineRunDB) -> Result<Self, Self::Error> {
        let status = RunStatus::from_str(&db.status)
            .map_err(|_| StorageError::Decode(format!("status '{}'", db.status)))?;
        Ok(Self {
            start_time: parse_time(&db.start_time)?,
            end_time: db.end_time.as_deref().map(parse_time).transpose()?,
            run_id: db.run_id,
            status,
            market_records_processed: db.market_records_processed,
            news_records_processed: db.news_records_processed,
            error_message: db.error_message,
        })
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("run time '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerwire_core::runs::RunCounts;

    #[test]
    fn test_finalized_run_round_trips_through_row() {
        let mut run = PipelineRun::new();
        run.advance(RunStatus::Reporting).unwrap();
        run.finalize(
            RunStatus::PartialFailure,
            RunCounts { market: 2, news: 3 },
            Some("reporting: disk full".to_string()),
        )
        .unwrap();

        let row = PipelineRunDB::from(&run);
        assert_eq!(row.status, "PARTIAL_FAILURE");
        assert!(row.start_time.ends_with('Z'));

        let back = PipelineRun::try_from(row).unwrap();
        assert_eq!(back, run);
    }

    #[test]
    fn test_unknown_status_is_decode_error() {
        let mut row = PipelineRunDB::from(&PipelineRun::new());
        row.status = "PAUSED".to_string();
        assert!(matches!(
            PipelineRun::try_from(row),
            Err(StorageError::Decode(_))
        ));
    }
}
