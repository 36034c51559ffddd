//! Pipeline run domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Status of a pipeline run.
///
/// Runs move forward through the stages in declaration order and end in exactly
/// one terminal status. Any non-terminal status may jump straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Ledger row created
    #[default]
    Initialized,
    Fetching,
    Cleaning,
    Storing,
    Reporting,
    /// Every dataset stored and reported
    Succeeded,
    /// Data committed, but a report or export artifact is missing
    PartialFailure,
    /// At least one dataset failed a fatal stage
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Initialized => "INITIALIZED",
            RunStatus::Fetching => "FETCHING",
            RunStatus::Cleaning => "CLEANING",
            RunStatus::Storing => "STORING",
            RunStatus::Reporting => "REPORTING",
            RunStatus::Succeeded => "SUCCEEDED",
            RunStatus::PartialFailure => "PARTIAL_FAILURE",
            RunStatus::Failed => "FAILED",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            RunStatus::Initialized => 0,
            RunStatus::Fetching => 1,
            RunStatus::Cleaning => 2,
            RunStatus::Storing => 3,
            RunStatus::Reporting => 4,
            RunStatus::Succeeded | RunStatus::PartialFailure | RunStatus::Failed => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 5
    }

    /// Whether the ledger may move from `self` to `next`.
    ///
    /// Terminal rows are frozen. Otherwise the status only moves forward; `Failed`
    /// is reachable from every non-terminal status, the other terminal statuses only
    /// after reporting started.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            RunStatus::Failed => true,
            RunStatus::Succeeded | RunStatus::PartialFailure => {
                *self == RunStatus::Reporting
            }
            _ => next.rank() > self.rank(),
        }
    }

    /// Validates a transition, returning the target status.
    pub fn transition(&self, next: RunStatus) -> Result<RunStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Picks the worse of two terminal outcomes.
    pub fn worst(self, other: RunStatus) -> RunStatus {
        fn severity(status: RunStatus) -> u8 {
            match status {
                RunStatus::Failed => 2,
                RunStatus::PartialFailure => 1,
                _ => 0,
            }
        }
        if severity(other) > severity(self) {
            other
        } else {
            self
        }
    }

    /// Whether the process should exit successfully for this status.
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::PartialFailure)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INITIALIZED" => Ok(RunStatus::Initialized),
            "FETCHING" => Ok(RunStatus::Fetching),
            "CLEANING" => Ok(RunStatus::Cleaning),
            "STORING" => Ok(RunStatus::Storing),
            "REPORTING" => Ok(RunStatus::Reporting),
            "SUCCEEDED" => Ok(RunStatus::Succeeded),
            "PARTIAL_FAILURE" => Ok(RunStatus::PartialFailure),
            "FAILED" => Ok(RunStatus::Failed),
            other => Err(Error::Unexpected(format!("unknown run status '{}'", other))),
        }
    }
}

/// Records processed per dataset, written when a run is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunCounts {
    pub market: i64,
    pub news: i64,
}

/// One row of the run ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub run_id: String,
    pub start_time: DateTime<Utc>,
    /// Set once, when the run reaches a terminal status
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub market_records_processed: i64,
    pub news_records_processed: i64,
    pub error_message: Option<String>,
}

impl PipelineRun {
    /// Creates a fresh `Initialized` run with a time-ordered id.
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::now_v7().to_string(),
            start_time: Utc::now().trunc_subsecs(0),
            end_time: None,
            status: RunStatus::Initialized,
            market_records_processed: 0,
            news_records_processed: 0,
            error_message: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    /// Moves a live run to `status`.
    pub fn advance(&mut self, status: RunStatus) -> Result<()> {
        self.status = self.status.transition(status)?;
        Ok(())
    }

    /// Freezes the run with its terminal status, counts and error message.
    pub fn finalize(
        &mut self,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<String>,
    ) -> Result<()> {
        if !status.is_terminal() || self.is_finalized() {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: status,
            });
        }
        self.advance(status)?;
        self.end_time = Some(Utc::now().trunc_subsecs(0));
        self.market_records_processed = counts.market;
        self.news_records_processed = counts.news;
        self.error_message = error_message;
        Ok(())
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
