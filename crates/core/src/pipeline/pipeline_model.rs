//! Orchestrator input and output models.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::{DatasetKind, FetchTimestamp};
use crate::reporting::ReportArtifacts;
use crate::runs::{PipelineRun, RunStatus};
use crate::store::StoreStats;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Pins the fetch instant (replays, tests). Defaults to now.
    pub fetch_timestamp: Option<DateTime<Utc>>,
    /// Datasets left out of this run entirely. A skipped dataset is not a failure.
    pub skip: Vec<DatasetKind>,
}

impl RunOptions {
    pub fn includes(&self, kind: DatasetKind) -> bool {
        !self.skip.contains(&kind)
    }
}

/// The stage a dataset failed in, with the logged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub stage: RunStatus,
    pub message: String,
}

/// What happened to one dataset during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetOutcome {
    pub kind: DatasetKind,
    pub fetched: usize,
    pub used_fallback: bool,
    pub data_source: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub cleaned: usize,
    pub dropped: usize,
    pub export_path: Option<PathBuf>,
    pub stored: usize,
    pub failure: Option<StageFailure>,
}

impl DatasetOutcome {
    pub(crate) fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            fetched: 0,
            used_fallback: false,
            data_source: None,
            snapshot_path: None,
            cleaned: 0,
            dropped: 0,
            export_path: None,
            stored: 0,
            failure: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result of one orchestrator invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// The finalized ledger row
    pub run: PipelineRun,
    pub fetch_timestamp: FetchTimestamp,
    pub datasets: Vec<DatasetOutcome>,
    pub artifacts: ReportArtifacts,
    pub stats: StoreStats,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    pub fn dataset(&self, kind: DatasetKind) -> Option<&DatasetOutcome> {
        self.datasets.iter().find(|d| d.kind == kind)
    }
}
