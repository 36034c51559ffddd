use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{error, info, warn};

use super::pipeline_model::{DatasetOutcome, RunOptions, RunOutcome, StageFailure};
use super::source::SourceAdapter;
use crate::cleaner::{clean, export_cleaned};
use crate::config::PipelineConfig;
use crate::constants::ERROR_MESSAGE_SEPARATOR;
use crate::errors::{Error, ReportError, Result};
use crate::records::{Dataset, DatasetKind, FetchTimestamp, RecordFilter};
use crate::reporting::{render, summarize, ReportArtifacts, ReportOptions, ReportSection, RunMeta};
use crate::runs::{RunCounts, RunStatus};
use crate::store::PipelineStore;

use tickerwire_market_data::FetchOutcome;

/// Runs the pipeline against a store and a source adapter.
pub struct PipelineService {
    store: Arc<dyn PipelineStore>,
    source: Arc<dyn SourceAdapter>,
    processed_data_path: PathBuf,
    reports_path: PathBuf,
    report_options: ReportOptions,
}

/// Per-dataset working state.
struct DatasetState {
    outcome: DatasetOutcome,
    raw: Option<FetchOutcome>,
    cleaned: Option<Dataset>,
}

/// Mutable state of the run being executed.
struct RunContext {
    run_id: String,
    status: RunStatus,
    fetch_timestamp: FetchTimestamp,
    datasets: Vec<DatasetState>,
    /// Messages destined for the ledger's `error_message`
    issues: Vec<String>,
    /// A non-fatal stage (report, export) lost an artifact
    degraded: bool,
    /// The run itself broke (ledger update failed)
    aborted: bool,
    artifacts: ReportArtifacts,
}

impl RunContext {
    fn fail_dataset(&mut self, index: usize, stage: RunStatus, message: String) {
        let kind = self.datasets[index].outcome.kind;
        let message = format!("{}/{}: {}", stage_label(stage), kind, message);
        error!("run={} {}", self.run_id, message);
        self.issues.push(message.clone());
        let state = &mut self.datasets[index];
        state.outcome.failure = Some(StageFailure { stage, message });
        state.raw = None;
        state.cleaned = None;
    }

    fn degrade(&mut self, stage: RunStatus, kind: Option<DatasetKind>, message: String) {
        let message = match kind {
            Some(kind) => format!("{}/{}: {}", stage_label(stage), kind, message),
            None => format!("{}: {}", stage_label(stage), message),
        };
        warn!("run={} {}", self.run_id, message);
        self.issues.push(message);
        self.degraded = true;
    }

    /// Routes a stage error by its class: fatal errors fail the dataset, reporting
    /// errors only degrade the run.
    fn handle_error(&mut self, index: usize, stage: RunStatus, err: Error) {
        if err.is_fatal() {
            self.fail_dataset(index, stage, err.to_string());
        } else {
            let kind = self.datasets[index].outcome.kind;
            self.degrade(stage, Some(kind), err.to_string());
        }
    }

    fn has_live_dataset(&self) -> bool {
        self.datasets.iter().any(|d| !d.outcome.is_failed())
    }

    fn final_status(&self) -> RunStatus {
        let mut status = RunStatus::Succeeded;
        if self.degraded {
            status = status.worst(RunStatus::PartialFailure);
        }
        if self.aborted {
            status = status.worst(RunStatus::Failed);
        }
        self.datasets
            .iter()
            .filter(|d| d.outcome.is_failed())
            .fold(status, |acc, _| acc.worst(RunStatus::Failed))
    }

    fn counts(&self) -> RunCounts {
        let stored = |kind: DatasetKind| {
            self.datasets
                .iter()
                .find(|d| d.outcome.kind == kind)
                .map(|d| d.outcome.stored as i64)
                .unwrap_or(0)
        };
        RunCounts {
            market: stored(DatasetKind::Market),
            news: stored(DatasetKind::News),
        }
    }

    fn error_message(&self) -> Option<String> {
        if self.issues.is_empty() {
            None
        } else {
            Some(self.issues.join(ERROR_MESSAGE_SEPARATOR))
        }
    }
}

fn stage_label(status: RunStatus) -> String {
    status.as_str().to_ascii_lowercase()
}

impl PipelineService {
    pub fn new(
        store: Arc<dyn PipelineStore>,
        source: Arc<dyn SourceAdapter>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            source,
            processed_data_path: config.processed_data_path.clone(),
            reports_path: config.reports_path.clone(),
            report_options: config.report_options(),
        }
    }

    /// Executes one run and finalizes its ledger row.
    ///
    /// Stage failures are reported through the run's status and error message.
    /// `Err` is returned only when the ledger itself cannot be written, in which
    /// case the run row may be left non-terminal.
    pub async fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        let started = Instant::now();
        let fetch_timestamp = FetchTimestamp::new(options.fetch_timestamp.unwrap_or_else(Utc::now));

        let run = self.store.record_run_start().await?;
        info!(
            "run={} Pipeline run started, fetch timestamp {}",
            run.run_id, fetch_timestamp
        );
        for kind in &options.skip {
            info!("run={} Skipping {} dataset", run.run_id, kind);
        }

        let mut ctx = RunContext {
            run_id: run.run_id.clone(),
            status: run.status,
            fetch_timestamp,
            datasets: DatasetKind::ALL
                .iter()
                .filter(|kind| options.includes(**kind))
                .map(|kind| DatasetState {
                    outcome: DatasetOutcome::new(*kind),
                    raw: None,
                    cleaned: None,
                })
                .collect(),
            issues: Vec::new(),
            degraded: false,
            aborted: false,
            artifacts: ReportArtifacts::default(),
        };

        if let Err(e) = self.execute(&mut ctx).await {
            let message = format!("{}: {}", stage_label(ctx.status), e);
            error!("run={} Run aborted: {}", ctx.run_id, message);
            ctx.issues.push(message);
            ctx.aborted = true;
        }

        let status = ctx.final_status();
        let run = self
            .store
            .record_run_end(&ctx.run_id, status, ctx.counts(), ctx.error_message())
            .await?;

        let stats = self.store.stats().unwrap_or_else(|e| {
            warn!("run={} Could not read store stats: {}", run.run_id, e);
            Default::default()
        });

        let duration = started.elapsed();
        info!(
            "run={} Pipeline run finished with {} in {:.2}s (market={}, news={})",
            run.run_id,
            run.status,
            duration.as_secs_f64(),
            run.market_records_processed,
            run.news_records_processed
        );

        Ok(RunOutcome {
            run,
            fetch_timestamp,
            datasets: ctx.datasets.into_iter().map(|d| d.outcome).collect(),
            artifacts: ctx.artifacts,
            stats,
            duration,
        })
    }

    async fn execute(&self, ctx: &mut RunContext) -> Result<()> {
        self.advance(ctx, RunStatus::Fetching).await?;
        self.fetch_stage(ctx).await;

        self.advance(ctx, RunStatus::Cleaning).await?;
        self.clean_stage(ctx);

        if !ctx.has_live_dataset() {
            warn!("run={} Every dataset failed before storing", ctx.run_id);
            return Ok(());
        }

        self.advance(ctx, RunStatus::Storing).await?;
        self.store_stage(ctx).await;

        if !ctx.has_live_dataset() {
            warn!("run={} Nothing was stored; skipping report", ctx.run_id);
            return Ok(());
        }

        self.advance(ctx, RunStatus::Reporting).await?;
        self.report_stage(ctx);
        Ok(())
    }

    async fn advance(&self, ctx: &mut RunContext, status: RunStatus) -> Result<()> {
        ctx.status.transition(status)?;
        self.store.record_run_progress(&ctx.run_id, status).await?;
        ctx.status = status;
        info!("run={} Stage {}", ctx.run_id, status);
        Ok(())
    }

    async fn fetch_stage(&self, ctx: &mut RunContext) {
        for index in 0..ctx.datasets.len() {
            let kind = ctx.datasets[index].outcome.kind;
            match self
                .source
                .fetch(kind, ctx.fetch_timestamp.as_datetime())
                .await
            {
                Ok(raw) => {
                    info!(
                        "run={} Fetched {} {} rows{}",
                        ctx.run_id,
                        raw.row_count(),
                        kind,
                        if raw.used_fallback { " (fallback)" } else { "" }
                    );
                    let state = &mut ctx.datasets[index];
                    state.outcome.fetched = raw.row_count();
                    state.outcome.used_fallback = raw.used_fallback;
                    state.outcome.data_source = Some(raw.data_source.clone());
                    state.outcome.snapshot_path = raw.snapshot_path.clone();
                    state.raw = Some(raw);
                }
                Err(e) => ctx.handle_error(index, RunStatus::Fetching, e),
            }
        }
    }

    fn clean_stage(&self, ctx: &mut RunContext) {
        for index in 0..ctx.datasets.len() {
            let Some(raw) = ctx.datasets[index].raw.take() else {
                continue;
            };
            let kind = raw.kind;

            let (dataset, report) =
                match clean(&raw.payload, kind, ctx.fetch_timestamp, &raw.data_source) {
                    Ok(cleaned) => cleaned,
                    Err(e) => {
                        ctx.handle_error(index, RunStatus::Cleaning, e);
                        continue;
                    }
                };
            info!(
                "run={} Cleaned {}: {} kept, {} dropped ({} duplicates, {} invalid)",
                ctx.run_id,
                kind,
                dataset.len(),
                report.dropped(),
                report.duplicates_removed,
                report.invalid_dropped
            );

            match export_cleaned(&self.processed_data_path, &dataset, ctx.fetch_timestamp) {
                Ok(path) => ctx.datasets[index].outcome.export_path = Some(path),
                Err(e) => ctx.handle_error(index, RunStatus::Cleaning, e.into()),
            }

            let state = &mut ctx.datasets[index];
            state.outcome.cleaned = dataset.len();
            state.outcome.dropped = report.dropped();
            state.cleaned = Some(dataset);
        }
    }

    async fn store_stage(&self, ctx: &mut RunContext) {
        for index in 0..ctx.datasets.len() {
            let Some(dataset) = ctx.datasets[index].cleaned.take() else {
                continue;
            };
            match self.store.upsert(&dataset).await {
                Ok(stored) => {
                    info!("run={} Stored {} {} records", ctx.run_id, stored, dataset.kind());
                    ctx.datasets[index].outcome.stored = stored;
                }
                Err(e) => ctx.handle_error(index, RunStatus::Storing, e),
            }
        }
    }

    fn report_stage(&self, ctx: &mut RunContext) {
        let filter = RecordFilter::at(ctx.fetch_timestamp);
        let stored_kinds: Vec<DatasetKind> = ctx
            .datasets
            .iter()
            .filter(|d| !d.outcome.is_failed())
            .map(|d| d.outcome.kind)
            .collect();

        let mut sections = Vec::new();
        for kind in stored_kinds {
            match self.store.query(kind, &filter, None) {
                Ok(dataset) => sections.push(ReportSection {
                    summary: summarize(&dataset, &self.report_options),
                    dataset,
                }),
                Err(e) => {
                    let err = Error::from(ReportError::ReadBack {
                        kind: kind.to_string(),
                        message: e.to_string(),
                    });
                    ctx.degrade(RunStatus::Reporting, Some(kind), err.to_string());
                }
            }
        }

        let meta = RunMeta {
            run_id: ctx.run_id.clone(),
            fetch_timestamp: ctx.fetch_timestamp,
            generated_at: Utc::now(),
        };
        match render(&self.reports_path, &sections, &meta) {
            Ok(artifacts) => ctx.artifacts = artifacts,
            Err(e) => ctx.degrade(RunStatus::Reporting, None, Error::from(e).to_string()),
        }
    }
}
