use std::fmt::Write as _;
use std::process::ExitCode;
use std::sync::Arc;

use tickerwire_core::store::PipelineStore;
use tickerwire_core::{
    DatasetKind, PipelineConfig, PipelineRun, PipelineService, RecordFilter, RunOptions,
    RunOutcome,
};
use tickerwire_market_data::FeedClient;
use tickerwire_storage_sqlite::SqlitePipelineStore;

const RULE_WIDTH: usize = 80;

pub async fn run(
    config: &PipelineConfig,
    store: Arc<SqlitePipelineStore>,
    skip_news: bool,
) -> anyhow::Result<ExitCode> {
    let source = Arc::new(FeedClient::new(config.feed_settings()));
    let service = PipelineService::new(store, source, config);

    let mut options = RunOptions::default();
    if skip_news {
        options.skip.push(DatasetKind::News);
    }
    let outcome = service.run(options).await?;
    print!("{}", execution_summary(&outcome));

    Ok(if outcome.status().is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub fn history(store: &dyn PipelineStore, limit: u32) -> anyhow::Result<ExitCode> {
    let runs = store.history(i64::from(limit))?;
    if runs.is_empty() {
        println!("No pipeline runs recorded.");
    }
    for run in &runs {
        println!("{}", history_line(run));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn latest(store: &dyn PipelineStore, kind: DatasetKind, limit: u32) -> anyhow::Result<ExitCode> {
    let dataset = store.query(kind, &RecordFilter::default(), Some(i64::from(limit)))?;
    println!("{}", dataset.columns().join("\t"));
    for row in dataset.rows() {
        println!("{}", row.join("\t"));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn stats(store: &dyn PipelineStore, config: &PipelineConfig) -> anyhow::Result<ExitCode> {
    println!("database: {}", config.database_path.display());
    for (table, rows) in store.stats()? {
        println!("{:<20} {}", table, rows);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn history_line(run: &PipelineRun) -> String {
    let ended = run
        .end_time
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "{}  {}  {:<16} ended {}  market={} news={}",
        run.run_id,
        run.start_time.format("%Y-%m-%d %H:%M:%S"),
        run.status,
        ended,
        run.market_records_processed,
        run.news_records_processed,
    );
    if let Some(message) = &run.error_message {
        let _ = write!(line, "  error: {}", message);
    }
    line
}

pub fn execution_summary(outcome: &RunOutcome) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "PIPELINE EXECUTION SUMMARY");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Run: {}", outcome.run.run_id);
    let _ = writeln!(out, "Status: {}", outcome.status());
    let _ = writeln!(
        out,
        "Duration: {:.2} seconds",
        outcome.duration.as_secs_f64()
    );
    let _ = writeln!(out, "Fetch timestamp: {}", outcome.fetch_timestamp);
    let _ = writeln!(
        out,
        "Market records processed: {}",
        outcome.run.market_records_processed
    );
    let _ = writeln!(
        out,
        "News records processed: {}",
        outcome.run.news_records_processed
    );

    for dataset in &outcome.datasets {
        let source = dataset.data_source.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "  {:<6} fetched={} cleaned={} dropped={} stored={} source={}",
            dataset.kind, dataset.fetched, dataset.cleaned, dataset.dropped, dataset.stored, source
        );
        if let Some(failure) = &dataset.failure {
            let _ = writeln!(out, "         failed in {}: {}", failure.stage, failure.message);
        }
    }

    if let Some(report) = &outcome.artifacts.report_path {
        let _ = writeln!(out, "\nReport saved to: {}", report.display());
    }
    let _ = writeln!(out, "CSV exports: {}", outcome.artifacts.dataset_csvs.len());
    if let Some(error) = &outcome.run.error_message {
        let _ = writeln!(out, "Error: {}", error);
    }
    let _ = writeln!(out, "{}", rule);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tickerwire_core::pipeline::{DatasetOutcome, StageFailure};
    use tickerwire_core::reporting::ReportArtifacts;
    use tickerwire_core::{FetchTimestamp, RunCounts, RunStatus};

    fn dataset(kind: DatasetKind) -> DatasetOutcome {
        DatasetOutcome {
            kind,
            fetched: 2,
            used_fallback: false,
            data_source: Some(kind.live_source().to_string()),
            snapshot_path: None,
            cleaned: 1,
            dropped: 1,
            export_path: None,
            stored: 1,
            failure: None,
        }
    }

    fn outcome(status: RunStatus, error: Option<&str>) -> RunOutcome {
        let mut run = PipelineRun::new();
        run.advance(RunStatus::Reporting).unwrap();
        run.finalize(
            status,
            RunCounts { market: 1, news: 0 },
            error.map(str::to_string),
        )
        .unwrap();

        let mut news = dataset(DatasetKind::News);
        if status == RunStatus::Failed {
            news.stored = 0;
            news.failure = Some(StageFailure {
                stage: RunStatus::Storing,
                message: "disk I/O error".to_string(),
            });
        }

        RunOutcome {
            run,
            fetch_timestamp: FetchTimestamp::now(),
            datasets: vec![dataset(DatasetKind::Market), news],
            artifacts: ReportArtifacts {
                report_path: Some(PathBuf::from("reports/daily_report_20240501_120000.txt")),
                dataset_csvs: vec![PathBuf::from("reports/market_data_20240501_120000.csv")],
                summary_csv: None,
            },
            stats: Default::default(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_summary_reports_counts_and_report_path() {
        let text = execution_summary(&outcome(RunStatus::Succeeded, None));
        assert!(text.contains("Status: SUCCEEDED"));
        assert!(text.contains("Duration: 1.50 seconds"));
        assert!(text.contains("Market records processed: 1"));
        assert!(text.contains("daily_report_20240501_120000.txt"));
        assert!(text.contains("CSV exports: 1"));
        assert!(!text.contains("Error:"));
    }

    #[test]
    fn test_summary_shows_failure_stage() {
        let text = execution_summary(&outcome(
            RunStatus::Failed,
            Some("storing/news: disk I/O error"),
        ));
        assert!(text.contains("Status: FAILED"));
        assert!(text.contains("failed in STORING: disk I/O error"));
        assert!(text.contains("Error: storing/news: disk I/O error"));
    }

    #[test]
    fn test_history_line_marks_open_runs() {
        let run = PipelineRun::new();
        let line = history_line(&run);
        assert!(line.contains("INITIALIZED"));
        assert!(line.contains("ended -"));
    }
}
