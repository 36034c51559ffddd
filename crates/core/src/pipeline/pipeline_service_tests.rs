//! Tests for the orchestrator's run state machine and failure handling.
//!
//! # Contract Points
//!
//! 1. Stages advance in order and the ledger row is finalized once
//! 2. A fatal failure on one dataset does not stop the other from storing
//! 3. Reporting and export problems downgrade to PARTIAL_FAILURE only
//! 4. Re-running with the same fetch timestamp is idempotent

#[cfg(test)]
mod tests {
    use crate::config::PipelineConfig;
    use crate::errors::{DatabaseError, Error, Result, StructuralError};
    use crate::pipeline::{PipelineService, RunOptions, SourceAdapter};
    use crate::records::{Dataset, DatasetKind, RecordFilter};
    use crate::runs::{PipelineRun, RunCounts, RunStatus};
    use crate::store::{PipelineStore, StoreStats};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::{json, Value};
    use std::collections::{BTreeMap, HashMap};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::{tempdir, TempDir};
    use tickerwire_market_data::FetchOutcome;

    // =========================================================================
    // Mock PipelineStore
    // =========================================================================

    #[derive(Clone, Default)]
    struct MockStore {
        market: Arc<Mutex<BTreeMap<(String, String), crate::records::MarketRecord>>>,
        news: Arc<Mutex<BTreeMap<(String, String), crate::records::NewsRecord>>>,
        runs: Arc<Mutex<Vec<PipelineRun>>>,
        progress: Arc<Mutex<Vec<RunStatus>>>,
        fail_upsert: Arc<Mutex<Option<DatasetKind>>>,
        fail_progress_at: Arc<Mutex<Option<RunStatus>>>,
        fail_query: Arc<Mutex<bool>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self::default()
        }

        fn set_fail_upsert(&self, kind: DatasetKind) {
            *self.fail_upsert.lock().unwrap() = Some(kind);
        }

        fn set_fail_progress_at(&self, status: RunStatus) {
            *self.fail_progress_at.lock().unwrap() = Some(status);
        }

        fn set_fail_query(&self) {
            *self.fail_query.lock().unwrap() = true;
        }

        fn row_count(&self, kind: DatasetKind) -> usize {
            match kind {
                DatasetKind::Market => self.market.lock().unwrap().len(),
                DatasetKind::News => self.news.lock().unwrap().len(),
            }
        }

        fn progress(&self) -> Vec<RunStatus> {
            self.progress.lock().unwrap().clone()
        }

        fn with_run<T>(
            &self,
            run_id: &str,
            f: impl FnOnce(&mut PipelineRun) -> Result<T>,
        ) -> Result<T> {
            let mut runs = self.runs.lock().unwrap();
            let run = runs
                .iter_mut()
                .find(|r| r.run_id == run_id)
                .ok_or_else(|| Error::Database(DatabaseError::NotFound(run_id.to_string())))?;
            f(run)
        }
    }

    #[async_trait]
    impl PipelineStore for MockStore {
        async fn upsert(&self, dataset: &Dataset) -> Result<usize> {
            if *self.fail_upsert.lock().unwrap() == Some(dataset.kind()) {
                return Err(Error::Database(DatabaseError::QueryFailed(
                    "disk I/O error".to_string(),
                )));
            }
            match dataset {
                Dataset::Market(rows) => {
                    let mut table = self.market.lock().unwrap();
                    for row in rows {
                        table.insert((row.id.clone(), row.fetch_timestamp.to_string()), row.clone());
                    }
                }
                Dataset::News(rows) => {
                    let mut table = self.news.lock().unwrap();
                    for row in rows {
                        table.insert(
                            (row.title.clone(), row.fetch_timestamp.to_string()),
                            row.clone(),
                        );
                    }
                }
            }
            Ok(dataset.len())
        }

        fn query(
            &self,
            kind: DatasetKind,
            filter: &RecordFilter,
            _limit: Option<i64>,
        ) -> Result<Dataset> {
            if *self.fail_query.lock().unwrap() {
                return Err(Error::Database(DatabaseError::ConnectionFailed(
                    "pool exhausted".to_string(),
                )));
            }
            let at = filter.fetch_timestamp;
            Ok(match kind {
                DatasetKind::Market => Dataset::Market(
                    self.market
                        .lock()
                        .unwrap()
                        .values()
                        .filter(|r| at.map_or(true, |t| r.fetch_timestamp == t))
                        .cloned()
                        .collect(),
                ),
                DatasetKind::News => Dataset::News(
                    self.news
                        .lock()
                        .unwrap()
                        .values()
                        .filter(|r| at.map_or(true, |t| r.fetch_timestamp == t))
                        .cloned()
                        .collect(),
                ),
            })
        }

        async fn record_run_start(&self) -> Result<PipelineRun> {
            let run = PipelineRun::new();
            self.runs.lock().unwrap().push(run.clone());
            Ok(run)
        }

        async fn record_run_progress(&self, run_id: &str, status: RunStatus) -> Result<()> {
            if *self.fail_progress_at.lock().unwrap() == Some(status) {
                return Err(Error::Database(DatabaseError::TransactionFailed(
                    "database is locked".to_string(),
                )));
            }
            self.with_run(run_id, |run| run.advance(status))?;
            self.progress.lock().unwrap().push(status);
            Ok(())
        }

        async fn record_run_end(
            &self,
            run_id: &str,
            status: RunStatus,
            counts: RunCounts,
            error_message: Option<String>,
        ) -> Result<PipelineRun> {
            self.with_run(run_id, |run| {
                run.finalize(status, counts, error_message)?;
                Ok(run.clone())
            })
        }

        fn history(&self, limit: i64) -> Result<Vec<PipelineRun>> {
            let runs = self.runs.lock().unwrap();
            Ok(runs.iter().rev().take(limit as usize).cloned().collect())
        }

        fn stats(&self) -> Result<StoreStats> {
            let mut stats = StoreStats::new();
            stats.insert("market_data".to_string(), self.row_count(DatasetKind::Market) as i64);
            stats.insert("news_data".to_string(), self.row_count(DatasetKind::News) as i64);
            stats.insert(
                "pipeline_metadata".to_string(),
                self.runs.lock().unwrap().len() as i64,
            );
            Ok(stats)
        }
    }

    // =========================================================================
    // Mock SourceAdapter
    // =========================================================================

    struct MockSource {
        payloads: HashMap<DatasetKind, std::result::Result<Value, String>>,
    }

    impl MockSource {
        fn new(market: Value, news: Value) -> Self {
            let mut payloads = HashMap::new();
            payloads.insert(DatasetKind::Market, Ok(market));
            payloads.insert(DatasetKind::News, Ok(news));
            Self { payloads }
        }

        fn failing(mut self, kind: DatasetKind, message: &str) -> Self {
            self.payloads.insert(kind, Err(message.to_string()));
            self
        }
    }

    #[async_trait]
    impl SourceAdapter for MockSource {
        async fn fetch(&self, kind: DatasetKind, fetched_at: DateTime<Utc>) -> Result<FetchOutcome> {
            match self.payloads.get(&kind) {
                Some(Ok(payload)) => Ok(FetchOutcome {
                    kind,
                    payload: payload.clone(),
                    used_fallback: false,
                    data_source: kind.live_source().to_string(),
                    fetched_at,
                    snapshot_path: None,
                }),
                Some(Err(message)) => Err(Error::Structural(StructuralError::SourceFailed {
                    kind: kind.to_string(),
                    message: message.clone(),
                })),
                None => Err(Error::Unexpected(format!("no payload for {}", kind))),
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn at_t1() -> RunOptions {
        RunOptions {
            fetch_timestamp: Some(t1()),
            ..Default::default()
        }
    }

    fn config_in(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            raw_data_path: dir.join("raw"),
            processed_data_path: dir.join("processed"),
            reports_path: dir.join("reports"),
            ..PipelineConfig::default()
        }
    }

    fn market_payload() -> Value {
        json!([
            {"id": "btc", "name": "Bitcoin", "current_price": -5},
            {"id": "eth", "name": "Ethereum", "current_price": 2000}
        ])
    }

    fn news_payload() -> Value {
        json!({"status": "ok", "articles": [
            {"source": {"id": "reuters", "name": "Reuters"}, "title": "Stocks rise", "publishedAt": "2024-05-01T10:00:00Z"},
            {"source": {"id": null, "name": "Bloomberg"}, "title": "Oil slips", "publishedAt": "2024-05-01T11:00:00Z"}
        ]})
    }

    fn service(store: &MockStore, source: MockSource, dir: &TempDir) -> PipelineService {
        PipelineService::new(
            Arc::new(store.clone()),
            Arc::new(source),
            &config_in(dir.path()),
        )
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_successful_run_walks_every_stage() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let svc = service(&store, MockSource::new(market_payload(), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Succeeded);
        assert_eq!(
            store.progress(),
            vec![
                RunStatus::Fetching,
                RunStatus::Cleaning,
                RunStatus::Storing,
                RunStatus::Reporting
            ]
        );
        assert!(outcome.run.end_time.is_some());
        assert_eq!(outcome.run.error_message, None);
        assert_eq!(outcome.artifacts.paths().len(), 4);
        for path in outcome.artifacts.paths() {
            assert!(path.exists(), "{} missing", path.display());
        }
        let market = outcome.dataset(DatasetKind::Market).unwrap();
        assert!(market.export_path.as_ref().unwrap().exists());
        assert_eq!(outcome.stats.get("news_data"), Some(&2));
    }

    #[tokio::test]
    async fn test_skipped_dataset_is_not_a_failure() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let source = MockSource::new(market_payload(), news_payload())
            .failing(DatasetKind::News, "would fail if fetched");
        let svc = service(&store, source, &dir);

        let outcome = svc
            .run(RunOptions {
                skip: vec![DatasetKind::News],
                ..at_t1()
            })
            .await
            .unwrap();

        assert_eq!(outcome.status(), RunStatus::Succeeded);
        assert_eq!(outcome.run.error_message, None);
        assert!(outcome.dataset(DatasetKind::News).is_none());
        assert_eq!(outcome.run.market_records_processed, 1);
        assert_eq!(outcome.run.news_records_processed, 0);
        assert_eq!(store.row_count(DatasetKind::News), 0);
        assert_eq!(outcome.artifacts.dataset_csvs.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_price_scenario_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let svc = service(&store, MockSource::new(market_payload(), news_payload()), &dir);

        let first = svc.run(at_t1()).await.unwrap();
        assert_eq!(store.row_count(DatasetKind::Market), 1);
        let rows = store
            .query(DatasetKind::Market, &RecordFilter::default(), None)
            .unwrap();
        assert_eq!(rows.as_market().unwrap()[0].id, "eth");
        assert_eq!(first.run.market_records_processed, 1);
        assert_eq!(first.dataset(DatasetKind::Market).unwrap().dropped, 1);

        let second = svc.run(at_t1()).await.unwrap();
        assert_eq!(second.status(), RunStatus::Succeeded);
        assert_eq!(store.row_count(DatasetKind::Market), 1);
        assert_eq!(store.row_count(DatasetKind::News), 2);
        assert_eq!(store.history(10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_quality_drops_are_counted_not_fatal() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let rows: Vec<Value> = (0..8)
            .map(|i| json!({"id": format!("c{}", i), "current_price": if i < 3 { -1 } else { 10 }}))
            .collect();
        let svc = service(&store, MockSource::new(json!(rows), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Succeeded);
        let market = outcome.dataset(DatasetKind::Market).unwrap();
        assert_eq!(market.fetched, 8);
        assert_eq!(market.cleaned, 5);
        assert_eq!(market.dropped, 3);
        assert_eq!(market.stored, 5);
        assert_eq!(outcome.run.market_records_processed, 5);
    }

    #[tokio::test]
    async fn test_news_persistence_failure_fails_run_but_keeps_market() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        store.set_fail_upsert(DatasetKind::News);
        let svc = service(&store, MockSource::new(market_payload(), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Failed);
        assert_eq!(store.row_count(DatasetKind::Market), 1);
        assert_eq!(store.row_count(DatasetKind::News), 0);
        let news = outcome.dataset(DatasetKind::News).unwrap();
        assert_eq!(news.failure.as_ref().unwrap().stage, RunStatus::Storing);
        let message = outcome.run.error_message.unwrap();
        assert!(message.starts_with("storing/news: "), "{}", message);
        assert_eq!(outcome.run.market_records_processed, 1);
        assert_eq!(outcome.run.news_records_processed, 0);
        // market still gets reported
        assert!(store.progress().contains(&RunStatus::Reporting));
    }

    #[tokio::test]
    async fn test_fetch_failure_isolated_to_one_dataset() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let source = MockSource::new(market_payload(), news_payload())
            .failing(DatasetKind::Market, "schema changed");
        let svc = service(&store, source, &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Failed);
        assert_eq!(store.row_count(DatasetKind::Market), 0);
        assert_eq!(store.row_count(DatasetKind::News), 2);
        let market = outcome.dataset(DatasetKind::Market).unwrap();
        assert_eq!(market.failure.as_ref().unwrap().stage, RunStatus::Fetching);
        assert!(outcome
            .run
            .error_message
            .unwrap()
            .starts_with("fetching/market: "));
    }

    #[tokio::test]
    async fn test_non_tabular_payload_fails_cleaning() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let svc = service(&store, MockSource::new(json!("oops"), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Failed);
        let market = outcome.dataset(DatasetKind::Market).unwrap();
        assert_eq!(market.failure.as_ref().unwrap().stage, RunStatus::Cleaning);
        assert_eq!(store.row_count(DatasetKind::News), 2);
    }

    #[tokio::test]
    async fn test_all_datasets_failing_skips_storing() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let source = MockSource::new(json!(1), json!(2));
        let svc = service(&store, source, &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Failed);
        assert_eq!(store.progress(), vec![RunStatus::Fetching, RunStatus::Cleaning]);
        assert!(outcome.artifacts.paths().is_empty());
        let message = outcome.run.error_message.unwrap();
        assert_eq!(message.matches("; ").count(), 1);
    }

    #[tokio::test]
    async fn test_report_failure_is_partial() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let mut config = config_in(dir.path());
        // A regular file where the reports directory should be.
        let blocker = dir.path().join("reports-file");
        std::fs::write(&blocker, "x").unwrap();
        config.reports_path = blocker;
        let svc = PipelineService::new(
            Arc::new(store.clone()),
            Arc::new(MockSource::new(market_payload(), news_payload())),
            &config,
        );

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::PartialFailure);
        assert_eq!(store.row_count(DatasetKind::Market), 1);
        assert!(outcome.run.error_message.unwrap().starts_with("reporting: "));
    }

    #[tokio::test]
    async fn test_read_back_failure_is_partial() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        store.set_fail_query();
        let svc = service(&store, MockSource::new(market_payload(), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::PartialFailure);
        let message = outcome.run.error_message.unwrap();
        assert!(message.contains("reporting/market: "));
        assert!(message.contains("reporting/news: "));
        assert!(message.contains("Failed to read back market data"));
        assert_eq!(store.row_count(DatasetKind::Market), 1);
    }

    #[tokio::test]
    async fn test_export_failure_is_partial() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        let mut config = config_in(dir.path());
        let blocker = dir.path().join("processed-file");
        std::fs::write(&blocker, "x").unwrap();
        config.processed_data_path = blocker;
        let svc = PipelineService::new(
            Arc::new(store.clone()),
            Arc::new(MockSource::new(market_payload(), news_payload())),
            &config,
        );

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::PartialFailure);
        assert_eq!(store.row_count(DatasetKind::News), 2);
        assert!(outcome
            .run
            .error_message
            .unwrap()
            .starts_with("cleaning/market: "));
    }

    #[tokio::test]
    async fn test_ledger_progress_failure_fails_run() {
        let dir = tempdir().unwrap();
        let store = MockStore::new();
        store.set_fail_progress_at(RunStatus::Storing);
        let svc = service(&store, MockSource::new(market_payload(), news_payload()), &dir);

        let outcome = svc.run(at_t1()).await.unwrap();

        assert_eq!(outcome.status(), RunStatus::Failed);
        assert_eq!(store.row_count(DatasetKind::Market), 0);
        assert!(outcome.run.error_message.unwrap().starts_with("cleaning: "));
    }
}
