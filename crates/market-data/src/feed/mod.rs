//! HTTP feed client with graceful degradation.
//!
//! [`FeedClient::fetch`] always returns a usable payload: the live response when
//! the endpoint answers with a well-formed document, otherwise the synthetic
//! fallback dataset. Either way the payload is written as a raw snapshot first.

pub mod fallback;
pub mod payload;
pub mod snapshot;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::errors::MarketDataError;
use crate::models::{DatasetKind, FetchOutcome};

pub use fallback::{FallbackSettings, MAX_FALLBACK_ROWS};
pub use snapshot::FILE_TIMESTAMP_FORMAT;

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("tickerwire/", env!("CARGO_PKG_VERSION"));

/// Everything the feed client needs to know about its sources.
#[derive(Clone, Debug)]
pub struct FeedSettings {
    pub market_url: String,
    pub news_url: String,
    /// Sent as a bearer token to the news endpoint when present.
    pub news_api_key: Option<String>,
    pub timeout: Duration,
    /// Directory that receives raw snapshot files.
    pub raw_data_path: PathBuf,
    pub fallback: FallbackSettings,
}

impl FeedSettings {
    pub fn endpoint(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Market => &self.market_url,
            DatasetKind::News => &self.news_url,
        }
    }
}

/// Fetches market and news documents, falling back to synthetic data.
pub struct FeedClient {
    client: Client,
    settings: FeedSettings,
}

impl FeedClient {
    pub fn new(settings: FeedSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, settings }
    }

    /// Fetches `kind` from its configured endpoint.
    ///
    /// Never fails: availability problems are logged and replaced by the fallback
    /// dataset. `fetched_at` names the snapshot file and seeds fallback timestamps.
    pub async fn fetch(&self, kind: DatasetKind, fetched_at: DateTime<Utc>) -> FetchOutcome {
        let endpoint = self.settings.endpoint(kind);
        info!("Fetching {} data from {}", kind, endpoint);

        let (payload, used_fallback) = match self.fetch_live(kind, endpoint).await {
            Ok((payload, rows)) => {
                info!("Fetched {} {} records from live feed", rows, kind);
                (payload, false)
            }
            Err(e) => {
                warn!("{} feed unavailable, using fallback dataset: {}", kind, e);
                let payload = fallback::generate(kind, &self.settings.fallback, fetched_at);
                (payload, true)
            }
        };

        let snapshot_path = match snapshot::write_snapshot(
            &self.settings.raw_data_path,
            kind,
            fetched_at,
            &payload,
        ) {
            Ok(path) => {
                info!("Raw {} snapshot saved to {}", kind, path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write raw {} snapshot: {}", kind, e);
                None
            }
        };

        let data_source = if used_fallback {
            kind.fallback_source()
        } else {
            kind.live_source()
        };

        FetchOutcome {
            kind,
            payload,
            used_fallback,
            data_source: data_source.to_string(),
            fetched_at,
            snapshot_path,
        }
    }

    async fn fetch_live(
        &self,
        kind: DatasetKind,
        endpoint: &str,
    ) -> Result<(Value, usize), MarketDataError> {
        let mut request = self
            .client
            .get(endpoint)
            .header(header::ACCEPT, "application/json");

        if kind == DatasetKind::News {
            if let Some(key) = self.settings.news_api_key.as_deref() {
                request = request.bearer_auth(key);
            } else {
                debug!("No news API key configured; requesting without credentials");
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(kind, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::HttpStatus {
                kind,
                status: status.as_u16(),
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| MarketDataError::from_transport(kind, e))?;

        let rows = payload::check_shape(kind, &payload)?;
        Ok((payload, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn unreachable_settings(raw: PathBuf) -> FeedSettings {
        FeedSettings {
            // Port 9 (discard) is closed on test machines; the connect fails fast.
            market_url: "http://127.0.0.1:9/markets".to_string(),
            news_url: "http://127.0.0.1:9/news".to_string(),
            news_api_key: None,
            timeout: Duration::from_secs(2),
            raw_data_path: raw,
            fallback: FallbackSettings::default(),
        }
    }

    #[tokio::test]
    async fn test_unreachable_market_feed_uses_fallback() {
        let dir = tempdir().unwrap();
        let client = FeedClient::new(unreachable_settings(dir.path().to_path_buf()));
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let outcome = client.fetch(DatasetKind::Market, at).await;

        assert!(outcome.used_fallback);
        assert_eq!(outcome.data_source, "market_fallback");
        assert_eq!(outcome.row_count(), 10);
        let snapshot = outcome.snapshot_path.expect("snapshot written");
        assert!(snapshot.ends_with("market_data_20240102_030405.json"));
    }

    #[tokio::test]
    async fn test_unreachable_news_feed_uses_fallback() {
        let dir = tempdir().unwrap();
        let client = FeedClient::new(unreachable_settings(dir.path().to_path_buf()));
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let outcome = client.fetch(DatasetKind::News, at).await;

        assert!(outcome.used_fallback);
        assert_eq!(outcome.data_source, "news_fallback");
        assert_eq!(outcome.row_count(), 5);
    }

    #[tokio::test]
    async fn test_snapshot_failure_does_not_fail_fetch() {
        let dir = tempdir().unwrap();
        // A regular file where the snapshot directory should be.
        let blocker = dir.path().join("raw");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let client = FeedClient::new(unreachable_settings(blocker));

        let outcome = client.fetch(DatasetKind::Market, Utc::now()).await;

        assert!(outcome.used_fallback);
        assert!(outcome.snapshot_path.is_none());
        assert!(outcome.row_count() > 0);
    }
}
