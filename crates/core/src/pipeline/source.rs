use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tickerwire_market_data::{FeedClient, FetchOutcome};

use crate::errors::Result;
use crate::records::DatasetKind;

/// Fetches one raw dataset.
///
/// Availability problems are absorbed below this trait (the feed client substitutes
/// its fallback dataset); an `Err` here is fatal for that dataset.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, kind: DatasetKind, fetched_at: DateTime<Utc>) -> Result<FetchOutcome>;
}

#[async_trait]
impl SourceAdapter for FeedClient {
    async fn fetch(&self, kind: DatasetKind, fetched_at: DateTime<Utc>) -> Result<FetchOutcome> {
        Ok(FeedClient::fetch(self, kind, fetched_at).await)
    }
}
