//! Domain models for stored market and news records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::FetchTimestamp;
use tickerwire_market_data::DatasetKind;

/// One asset's market snapshot at a fetch instant.
///
/// Natural key: `(id, fetch_timestamp)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MarketRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub market_cap: Decimal,
    pub total_volume: Decimal,
    pub price_change_24h: Decimal,
    pub price_change_percentage_24h: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    pub fetch_timestamp: FetchTimestamp,
    pub data_source: String,
}

impl MarketRecord {
    pub fn natural_key(&self) -> (&str, FetchTimestamp) {
        (&self.id, self.fetch_timestamp)
    }
}

/// One news article as seen at a fetch instant.
///
/// Natural key: `(title, fetch_timestamp)`. Distinct articles sharing a title in the
/// same run collapse to one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewsRecord {
    pub title: String,
    pub description: String,
    pub author: String,
    pub content: String,
    pub source_id: String,
    pub source_name: String,
    /// Canonical ISO-8601 publish time, empty when the source gave none or garbage.
    pub publishedat: String,
    pub fetch_timestamp: FetchTimestamp,
    pub data_source: String,
}

impl NewsRecord {
    pub fn natural_key(&self) -> (&str, FetchTimestamp) {
        (&self.title, self.fetch_timestamp)
    }
}

/// A batch of records of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum Dataset {
    Market(Vec<MarketRecord>),
    News(Vec<NewsRecord>),
}

impl Dataset {
    pub fn empty(kind: DatasetKind) -> Self {
        match kind {
            DatasetKind::Market => Dataset::Market(Vec::new()),
            DatasetKind::News => Dataset::News(Vec::new()),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Market(_) => DatasetKind::Market,
            Dataset::News(_) => DatasetKind::News,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Market(rows) => rows.len(),
            Dataset::News(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_market(&self) -> Option<&[MarketRecord]> {
        match self {
            Dataset::Market(rows) => Some(rows),
            Dataset::News(_) => None,
        }
    }

    pub fn as_news(&self) -> Option<&[NewsRecord]> {
        match self {
            Dataset::News(rows) => Some(rows),
            Dataset::Market(_) => None,
        }
    }
}

/// Filter applied by `PipelineStore::query`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub fetch_timestamp: Option<FetchTimestamp>,
    /// Market `id` or news `title`.
    pub key: Option<String>,
    pub data_source: Option<String>,
}

impl RecordFilter {
    pub fn at(fetch_timestamp: FetchTimestamp) -> Self {
        Self {
            fetch_timestamp: Some(fetch_timestamp),
            ..Default::default()
        }
    }
}

/// Column order used when a market batch is written as a table.
pub const MARKET_COLUMNS: [&str; 12] = [
    "id",
    "symbol",
    "name",
    "current_price",
    "market_cap",
    "total_volume",
    "price_change_24h",
    "price_change_percentage_24h",
    "high_24h",
    "low_24h",
    "fetch_timestamp",
    "data_source",
];

/// Column order used when a news batch is written as a table.
pub const NEWS_COLUMNS: [&str; 9] = [
    "title",
    "description",
    "author",
    "content",
    "source_id",
    "source_name",
    "publishedat",
    "fetch_timestamp",
    "data_source",
];

impl MarketRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.symbol.clone(),
            self.name.clone(),
            self.current_price.to_string(),
            self.market_cap.to_string(),
            self.total_volume.to_string(),
            self.price_change_24h.to_string(),
            self.price_change_percentage_24h.to_string(),
            self.high_24h.to_string(),
            self.low_24h.to_string(),
            self.fetch_timestamp.to_string(),
            self.data_source.clone(),
        ]
    }
}

impl NewsRecord {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.description.clone(),
            self.author.clone(),
            self.content.clone(),
            self.source_id.clone(),
            self.source_name.clone(),
            self.publishedat.clone(),
            self.fetch_timestamp.to_string(),
            self.data_source.clone(),
        ]
    }
}

impl Dataset {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Market(_) => &MARKET_COLUMNS,
            Dataset::News(_) => &NEWS_COLUMNS,
        }
    }

    /// Every record as text cells in [`Dataset::columns`] order.
    ///
    /// Decimals keep their exact text form.
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Dataset::Market(rows) => rows.iter().map(MarketRecord::to_row).collect(),
            Dataset::News(rows) => rows.iter().map(NewsRecord::to_row).collect(),
        }
    }
}
