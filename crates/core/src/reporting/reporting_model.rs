//! Report models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TOP_N;
use crate::errors::Error;
use crate::records::{Dataset, DatasetKind, FetchTimestamp, MarketRecord};

/// Column used to rank assets in the "top N" section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketSortKey {
    #[default]
    CurrentPrice,
    MarketCap,
    TotalVolume,
    PriceChangePercentage24h,
}

impl MarketSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSortKey::CurrentPrice => "current_price",
            MarketSortKey::MarketCap => "market_cap",
            MarketSortKey::TotalVolume => "total_volume",
            MarketSortKey::PriceChangePercentage24h => "price_change_percentage_24h",
        }
    }

    pub fn value(&self, record: &MarketRecord) -> Decimal {
        match self {
            MarketSortKey::CurrentPrice => record.current_price,
            MarketSortKey::MarketCap => record.market_cap,
            MarketSortKey::TotalVolume => record.total_volume,
            MarketSortKey::PriceChangePercentage24h => record.price_change_percentage_24h,
        }
    }
}

impl fmt::Display for MarketSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketSortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "current_price" => Ok(MarketSortKey::CurrentPrice),
            "market_cap" => Ok(MarketSortKey::MarketCap),
            "total_volume" => Ok(MarketSortKey::TotalVolume),
            "price_change_percentage_24h" => Ok(MarketSortKey::PriceChangePercentage24h),
            other => Err(Error::InvalidConfigValue(format!(
                "report_sort_key: unknown sort key '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub market_sort_key: MarketSortKey,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            market_sort_key: MarketSortKey::default(),
        }
    }
}

/// Descriptive statistics for one numeric column.
///
/// Every statistic is `None` for an empty column; `std` is the sample standard
/// deviation and also `None` with a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub mean: Option<Decimal>,
    pub median: Option<Decimal>,
    pub std: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAsset {
    pub id: String,
    pub name: String,
    pub current_price: Decimal,
    pub market_cap: Decimal,
    /// Value of the sort key the ranking used
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub total_records: usize,
    pub columns: Vec<ColumnStats>,
    /// `None` when the sum overflows
    pub total_market_cap: Option<Decimal>,
    pub average_change_24h: Option<Decimal>,
    pub gainers: usize,
    pub losers: usize,
    pub sort_key: MarketSortKey,
    pub top: Vec<TopAsset>,
}

impl MarketSummary {
    pub fn column(&self, name: &str) -> Option<&ColumnStats> {
        self.columns.iter().find(|c| c.column == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSummary {
    pub total_articles: usize,
    pub unique_sources: usize,
    pub source_distribution: BTreeMap<String, usize>,
    pub unique_authors: usize,
    pub articles_with_author: usize,
    pub recent_headlines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Summary {
    Market(MarketSummary),
    News(NewsSummary),
}

impl Summary {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Summary::Market(_) => DatasetKind::Market,
            Summary::News(_) => DatasetKind::News,
        }
    }

    pub fn as_market(&self) -> Option<&MarketSummary> {
        match self {
            Summary::Market(summary) => Some(summary),
            Summary::News(_) => None,
        }
    }

    pub fn as_news(&self) -> Option<&NewsSummary> {
        match self {
            Summary::News(summary) => Some(summary),
            Summary::Market(_) => None,
        }
    }
}

/// One dataset as read back from the store, with its summary.
#[derive(Debug, Clone)]
pub struct ReportSection {
    pub dataset: Dataset,
    pub summary: Summary,
}

/// Run metadata printed in the report header.
#[derive(Debug, Clone)]
pub struct RunMeta {
    pub run_id: String,
    pub fetch_timestamp: FetchTimestamp,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportArtifacts {
    pub report_path: Option<PathBuf>,
    pub dataset_csvs: Vec<PathBuf>,
    pub summary_csv: Option<PathBuf>,
}

impl ReportArtifacts {
    pub fn paths(&self) -> Vec<&PathBuf> {
        self.report_path
            .iter()
            .chain(self.dataset_csvs.iter())
            .chain(self.summary_csv.iter())
            .collect()
    }
}
