use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The datasets a pipeline run pulls, in processing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Market,
    News,
}

impl DatasetKind {
    /// Every kind, in the order the orchestrator processes them.
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Market, DatasetKind::News];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Market => "market",
            DatasetKind::News => "news",
        }
    }

    /// Source tag stamped on rows that came from the live API.
    pub fn live_source(&self) -> &'static str {
        match self {
            DatasetKind::Market => "market_api",
            DatasetKind::News => "news_api",
        }
    }

    /// Source tag stamped on rows generated by the fallback dataset.
    pub fn fallback_source(&self) -> &'static str {
        match self {
            DatasetKind::Market => "market_fallback",
            DatasetKind::News => "news_fallback",
        }
    }

    /// Storage table holding this dataset.
    pub fn table_name(&self) -> &'static str {
        match self {
            DatasetKind::Market => "market_data",
            DatasetKind::News => "news_data",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dataset kind '{0}' (expected 'market' or 'news')")]
pub struct ParseDatasetKindError(pub String);

impl FromStr for DatasetKind {
    type Err = ParseDatasetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(DatasetKind::Market),
            "news" => Ok(DatasetKind::News),
            other => Err(ParseDatasetKindError(other.to_string())),
        }
    }
}
