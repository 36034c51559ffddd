//! Database models for market and news records.

use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;
use tickerwire_core::records::{FetchTimestamp, MarketRecord, NewsRecord};

/// Database model for market snapshots. Decimals are stored as TEXT.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::market_data)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketDataDB {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: String,
    pub market_cap: String,
    pub total_volume: String,
    pub price_change_24h: String,
    pub price_change_percentage_24h: String,
    pub high_24h: String,
    pub low_24h: String,
    pub fetch_timestamp: String,
    pub data_source: String,
}

/// Database model for news articles.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::news_data)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewsDataDB {
    pub title: String,
    pub description: String,
    pub author: String,
    pub content: String,
    pub source_id: String,
    pub source_name: String,
    pub publishedat: String,
    pub fetch_timestamp: String,
    pub data_source: String,
}

impl From<&MarketRecord> for MarketDataDB {
    fn from(record: &MarketRecord) -> Self {
        Self {
            id: record.id.clone(),
            symbol: record.symbol.clone(),
            name: record.name.clone(),
            current_price: record.current_price.to_string(),
            market_cap: record.market_cap.to_string(),
            total_volume: record.total_volume.to_string(),
            price_change_24h: record.price_change_24h.to_string(),
            price_change_percentage_24h: record.price_change_percentage_24h.to_string(),
            high_24h: record.high_24h.to_string(),
            low_24h: record.low_24h.to_string(),
            fetch_timestamp: record.fetch_timestamp.to_string(),
            data_source: record.data_source.clone(),
        }
    }
}

impl TryFrom<MarketDataDB> for MarketRecord {
    type Error = StorageError;

    fn try_from(db: MarketDataDB) -> Result<Self, Self::Error> {
        Ok(Self {
            current_price: decimal("current_price", &db.current_price)?,
            market_cap: decimal("market_cap", &db.market_cap)?,
            total_volume: decimal("total_volume", &db.total_volume)?,
            price_change_24h: decimal("price_change_24h", &db.price_change_24h)?,
            price_change_percentage_24h: decimal(
                "price_change_percentage_24h",
                &db.price_change_percentage_24h,
            )?,
            high_24h: decimal("high_24h", &db.high_24h)?,
            low_24h: decimal("low_24h", &db.low_24h)?,
            fetch_timestamp: timestamp(&db.fetch_timestamp)?,
            id: db.id,
            symbol: db.symbol,
            name: db.name,
            data_source: db.data_source,
        })
    }
}

impl From<&NewsRecord> for NewsDataDB {
    fn from(record: &NewsRecord) -> Self {
        Self {
            title: record.title.clone(),
            description: record.description.clone(),
            author: record.author.clone(),
            content: record.content.clone(),
            source_id: record.source_id.clone(),
            source_name: record.source_name.clone(),
            publishedat: record.publishedat.clone(),
            fetch_timestamp: record.fetch_timestamp.to_string(),
            data_source: record.data_source.clone(),
        }
    }
}

impl TryFrom<NewsDataDB> for NewsRecord {
    type Error = StorageError;

    fn try_from(db: NewsDataDB) -> Result<Self, Self::Error> {
        Ok(Self {
            fetch_timestamp: timestamp(&db.fetch_timestamp)?,
            title: db.title,
            description: db.description,
            author: db.author,
            content: db.content,
            source_id: db.source_id,
            source_name: db.source_name,
            publishedat: db.publishedat,
            data_source: db.data_source,
        })
    }
}

fn decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::Decode(format!("{} '{}': {}", column, value, e)))
}

fn timestamp(value: &str) -> Result<FetchTimestamp, StorageError> {
    FetchTimestamp::from_str(value)
        .map_err(|e| StorageError::Decode(format!("fetch_timestamp '{}': {}", value, e)))
}
