use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::{MarketDataDB, NewsDataDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::market_data::dsl as market_dsl;
use crate::schema::news_data::dsl as news_dsl;
use crate::utils::chunk_rows_for_sqlite;
use tickerwire_core::records::{
    Dataset, DatasetKind, MarketRecord, NewsRecord, RecordFilter, MARKET_COLUMNS, NEWS_COLUMNS,
};
use tickerwire_core::Result;

/// Keyed market and news tables.
pub struct RecordRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl RecordRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Insert-or-replace on the natural key. The whole batch is one transaction.
    pub async fn upsert(&self, dataset: &Dataset) -> Result<usize> {
        if dataset.is_empty() {
            return Ok(0);
        }
        let written = dataset.len();

        match dataset {
            Dataset::Market(records) => {
                let rows: Vec<MarketDataDB> = records.iter().map(MarketDataDB::from).collect();
                self.writer
                    .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                        for chunk in chunk_rows_for_sqlite(&rows, MARKET_COLUMNS.len()) {
                            diesel::replace_into(market_dsl::market_data)
                                .values(chunk)
                                .execute(conn)
                                .into_core()?;
                        }
                        Ok(())
                    })
                    .await?;
            }
            Dataset::News(records) => {
                let rows: Vec<NewsDataDB> = records.iter().map(NewsDataDB::from).collect();
                self.writer
                    .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                        for chunk in chunk_rows_for_sqlite(&rows, NEWS_COLUMNS.len()) {
                            diesel::replace_into(news_dsl::news_data)
                                .values(chunk)
                                .execute(conn)
                                .into_core()?;
                        }
                        Ok(())
                    })
                    .await?;
            }
        }

        debug!("Upserted {} {} rows", written, dataset.kind());
        Ok(written)
    }

    /// Newest fetch first, then by key.
    pub fn query(
        &self,
        kind: DatasetKind,
        filter: &RecordFilter,
        limit: Option<i64>,
    ) -> Result<Dataset> {
        let mut conn = get_connection(&self.pool)?;

        match kind {
            DatasetKind::Market => {
                let mut query = market_dsl::market_data
                    .select(MarketDataDB::as_select())
                    .into_boxed();
                if let Some(at) = filter.fetch_timestamp {
                    query = query.filter(market_dsl::fetch_timestamp.eq(at.to_string()));
                }
                if let Some(key) = filter.key.as_ref() {
                    query = query.filter(market_dsl::id.eq(key.clone()));
                }
                if let Some(source) = filter.data_source.as_ref() {
                    query = query.filter(market_dsl::data_source.eq(source.clone()));
                }
                query = query.order((market_dsl::fetch_timestamp.desc(), market_dsl::id.asc()));
                if let Some(limit) = limit {
                    query = query.limit(limit);
                }

                let rows = query
                    .load::<MarketDataDB>(&mut conn)
                    .into_core()?;
                let records = rows
                    .into_iter()
                    .map(MarketRecord::try_from)
                    .collect::<std::result::Result<Vec<_>, StorageError>>()?;
                Ok(Dataset::Market(records))
            }
            DatasetKind::News => {
                let mut query = news_dsl::news_data
                    .select(NewsDataDB::as_select())
                    .into_boxed();
                if let Some(at) = filter.fetch_timestamp {
                    query = query.filter(news_dsl::fetch_timestamp.eq(at.to_string()));
                }
                if let Some(key) = filter.key.as_ref() {
                    query = query.filter(news_dsl::title.eq(key.clone()));
                }
                if let Some(source) = filter.data_source.as_ref() {
                    query = query.filter(news_dsl::data_source.eq(source.clone()));
                }
                query = query.order((news_dsl::fetch_timestamp.desc(), news_dsl::title.asc()));
                if let Some(limit) = limit {
                    query = query.limit(limit);
                }

                let rows = query
                    .load::<NewsDataDB>(&mut conn)
                    .into_core()?;
                let records = rows
                    .into_iter()
                    .map(NewsRecord::try_from)
                    .collect::<std::result::Result<Vec<_>, StorageError>>()?;
                Ok(Dataset::News(records))
            }
        }
    }

    pub fn count(&self, kind: DatasetKind) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        match kind {
            DatasetKind::Market => market_dsl::market_data
                .count()
                .get_result::<i64>(&mut conn)
                .into_core(),
            DatasetKind::News => news_dsl::news_data
                .count()
                .get_result::<i64>(&mut conn)
                .into_core(),
        }
    }
}
