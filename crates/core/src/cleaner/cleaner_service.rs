use std::collections::HashMap;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use super::cleaner_model::{CleanReport, DataQualityIssue};
use super::normalize::{
    coerce_decimal, coerce_published, coerce_text, extract_rows, normalize_row,
};
use crate::errors::Result;
use crate::records::{Dataset, DatasetKind, FetchTimestamp, MarketRecord, NewsRecord};

/// Cleans one raw payload into a canonical batch.
///
/// Every surviving record is stamped with `fetch_timestamp` and `data_source`.
/// Fails only when the payload is not tabular.
pub fn clean(
    payload: &Value,
    kind: DatasetKind,
    fetch_timestamp: FetchTimestamp,
    data_source: &str,
) -> Result<(Dataset, CleanReport)> {
    let rows = extract_rows(kind, payload)?;
    let mut report = CleanReport::new(kind, rows.len());
    info!("Cleaning {} {} rows", rows.len(), kind);

    let dataset = match kind {
        DatasetKind::Market => {
            let parsed = parse_rows(&rows, &mut report, |row, index| {
                market_record(row, index, fetch_timestamp, data_source)
            });
            let unique = dedup_last(parsed, &mut report, |r| r.id.clone());
            Dataset::Market(validate(unique, &mut report, validate_market))
        }
        DatasetKind::News => {
            let parsed = parse_rows(&rows, &mut report, |row, _| {
                Ok(news_record(row, fetch_timestamp, data_source))
            });
            let unique = dedup_last(parsed, &mut report, |r| r.title.clone());
            Dataset::News(validate(unique, &mut report, validate_news))
        }
    };

    if report.dropped() > 0 {
        warn!(
            "{} cleaning dropped {} of {} rows ({} duplicates, {} invalid)",
            kind,
            report.dropped(),
            report.input_rows,
            report.duplicates_removed,
            report.invalid_dropped
        );
    }
    info!("Cleaned {} records: {}", kind, dataset.len());
    Ok((dataset, report))
}

/// Keeps `(row index, record)` pairs for rows that coerced cleanly.
fn parse_rows<T, F>(
    rows: &[&Map<String, Value>],
    report: &mut CleanReport,
    mut build: F,
) -> Vec<(usize, T)>
where
    F: FnMut(&Map<String, Value>, usize) -> std::result::Result<T, DataQualityIssue>,
{
    let mut parsed = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let row = normalize_row(row);
        match build(&row, index) {
            Ok(record) => parsed.push((index, record)),
            Err(issue) => {
                debug!("Dropping row: {}", issue);
                report.record(issue);
            }
        }
    }
    parsed
}

/// Collapses rows sharing a key. The last row's values win.
fn dedup_last<T, K>(rows: Vec<(usize, T)>, report: &mut CleanReport, key: K) -> Vec<(usize, T)>
where
    K: Fn(&T) -> String,
{
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    for (position, (_, record)) in rows.iter().enumerate() {
        last_seen.insert(key(record), position);
    }

    rows.into_iter()
        .enumerate()
        .filter_map(|(position, (index, record))| {
            let k = key(&record);
            if last_seen.get(&k) == Some(&position) {
                Some((index, record))
            } else {
                debug!("Replacing duplicate row for key '{}'", k);
                report.record(DataQualityIssue::Duplicate { key: k });
                None
            }
        })
        .collect()
}

fn validate<T, V>(rows: Vec<(usize, T)>, report: &mut CleanReport, check: V) -> Vec<T>
where
    V: Fn(&T, usize) -> Option<DataQualityIssue>,
{
    rows.into_iter()
        .filter_map(|(index, record)| match check(&record, index) {
            Some(issue) => {
                debug!("Dropping row: {}", issue);
                report.record(issue);
                None
            }
            None => Some(record),
        })
        .collect()
}

fn numeric(
    row: &Map<String, Value>,
    index: usize,
    field: &str,
) -> std::result::Result<Decimal, DataQualityIssue> {
    coerce_decimal(row.get(field)).ok_or_else(|| DataQualityIssue::NonNumeric {
        row: index,
        field: field.to_string(),
    })
}

fn market_record(
    row: &Map<String, Value>,
    index: usize,
    fetch_timestamp: FetchTimestamp,
    data_source: &str,
) -> std::result::Result<MarketRecord, DataQualityIssue> {
    Ok(MarketRecord {
        id: coerce_text(row.get("id")),
        symbol: coerce_text(row.get("symbol")),
        name: coerce_text(row.get("name")),
        current_price: numeric(row, index, "current_price")?,
        market_cap: numeric(row, index, "market_cap")?,
        total_volume: numeric(row, index, "total_volume")?,
        price_change_24h: numeric(row, index, "price_change_24h")?,
        price_change_percentage_24h: numeric(row, index, "price_change_percentage_24h")?,
        high_24h: numeric(row, index, "high_24h")?,
        low_24h: numeric(row, index, "low_24h")?,
        fetch_timestamp,
        data_source: data_source.to_string(),
    })
}

fn news_record(
    row: &Map<String, Value>,
    fetch_timestamp: FetchTimestamp,
    data_source: &str,
) -> NewsRecord {
    NewsRecord {
        title: coerce_text(row.get("title")),
        description: coerce_text(row.get("description")),
        author: coerce_text(row.get("author")),
        content: coerce_text(row.get("content")),
        source_id: coerce_text(row.get("source_id")),
        source_name: coerce_text(row.get("source_name")),
        publishedat: coerce_published(row.get("publishedat")),
        fetch_timestamp,
        data_source: data_source.to_string(),
    }
}

fn validate_market(record: &MarketRecord, index: usize) -> Option<DataQualityIssue> {
    if record.id.is_empty() {
        Some(DataQualityIssue::EmptyKey { row: index })
    } else if record.current_price < Decimal::ZERO {
        Some(DataQualityIssue::NegativePrice {
            key: record.id.clone(),
        })
    } else if record.market_cap < Decimal::ZERO {
        Some(DataQualityIssue::NegativeMarketCap {
            key: record.id.clone(),
        })
    } else {
        None
    }
}

fn validate_news(record: &NewsRecord, index: usize) -> Option<DataQualityIssue> {
    if record.title.is_empty() {
        Some(DataQualityIssue::EmptyKey { row: index })
    } else {
        None
    }
}
