use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use rust_decimal::Decimal;

use super::reporting_model::{
    MarketSortKey, MarketSummary, NewsSummary, ReportOptions, Summary, TopAsset,
};
use super::statistics::{column_stats, mean, sum};
use crate::constants::{RECORD_DECIMAL_PRECISION, REPORT_HEADLINE_COUNT};
use crate::records::{Dataset, MarketRecord, NewsRecord};

/// Numeric market columns that get descriptive statistics.
const MARKET_STAT_COLUMNS: [MarketColumn; 7] = [
    ("current_price", |r| r.current_price),
    ("market_cap", |r| r.market_cap),
    ("total_volume", |r| r.total_volume),
    ("price_change_24h", |r| r.price_change_24h),
    ("price_change_percentage_24h", |r| r.price_change_percentage_24h),
    ("high_24h", |r| r.high_24h),
    ("low_24h", |r| r.low_24h),
];

type MarketColumn = (&'static str, fn(&MarketRecord) -> Decimal);

/// Summarizes a batch. An empty batch yields zero counts and empty statistics.
pub fn summarize(dataset: &Dataset, options: &ReportOptions) -> Summary {
    match dataset {
        Dataset::Market(rows) => Summary::Market(summarize_market(rows, options)),
        Dataset::News(rows) => Summary::News(summarize_news(rows)),
    }
}

fn summarize_market(rows: &[MarketRecord], options: &ReportOptions) -> MarketSummary {
    let columns = MARKET_STAT_COLUMNS
        .iter()
        .map(|(name, get)| {
            let values: Vec<Decimal> = rows.iter().map(get).collect();
            column_stats(name, &values)
        })
        .collect();

    let caps: Vec<Decimal> = rows.iter().map(|r| r.market_cap).collect();
    let changes: Vec<Decimal> = rows.iter().map(|r| r.price_change_percentage_24h).collect();

    let summary = MarketSummary {
        total_records: rows.len(),
        columns,
        total_market_cap: sum(&caps),
        average_change_24h: mean(&changes).map(|m| m.round_dp(RECORD_DECIMAL_PRECISION)),
        gainers: changes.iter().filter(|c| **c > Decimal::ZERO).count(),
        losers: changes.iter().filter(|c| **c < Decimal::ZERO).count(),
        sort_key: options.market_sort_key,
        top: top_assets(rows, options.market_sort_key, options.top_n),
    };
    debug!(
        "Market summary: {} records, {} gainers, {} losers",
        summary.total_records, summary.gainers, summary.losers
    );
    summary
}

fn top_assets(rows: &[MarketRecord], key: MarketSortKey, n: usize) -> Vec<TopAsset> {
    let mut ranked: Vec<&MarketRecord> = rows.iter().collect();
    ranked.sort_by(|a, b| key.value(b).cmp(&key.value(a)).then_with(|| a.id.cmp(&b.id)));
    ranked
        .into_iter()
        .take(n)
        .map(|r| TopAsset {
            id: r.id.clone(),
            name: r.name.clone(),
            current_price: r.current_price,
            market_cap: r.market_cap,
            value: key.value(r),
        })
        .collect()
}

fn summarize_news(rows: &[NewsRecord]) -> NewsSummary {
    let mut source_distribution: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.source_name.is_empty()) {
        *source_distribution.entry(row.source_name.clone()).or_default() += 1;
    }

    let authors: BTreeSet<&str> = rows
        .iter()
        .map(|r| r.author.as_str())
        .filter(|a| !a.is_empty())
        .collect();

    // Newest first; articles without a publish time go last in input order.
    let mut by_recency: Vec<&NewsRecord> = rows.iter().collect();
    by_recency.sort_by(|a, b| match (a.publishedat.is_empty(), b.publishedat.is_empty()) {
        (false, false) => b.publishedat.cmp(&a.publishedat),
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (true, true) => std::cmp::Ordering::Equal,
    });

    NewsSummary {
        total_articles: rows.len(),
        unique_sources: source_distribution.len(),
        source_distribution,
        unique_authors: authors.len(),
        articles_with_author: rows.iter().filter(|r| !r.author.is_empty()).count(),
        recent_headlines: by_recency
            .into_iter()
            .take(REPORT_HEADLINE_COUNT)
            .map(|r| r.title.clone())
            .collect(),
    }
}
