use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::tempdir;

use super::render::money;
use super::*;
use crate::records::{Dataset, DatasetKind, FetchTimestamp, MarketRecord, NewsRecord};

fn at() -> FetchTimestamp {
    FetchTimestamp::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

fn coin(id: &str, price: Decimal, cap: Decimal, change: Decimal) -> MarketRecord {
    MarketRecord {
        id: id.to_string(),
        symbol: id.to_uppercase(),
        name: format!("{} coin", id),
        current_price: price,
        market_cap: cap,
        total_volume: dec!(1000),
        price_change_24h: dec!(0),
        price_change_percentage_24h: change,
        high_24h: price,
        low_24h: price,
        fetch_timestamp: at(),
        data_source: "market_api".to_string(),
    }
}

fn article(title: &str, source: &str, author: &str, published: &str) -> NewsRecord {
    NewsRecord {
        title: title.to_string(),
        description: String::new(),
        author: author.to_string(),
        content: String::new(),
        source_id: String::new(),
        source_name: source.to_string(),
        publishedat: published.to_string(),
        fetch_timestamp: at(),
        data_source: "news_api".to_string(),
    }
}

fn meta() -> RunMeta {
    RunMeta {
        run_id: "run-1".to_string(),
        fetch_timestamp: at(),
        generated_at: at().as_datetime(),
    }
}

#[test]
fn test_empty_market_summary_is_valid() {
    let summary = summarize(&Dataset::empty(DatasetKind::Market), &ReportOptions::default());
    let market = summary.as_market().unwrap();

    assert_eq!(market.total_records, 0);
    assert_eq!(market.total_market_cap, Some(Decimal::ZERO));
    assert_eq!(market.average_change_24h, None);
    assert_eq!(market.gainers, 0);
    assert!(market.top.is_empty());
    let price = market.column("current_price").unwrap();
    assert_eq!(price.count, 0);
    assert_eq!(price.mean, None);
    assert_eq!(price.std, None);
}

#[test]
fn test_empty_news_summary_is_valid() {
    let summary = summarize(&Dataset::empty(DatasetKind::News), &ReportOptions::default());
    let news = summary.as_news().unwrap();
    assert_eq!(news.total_articles, 0);
    assert_eq!(news.unique_sources, 0);
    assert!(news.recent_headlines.is_empty());
}

#[test]
fn test_market_summary_statistics() {
    let dataset = Dataset::Market(vec![
        coin("btc", dec!(60000), dec!(1200000000000), dec!(2.5)),
        coin("eth", dec!(3000), dec!(360000000000), dec!(-1.5)),
        coin("usdt", dec!(1), dec!(100000000000), dec!(0)),
    ]);

    let summary = summarize(&dataset, &ReportOptions::default());
    let market = summary.as_market().unwrap();

    assert_eq!(market.total_records, 3);
    assert_eq!(market.total_market_cap, Some(dec!(1660000000000)));
    assert_eq!(market.gainers, 1);
    assert_eq!(market.losers, 1);
    assert_eq!(market.average_change_24h, Some(dec!(0.33333333)));
    let price = market.column("current_price").unwrap();
    assert_eq!(price.min, Some(dec!(1)));
    assert_eq!(price.max, Some(dec!(60000)));
    assert_eq!(price.median, Some(dec!(3000)));
    assert_eq!(price.mean, Some(dec!(21000.33333333)));
    assert_eq!(
        market.top.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
        vec!["btc", "eth", "usdt"]
    );
}

#[test]
fn test_top_n_uses_sort_key_and_limit() {
    let dataset = Dataset::Market(vec![
        coin("a", dec!(10), dec!(5), dec!(1)),
        coin("b", dec!(20), dec!(1), dec!(9)),
        coin("c", dec!(30), dec!(3), dec!(4)),
    ]);
    let options = ReportOptions {
        top_n: 2,
        market_sort_key: MarketSortKey::PriceChangePercentage24h,
    };

    let summary = summarize(&dataset, &options);
    let top = &summary.as_market().unwrap().top;

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].id, "b");
    assert_eq!(top[0].value, dec!(9));
    assert_eq!(top[1].id, "c");
}

#[test]
fn test_news_summary() {
    let dataset = Dataset::News(vec![
        article("Old", "Reuters", "Ann", "2024-05-01T08:00:00Z"),
        article("Undated", "Reuters", "", ""),
        article("New", "Bloomberg", "Ann", "2024-05-01T11:00:00Z"),
        article("Mid", "", "Bob", "2024-05-01T10:00:00Z"),
    ]);

    let summary = summarize(&dataset, &ReportOptions::default());
    let news = summary.as_news().unwrap();

    assert_eq!(news.total_articles, 4);
    assert_eq!(news.unique_sources, 2);
    assert_eq!(news.source_distribution.get("Reuters"), Some(&2));
    assert_eq!(news.unique_authors, 2);
    assert_eq!(news.articles_with_author, 3);
    assert_eq!(news.recent_headlines, vec!["New", "Mid", "Old", "Undated"]);
}

#[test]
fn test_sort_key_parse() {
    assert_eq!(
        "market_cap".parse::<MarketSortKey>().unwrap(),
        MarketSortKey::MarketCap
    );
    assert!("volume".parse::<MarketSortKey>().is_err());
}

#[test]
fn test_money_formatting() {
    assert_eq!(money(dec!(1234567.891)), "$1,234,567.89");
    assert_eq!(money(dec!(0)), "$0.00");
    assert_eq!(money(dec!(-999.5)), "-$999.50");
    assert_eq!(money(dec!(100)), "$100.00");
}

#[test]
fn test_render_writes_all_artifacts() {
    let dir = tempdir().unwrap();
    let market = Dataset::Market(vec![coin("btc", dec!(60000), dec!(1200), dec!(2))]);
    let news = Dataset::News(vec![article("Headline", "Reuters", "Ann", "")]);
    let options = ReportOptions::default();
    let sections = vec![
        ReportSection {
            summary: summarize(&market, &options),
            dataset: market,
        },
        ReportSection {
            summary: summarize(&news, &options),
            dataset: news,
        },
    ];

    let artifacts = render(dir.path(), &sections, &meta()).unwrap();

    assert_eq!(artifacts.paths().len(), 4);
    let report = std::fs::read_to_string(artifacts.report_path.as_ref().unwrap()).unwrap();
    assert!(report.contains("DAILY MARKET & NEWS DATA REPORT"));
    assert!(report.contains("Run ID: run-1"));
    assert!(report.contains("1. btc coin: $60,000.00"));
    assert!(report.contains("1. Headline"));
    assert!(dir.path().join("market_data_20240501_120000.csv").exists());
    assert!(dir.path().join("news_data_20240501_120000.csv").exists());

    let summary = std::fs::read_to_string(artifacts.summary_csv.as_ref().unwrap()).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines[0], "metric,value");
    assert_eq!(lines[1], "Market Records,1");
    assert_eq!(lines[2], "News Articles,1");
    assert_eq!(lines[3], "Avg Current Price,\"$60,000.00\"");
    assert_eq!(lines[5], "Unique News Sources,1");
}

#[test]
fn test_render_without_sections_reports_missing_data() {
    let dir = tempdir().unwrap();

    let artifacts = render(dir.path(), &[], &meta()).unwrap();

    assert!(artifacts.dataset_csvs.is_empty());
    let report = std::fs::read_to_string(artifacts.report_path.unwrap()).unwrap();
    assert!(report.contains("No market data available"));
    assert!(report.contains("No news data available"));
    let summary = std::fs::read_to_string(artifacts.summary_csv.unwrap()).unwrap();
    assert!(summary.contains("Avg Current Price,N/A"));
}

#[test]
fn test_market_cap_overflow_renders_not_available() {
    let dir = tempdir().unwrap();
    let market = Dataset::Market(vec![
        coin("big", dec!(1), Decimal::MAX, dec!(0)),
        coin("bigger", dec!(2), Decimal::MAX, dec!(0)),
    ]);
    let summary = summarize(&market, &ReportOptions::default());
    assert_eq!(summary.as_market().unwrap().total_market_cap, None);

    let sections = vec![ReportSection {
        summary,
        dataset: market,
    }];
    let artifacts = render(dir.path(), &sections, &meta()).unwrap();

    let report = std::fs::read_to_string(artifacts.report_path.unwrap()).unwrap();
    assert!(report.contains("  Total: N/A"));
    let csv = std::fs::read_to_string(artifacts.summary_csv.unwrap()).unwrap();
    assert!(csv.contains("Total Market Cap,N/A"));
}
