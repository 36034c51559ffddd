//! Report artifact rendering.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rust_decimal::Decimal;

use super::reporting_model::{
    MarketSummary, NewsSummary, ReportArtifacts, ReportSection, RunMeta, Summary,
};
use crate::constants::DISPLAY_DECIMAL_PRECISION;
use crate::errors::ReportError;
use crate::records::{write_dataset_csv, DatasetKind, FetchTimestamp};

const RULE_WIDTH: usize = 80;

pub fn report_path(dir: &Path, at: FetchTimestamp) -> PathBuf {
    dir.join(format!("daily_report_{}.txt", at.file_stamp()))
}

pub fn dataset_csv_path(dir: &Path, kind: DatasetKind, at: FetchTimestamp) -> PathBuf {
    dir.join(format!("{}_data_{}.csv", kind, at.file_stamp()))
}

pub fn summary_csv_path(dir: &Path, at: FetchTimestamp) -> PathBuf {
    dir.join(format!("daily_summary_{}.csv", at.file_stamp()))
}

/// Writes every report artifact for a run into `dir`.
///
/// Sections for datasets that did not reach the store are simply absent; the text
/// report says so. Files from an earlier run with the same fetch timestamp are
/// replaced.
pub fn render(
    dir: &Path,
    sections: &[ReportSection],
    meta: &RunMeta,
) -> Result<ReportArtifacts, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Write {
        path: dir.display().to_string(),
        source,
    })?;

    let mut artifacts = ReportArtifacts::default();
    for section in sections {
        let path = dataset_csv_path(dir, section.dataset.kind(), meta.fetch_timestamp);
        write_dataset_csv(&path, &section.dataset)?;
        info!("{} data exported to {}", section.dataset.kind(), path.display());
        artifacts.dataset_csvs.push(path);
    }

    let market = find_summary(sections, DatasetKind::Market).and_then(Summary::as_market);
    let news = find_summary(sections, DatasetKind::News).and_then(Summary::as_news);

    let path = report_path(dir, meta.fetch_timestamp);
    write_text(&path, &daily_report_text(market, news, meta))?;
    info!("Daily report saved to {}", path.display());
    artifacts.report_path = Some(path);

    let path = summary_csv_path(dir, meta.fetch_timestamp);
    write_summary_csv(&path, market, news)?;
    info!("Summary exported to {}", path.display());
    artifacts.summary_csv = Some(path);

    Ok(artifacts)
}

fn find_summary(sections: &[ReportSection], kind: DatasetKind) -> Option<&Summary> {
    sections
        .iter()
        .map(|s| &s.summary)
        .find(|summary| summary.kind() == kind)
}

fn write_text(path: &Path, text: &str) -> Result<(), ReportError> {
    fs::write(path, text).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })
}

pub fn daily_report_text(
    market: Option<&MarketSummary>,
    news: Option<&NewsSummary>,
    meta: &RunMeta,
) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "DAILY MARKET & NEWS DATA REPORT");
    let _ = writeln!(out, "{}\n", heavy);
    let _ = writeln!(
        out,
        "Report Generated: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Data Fetched: {}", meta.fetch_timestamp);
    let _ = writeln!(out, "Run ID: {}\n", meta.run_id);

    let _ = writeln!(out, "{}\nMARKET DATA SUMMARY\n{}\n", light, light);
    match market {
        Some(summary) => write_market_section(&mut out, summary),
        None => {
            let _ = writeln!(out, "No market data available for this run.\n");
        }
    }

    let _ = writeln!(out, "{}\nNEWS DATA SUMMARY\n{}\n", light, light);
    match news {
        Some(summary) => write_news_section(&mut out, summary),
        None => {
            let _ = writeln!(out, "No news data available for this run.\n");
        }
    }

    let _ = writeln!(out, "{}\nEND OF REPORT\n{}", heavy, heavy);
    out
}

fn write_market_section(out: &mut String, summary: &MarketSummary) {
    let _ = writeln!(out, "Total Records: {}\n", summary.total_records);

    if let Some(price) = summary.column("current_price").filter(|c| c.count > 0) {
        let _ = writeln!(out, "Price Statistics:");
        for (label, value) in [
            ("Average", price.mean),
            ("Median", price.median),
            ("Min", price.min),
            ("Max", price.max),
            ("Std", price.std),
        ] {
            let _ = writeln!(out, "  {}: {}", label, money_or_na(value));
        }
        let _ = writeln!(out);
    }

    if let Some(caps) = summary.column("market_cap").filter(|c| c.count > 0) {
        let _ = writeln!(out, "Market Cap Statistics:");
        let _ = writeln!(out, "  Total: {}", money_or_na(summary.total_market_cap));
        let _ = writeln!(out, "  Average: {}", money_or_na(caps.mean));
        let _ = writeln!(out, "  Top coin cap: {}\n", money_or_na(caps.max));
    }

    if let Some(average) = summary.average_change_24h {
        let _ = writeln!(out, "24h Price Change:");
        let _ = writeln!(
            out,
            "  Average Change: {}%",
            average.round_dp(DISPLAY_DECIMAL_PRECISION)
        );
        let _ = writeln!(out, "  Gainers: {}", summary.gainers);
        let _ = writeln!(out, "  Losers: {}\n", summary.losers);
    }

    if !summary.top.is_empty() {
        let _ = writeln!(
            out,
            "Top {} Assets by {}:",
            summary.top.len(),
            summary.sort_key
        );
        for (i, asset) in summary.top.iter().enumerate() {
            let name = if asset.name.is_empty() {
                asset.id.as_str()
            } else {
                asset.name.as_str()
            };
            let _ = writeln!(out, "  {}. {}: {}", i + 1, name, money(asset.current_price));
        }
        let _ = writeln!(out);
    }
}

fn write_news_section(out: &mut String, summary: &NewsSummary) {
    let _ = writeln!(out, "Total Articles: {}\n", summary.total_articles);
    let _ = writeln!(out, "Unique Sources: {}", summary.unique_sources);
    for (source, count) in &summary.source_distribution {
        let _ = writeln!(out, "  {}: {}", source, count);
    }
    let _ = writeln!(
        out,
        "\nAuthors: {} unique, {} articles with an author\n",
        summary.unique_authors, summary.articles_with_author
    );

    if !summary.recent_headlines.is_empty() {
        let _ = writeln!(out, "Recent Headlines:");
        for (i, headline) in summary.recent_headlines.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, headline);
        }
        let _ = writeln!(out);
    }
}

fn write_summary_csv(
    path: &Path,
    market: Option<&MarketSummary>,
    news: Option<&NewsSummary>,
) -> Result<(), ReportError> {
    let csv_error = |source| ReportError::Csv {
        path: path.display().to_string(),
        source,
    };

    let average_price = market
        .and_then(|m| m.column("current_price"))
        .and_then(|c| c.mean);
    let rows = [
        (
            "Market Records",
            market.map(|m| m.total_records).unwrap_or(0).to_string(),
        ),
        (
            "News Articles",
            news.map(|n| n.total_articles).unwrap_or(0).to_string(),
        ),
        ("Avg Current Price", money_or_na(average_price)),
        (
            "Total Market Cap",
            money_or_na(market.and_then(|m| m.total_market_cap)),
        ),
        (
            "Unique News Sources",
            news.map(|n| n.unique_sources.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
    ];

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(["metric", "value"]).map_err(csv_error)?;
    for (metric, value) in rows {
        writer.write_record([metric, value.as_str()]).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn money_or_na(value: Option<Decimal>) -> String {
    value.map(money).unwrap_or_else(|| "N/A".to_string())
}

/// `$1,234.57` style formatting.
pub fn money(value: Decimal) -> String {
    let rounded = value.round_dp(DISPLAY_DECIMAL_PRECISION);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}
