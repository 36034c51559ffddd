//! Synthetic datasets used when a live feed is unavailable.
//!
//! The generated documents have exactly the shape the live APIs return, so they
//! travel through the same cleaning and storage path. Generation is driven by a
//! seeded RNG: the same seed, size and fetch instant always produce the same
//! document.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::models::DatasetKind;

/// Upper bound on the number of synthetic rows per dataset.
pub const MAX_FALLBACK_ROWS: usize = 500;

/// Size and seed of the fallback datasets.
#[derive(Clone, Debug)]
pub struct FallbackSettings {
    pub market_size: usize,
    pub news_size: usize,
    pub seed: u64,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            market_size: 10,
            news_size: 5,
            seed: 42,
        }
    }
}

impl FallbackSettings {
    /// Row count for `kind`, clamped to `1..=MAX_FALLBACK_ROWS`.
    pub fn size_for(&self, kind: DatasetKind) -> usize {
        let requested = match kind {
            DatasetKind::Market => self.market_size,
            DatasetKind::News => self.news_size,
        };
        requested.clamp(1, MAX_FALLBACK_ROWS)
    }
}

/// (id, symbol, name, reference price, reference market cap, reference volume)
const COINS: &[(&str, &str, &str, f64, f64, f64)] = &[
    ("bitcoin", "btc", "Bitcoin", 98456.78, 1.923e12, 4.567e10),
    ("ethereum", "eth", "Ethereum", 3678.90, 4.567e11, 2.345e10),
    ("binancecoin", "bnb", "Binance Coin", 612.34, 9.456e10, 2.345e9),
    ("solana", "sol", "Solana", 234.56, 1.234e11, 4.567e9),
    ("ripple", "xrp", "XRP", 2.31, 1.321e11, 8.765e9),
    ("cardano", "ada", "Cardano", 1.23, 4.345e10, 1.234e9),
    ("dogecoin", "doge", "Dogecoin", 0.38, 5.612e10, 3.456e9),
    ("polkadot", "dot", "Polkadot", 8.91, 1.356e10, 6.543e8),
    ("chainlink", "link", "Chainlink", 24.67, 1.532e10, 9.876e8),
    ("avalanche-2", "avax", "Avalanche", 45.12, 1.845e10, 7.654e8),
];

/// (source id, source name, author, title, description)
const ARTICLES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "mock-source",
        "Mock News",
        "Demo Author",
        "Market Analysis: Tech Stocks Rally",
        "Technology stocks showed strong performance today",
    ),
    (
        "mock-source-2",
        "Financial Times",
        "Finance Reporter",
        "Economic Indicators Point to Growth",
        "Latest economic data suggests positive trends",
    ),
    (
        "mock-source-3",
        "Business Daily",
        "Market Analyst",
        "Cryptocurrency Markets Stabilize",
        "Digital currencies show reduced volatility",
    ),
    (
        "mock-source-4",
        "Global Markets Wire",
        "Rates Desk",
        "Bond Yields Edge Lower Ahead of Central Bank Meeting",
        "Treasuries firmed as traders priced in a pause",
    ),
    (
        "mock-source-5",
        "Commodities Today",
        "Energy Correspondent",
        "Oil Prices Steady After Inventory Report",
        "Crude held its range following a smaller than expected build",
    ),
];

/// Builds the fallback document for `kind`.
pub fn generate(kind: DatasetKind, settings: &FallbackSettings, fetched_at: DateTime<Utc>) -> Value {
    let rows = settings.size_for(kind);
    match kind {
        DatasetKind::Market => market_document(rows, settings.seed),
        DatasetKind::News => news_document(rows, settings.seed, fetched_at),
    }
}

fn market_document(rows: usize, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let coins: Vec<Value> = (0..rows)
        .map(|i| {
            let (id, symbol, name, price, cap, volume) = COINS[i % COINS.len()];
            let cycle = i / COINS.len();
            // Later cycles get distinct ids so the batch has no natural-key duplicates.
            let (id, symbol, name) = if cycle == 0 {
                (id.to_string(), symbol.to_string(), name.to_string())
            } else {
                (
                    format!("{}-{}", id, cycle),
                    format!("{}{}", symbol, cycle),
                    format!("{} {}", name, cycle),
                )
            };

            let drift: f64 = rng.gen_range(-0.05..0.05);
            let current = round2(price * (1.0 + drift));
            let change_pct: f64 = rng.gen_range(-6.0..6.0);
            let previous = current / (1.0 + change_pct / 100.0);
            let change = current - previous;
            let high = current.max(previous) * (1.0 + rng.gen_range(0.0..0.02));
            let low = current.min(previous) * (1.0 - rng.gen_range(0.0..0.02));

            json!({
                "id": id,
                "symbol": symbol,
                "name": name,
                "current_price": current,
                "market_cap": (cap * (1.0 + drift)).round(),
                "total_volume": (volume * rng.gen_range(0.8..1.2)).round(),
                "price_change_24h": round_to(change, 6),
                "price_change_percentage_24h": round2(change_pct),
                "high_24h": round_to(high, 6),
                "low_24h": round_to(low, 6),
            })
        })
        .collect();
    Value::Array(coins)
}

fn news_document(rows: usize, seed: u64, fetched_at: DateTime<Utc>) -> Value {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    let articles: Vec<Value> = (0..rows)
        .map(|i| {
            let (source_id, source_name, author, title, description) = ARTICLES[i % ARTICLES.len()];
            let cycle = i / ARTICLES.len();
            let title = if cycle == 0 {
                title.to_string()
            } else {
                format!("{} (Update {})", title, cycle)
            };
            let minutes_ago: i64 = (i as i64) * 15 + rng.gen_range(0..15);
            let published = fetched_at - Duration::minutes(minutes_ago);

            json!({
                "source": {"id": source_id, "name": source_name},
                "author": author,
                "title": title,
                "description": description,
                "publishedAt": published.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                "content": format!("{}. Synthetic article generated while the news feed was unavailable.", description),
            })
        })
        .collect();

    json!({
        "status": "ok",
        "totalResults": articles.len(),
        "articles": articles,
    })
}

fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
