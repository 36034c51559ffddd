//! Pipeline configuration: defaults, an optional JSON file and `TICKERWIRE_*`
//! environment overrides, applied in that order.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use tickerwire_market_data::{FallbackSettings, FeedSettings};

use crate::errors::{Error, Result};
use crate::reporting::{MarketSortKey, ReportOptions};

/// Prefix for environment overrides, e.g. `TICKERWIRE_DATABASE_PATH`.
pub const CONFIG_ENV_PREFIX: &str = "TICKERWIRE_";

/// Config file read when no path is given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const DEFAULT_MARKET_API_URL: &str = "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=10&page=1";
const DEFAULT_NEWS_API_URL: &str =
    "https://newsapi.org/v2/top-headlines?category=business&language=en";

/// Every recognised key, in documentation order.
const KEYS: [&str; 15] = [
    "market_api_url",
    "news_api_url",
    "news_api_key",
    "database_path",
    "log_path",
    "raw_data_path",
    "processed_data_path",
    "reports_path",
    "request_timeout_secs",
    "fallback_market_size",
    "fallback_news_size",
    "fallback_seed",
    "report_top_n",
    "report_sort_key",
    "date_format",
];

/// Settings for one pipeline process. Built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub market_api_url: String,
    pub news_api_url: String,
    #[serde(skip_serializing)]
    pub news_api_key: Option<String>,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub raw_data_path: PathBuf,
    pub processed_data_path: PathBuf,
    pub reports_path: PathBuf,
    pub request_timeout_secs: u64,
    pub fallback_market_size: usize,
    pub fallback_news_size: usize,
    pub fallback_seed: u64,
    pub report_top_n: usize,
    pub report_sort_key: MarketSortKey,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let fallback = FallbackSettings::default();
        let report = ReportOptions::default();
        Self {
            market_api_url: DEFAULT_MARKET_API_URL.to_string(),
            news_api_url: DEFAULT_NEWS_API_URL.to_string(),
            news_api_key: None,
            database_path: PathBuf::from("data/pipeline.db"),
            log_path: PathBuf::from("logs/pipeline.log"),
            raw_data_path: PathBuf::from("data/raw"),
            processed_data_path: PathBuf::from("data/processed"),
            reports_path: PathBuf::from("reports"),
            request_timeout_secs: 30,
            fallback_market_size: fallback.market_size,
            fallback_news_size: fallback.news_size,
            fallback_seed: fallback.seed,
            report_top_n: report.top_n,
            report_sort_key: report.market_sort_key,
        }
    }
}

impl PipelineConfig {
    /// Loads the process configuration.
    ///
    /// An explicit `path` must exist; otherwise `config.json` in the working
    /// directory is used when present. Environment variables win over the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_sources(path, |key| std::env::var(key).ok())
    }

    /// Same as [`PipelineConfig::load`] with an injectable environment lookup.
    pub fn from_sources<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match path {
            Some(path) => config.apply_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    config.apply_file(default)?;
                }
            }
        }

        for key in KEYS {
            let var = format!("{}{}", CONFIG_ENV_PREFIX, key.to_ascii_uppercase());
            if let Some(raw) = env(&var) {
                debug!("Config override from {}", var);
                config.set(key, &raw)?;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Applies a JSON object of `key: value` pairs.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        let document: Value = serde_json::from_str(&text)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        let Value::Object(entries) = document else {
            return Err(Error::ConfigIO(format!(
                "{}: expected a JSON object",
                path.display()
            )));
        };

        for (key, value) in entries {
            let raw = match value {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            if KEYS.contains(&key.as_str()) {
                self.set(&key, &raw)?;
            } else {
                warn!("Ignoring unknown config key '{}' in {}", key, path.display());
            }
        }
        Ok(())
    }

    /// Sets one key from its text form.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let value = raw.trim();
        match key {
            "market_api_url" => self.market_api_url = required(key, value)?,
            "news_api_url" => self.news_api_url = required(key, value)?,
            "news_api_key" => {
                self.news_api_key = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "database_path" => self.database_path = required(key, value)?.into(),
            "log_path" => self.log_path = required(key, value)?.into(),
            "raw_data_path" => self.raw_data_path = required(key, value)?.into(),
            "processed_data_path" => self.processed_data_path = required(key, value)?.into(),
            "reports_path" => self.reports_path = required(key, value)?.into(),
            "request_timeout_secs" => self.request_timeout_secs = number(key, value)?,
            "fallback_market_size" => self.fallback_market_size = number(key, value)?,
            "fallback_news_size" => self.fallback_news_size = number(key, value)?,
            "fallback_seed" => self.fallback_seed = number(key, value)?,
            "report_top_n" => self.report_top_n = number(key, value)?,
            "report_sort_key" => self.report_sort_key = value.parse()?,
            // Accepted for older config files; timestamps have one canonical format.
            "date_format" => {}
            other => {
                return Err(Error::InvalidConfigValue(format!(
                    "unknown config key '{}'",
                    other
                )))
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.report_top_n == 0 {
            return Err(Error::InvalidConfigValue(
                "report_top_n must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            market_url: self.market_api_url.clone(),
            news_url: self.news_api_url.clone(),
            news_api_key: self.news_api_key.clone(),
            timeout: self.request_timeout(),
            raw_data_path: self.raw_data_path.clone(),
            fallback: FallbackSettings {
                market_size: self.fallback_market_size,
                news_size: self.fallback_news_size,
                seed: self.fallback_seed,
            },
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            top_n: self.report_top_n,
            market_sort_key: self.report_sort_key,
        }
    }
}

fn required(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        Err(Error::MissingConfigKey(key.to_string()))
    } else {
        Ok(value.to_string())
    }
}

fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        Error::InvalidConfigValue(format!("{}: '{}' is not a valid number", key, value))
    })
}
