//! Tickerwire Market Data Crate
//!
//! Source adapters for the Tickerwire pipeline: fetching the market and news
//! documents over HTTP, substituting deterministic synthetic datasets when a
//! source is unavailable, and keeping an immutable raw snapshot of every payload.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   FeedClient     |  (one reqwest client, bounded timeout)
//! +------------------+
//!          |
//!          v
//! +------------------+   error   +------------------+
//! |   live endpoint  | --------> | fallback dataset |  (seeded, same shape)
//! +------------------+           +------------------+
//!          |                              |
//!          +--------------+---------------+
//!                         v
//!               +------------------+
//!               |  raw snapshot    |  ({kind}_data_{ts}.json)
//!               +------------------+
//!                         |
//!                         v
//!               +------------------+
//!               |  FetchOutcome    |
//!               +------------------+
//! ```

pub mod errors;
pub mod feed;
pub mod models;

pub use errors::MarketDataError;
pub use feed::{
    FallbackSettings, FeedClient, FeedSettings, DEFAULT_REQUEST_TIMEOUT, FILE_TIMESTAMP_FORMAT,
    MAX_FALLBACK_ROWS,
};
pub use models::{DatasetKind, FetchOutcome, ParseDatasetKindError};
