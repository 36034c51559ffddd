//! Market and news record tables.

mod model;
mod repository;

pub use model::{MarketDataDB, NewsDataDB};
pub use repository::RecordRepository;
