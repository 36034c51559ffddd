//! SQLite storage for Tickerwire.
//!
//! This crate is the only place in the workspace where Diesel appears. It implements
//! the [`tickerwire_core::store::PipelineStore`] trait and contains:
//! - connection pooling and the single-writer actor
//! - embedded migrations for the record tables and the run ledger
//! - Diesel row models and their conversions to core records
//!
//! ```text
//!   core (pipeline)
//!         │
//!         ▼
//!   storage-sqlite (this crate)
//!         │
//!         ▼
//!     SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod records;
pub mod runs;
pub mod schema;
pub mod store;
pub mod utils;

pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};
pub use errors::{IntoCore, StorageError};
pub use store::SqlitePipelineStore;

pub use tickerwire_core::errors::{DatabaseError, Error, Result};
