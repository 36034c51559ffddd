//! Core error types for the Tickerwire pipeline.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.
//!
//! The variants line up with how the orchestrator treats a failure:
//!
//! | Class | Raised by | Effect on the run |
//! |-------|-----------|-------------------|
//! | `Structural` | source adapter, cleaner | dataset fails, run `FAILED` |
//! | `Persistence` | store | dataset fails, run `FAILED` |
//! | `Reporting` | reporter, processed export | run `PARTIAL_FAILURE` |
//! | `Configuration` | config loading | run never starts |
//!
//! Availability problems never reach this type; the feed client absorbs them with a
//! fallback dataset. Data-quality problems are counted by the cleaner, not raised.

use thiserror::Error;

use crate::runs::RunStatus;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unexpected payload shape: {0}")]
    Structural(#[from] StructuralError),

    #[error("Report generation failed: {0}")]
    Reporting(#[from] ReportError),

    #[error("Invalid run status transition from {from} to {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    #[error("Failed to load configuration: {0}")]
    ConfigIO(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Missing configuration key: {0}")]
    MissingConfigKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// How the orchestrator should react to an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Structural,
    Persistence,
    Reporting,
    Configuration,
    Internal,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Structural(_) => ErrorClass::Structural,
            Error::Database(_) | Error::InvalidTransition { .. } => ErrorClass::Persistence,
            Error::Reporting(_) => ErrorClass::Reporting,
            Error::ConfigIO(_) | Error::InvalidConfigValue(_) | Error::MissingConfigKey(_) => {
                ErrorClass::Configuration
            }
            Error::Io(_) | Error::Unexpected(_) => ErrorClass::Internal,
        }
    }

    /// Fatal errors fail the dataset they occurred on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.class(), ErrorClass::Reporting)
    }
}

/// Database-agnostic error type for storage operations.
///
/// This enum uses `String` for all error details, allowing the storage layer
/// to convert storage-specific errors (Diesel, SQLite, etc.) into this format.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested record was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A unique constraint was violated.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A CHECK or NOT NULL constraint rejected a row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A database transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// The payload handed to the cleaner is not tabular.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("{kind} payload must be {expected}, got {found}")]
    UnexpectedShape {
        kind: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{kind} row {index} is {found}, expected an object")]
    NonObjectRow {
        kind: String,
        index: usize,
        found: &'static str,
    },

    #[error("{kind} source failed: {message}")]
    SourceFailed { kind: String, message: String },
}

/// Failures while writing report or export artifacts.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV export failed for {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read back {kind} data: {message}")]
    ReadBack { kind: String, message: String },
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Unexpected(format!("decimal conversion failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporting_errors_are_not_fatal() {
        let err = Error::Reporting(ReportError::ReadBack {
            kind: "market".to_string(),
            message: "boom".to_string(),
        });
        assert_eq!(err.class(), ErrorClass::Reporting);
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_database_errors_are_persistence() {
        let err = Error::Database(DatabaseError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.class(), ErrorClass::Persistence);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_structural_error_display() {
        let err = Error::Structural(StructuralError::NonObjectRow {
            kind: "news".to_string(),
            index: 3,
            found: "string",
        });
        assert_eq!(
            err.to_string(),
            "Unexpected payload shape: news row 3 is string, expected an object"
        );
    }
}
