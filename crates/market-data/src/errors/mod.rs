//! Error types for the feed clients.
//!
//! Every variant here is an *availability* problem: the remote source could not
//! hand us a usable payload. The feed client absorbs all of them by switching to a
//! synthetic fallback dataset, so these errors are logged but never surface as a
//! pipeline failure.

use thiserror::Error;

use crate::models::DatasetKind;

/// Errors that can occur while fetching a dataset from a remote source.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The request did not complete within the configured timeout.
    #[error("Timeout fetching {kind} feed")]
    Timeout {
        /// Dataset that timed out
        kind: DatasetKind,
    },

    /// The server answered with a non-success status code.
    #[error("HTTP {status} from {kind} feed")]
    HttpStatus {
        /// Dataset being fetched
        kind: DatasetKind,
        /// Status code returned by the server
        status: u16,
    },

    /// The body could not be decoded, or decoded into an unexpected shape.
    #[error("Malformed {kind} payload: {message}")]
    MalformedPayload {
        /// Dataset being fetched
        kind: DatasetKind,
        /// What was wrong with the payload
        message: String,
    },

    /// The payload was well formed but carried no rows.
    #[error("Empty {kind} payload")]
    EmptyPayload {
        /// Dataset being fetched
        kind: DatasetKind,
    },

    /// Connection, DNS or TLS failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether the error means the source is unavailable and the fallback dataset
    /// should be used instead.
    ///
    /// All current variants qualify; the method exists so callers branch on the
    /// classification rather than on individual variants.
    pub fn is_availability(&self) -> bool {
        match self {
            Self::Timeout { .. }
            | Self::HttpStatus { .. }
            | Self::MalformedPayload { .. }
            | Self::EmptyPayload { .. }
            | Self::Network(_) => true,
        }
    }

    /// Classifies a transport error, separating timeouts from other failures.
    pub(crate) fn from_transport(kind: DatasetKind, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { kind }
        } else if err.is_decode() {
            Self::MalformedPayload {
                kind,
                message: err.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}
