//! Transport trait and structured error types.
//!
//! The HttpTransport trait abstracts the single GET the fetcher issues, so the
//! reqwest client can be swapped for a recording mock in tests.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Structured error types for fetch and postprocessing operations.
///
/// These are designed to be displayable in CLI contexts. Nothing is retried.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("requested date {date} lies in the future")]
    FutureDate { date: String },

    #[error("{date} not available, status code: {status}")]
    ContentNotFound { date: String, status: u16 },

    #[error("postprocessing is not implemented for {variant}")]
    NotImplemented { variant: String },

    #[error("no dates requested")]
    EmptyDateRange,

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("table error: {0}")]
    Frame(#[from] PolarsError),
}

/// Status and body of one GET.
///
/// The body is only read for successful responses; it is empty otherwise.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }
}

/// Issues a plain GET (no auth, no retry) and reports status plus body.
///
/// Only transport-level failures are errors here; status handling is left to
/// the caller.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, DataError>;
}
