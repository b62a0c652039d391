//! Collector error types

use std::time::Duration;

use pgn_core::PgnError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Pgn(#[from] PgnError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Failures worth another attempt under the fetch policy.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScrapeError::Network(_) | ScrapeError::Timeout(_))
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(e: reqwest::Error) -> Self {
        ScrapeError::Network(e.to_string())
    }
}
