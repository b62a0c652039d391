//! chessgames.com collector.
//!
//! Resolves a game or collection URL into game references, fetches each game
//! with its annotation payload and writes the merged, annotated PGN.

pub mod clients;
pub mod config;
pub mod crawler;
pub mod error;
pub mod pipeline;
pub mod session;

pub use clients::{ChessgamesClient, FetchPolicy, PageFetcher};
pub use config::{Cli, ScrapeConfig, SessionConfig, SiteConfig};
pub use crawler::{Crawler, GameReference};
pub use error::ScrapeError;
pub use pipeline::{BatchReport, Pipeline, SkippedGame};
pub use session::Session;
