//! Collector configuration: command-line flags and the validated runtime
//! settings derived from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pgn_core::IndexMode;

use crate::clients::FetchPolicy;
use crate::error::ScrapeError;

pub const BASE_URL: &str = "https://www.chessgames.com";

/// Where games live on the site and how game pages are laid out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteConfig {
    /// Prefix for relative game links found on listing pages
    pub base_url: String,

    /// `id` of the element carrying the game attributes
    pub game_element_id: String,

    pub pgn_attribute: String,

    pub annotation_attribute: String,

    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            game_element_id: "olga-data".to_string(),
            pgn_attribute: "pgn".to_string(),
            annotation_attribute: "notes".to_string(),
            user_agent: concat!("chessgames-pgn/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Everything a [`crate::Session`] needs besides the fetcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub site: SiteConfig,
    pub policy: FetchPolicy,
    pub index_mode: IndexMode,
    /// Maximum in-flight fetches
    pub concurrency: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            policy: FetchPolicy::default(),
            index_mode: IndexMode::Auto,
            concurrency: 4,
        }
    }
}

/// A validated run: what to scrape, where to write it, and how.
#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub source_url: String,
    pub output: PathBuf,
    pub session: SessionConfig,
}

/// Download games from chessgames.com into a single annotated PGN file.
#[derive(Parser, Debug)]
#[command(name = "chessgames-pgn", version)]
pub struct Cli {
    /// Game or collection URL
    #[arg(long)]
    pub url: Option<String>,

    /// Output PGN file
    #[arg(long)]
    pub pgn: Option<String>,

    /// How annotation indices map onto plies: direct, offset-by-two or auto
    #[arg(long, default_value = "auto")]
    pub index_mode: IndexMode,

    /// Games fetched at once
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Extra attempts after a network failure or timeout
    #[arg(long, default_value_t = 1)]
    pub retries: u32,

    /// Pause before each request, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,
}

impl Cli {
    /// Validate the flags. Runs before any network activity.
    pub fn into_config(self) -> Result<ScrapeConfig, ScrapeError> {
        let source_url = self
            .url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ScrapeError::Config("Invalid URL (it's empty or unprovided)".into()))?;

        let output = self
            .pgn
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ScrapeError::Config("Invalid output PGN name (it's empty or unprovided)".into())
            })?;

        if self.concurrency == 0 {
            return Err(ScrapeError::Config("Concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ScrapeError::Config("Timeout must be greater than zero".into()));
        }

        Ok(ScrapeConfig {
            source_url,
            output: PathBuf::from(output),
            session: SessionConfig {
                site: SiteConfig::default(),
                policy: FetchPolicy {
                    timeout: Duration::from_secs(self.timeout_secs),
                    retries: self.retries,
                    request_delay: Duration::from_millis(self.delay_ms),
                },
                index_mode: self.index_mode,
                concurrency: self.concurrency,
            },
        })
    }
}
