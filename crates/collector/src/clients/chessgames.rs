use async_trait::async_trait;
use pgn_core::RawGamePayload;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use super::{FetchPolicy, PageFetcher};
use crate::config::SiteConfig;
use crate::error::ScrapeError;

pub struct ChessgamesClient {
    client: Client,
    site: SiteConfig,
}

impl ChessgamesClient {
    pub fn new(site: SiteConfig, policy: &FetchPolicy) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(site.user_agent.as_str())
            .timeout(policy.timeout)
            .build()?;
        Ok(Self { client, site })
    }

    async fn get_text(&self, url: &str) -> Result<String, ScrapeError> {
        debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network(format!("Request error for {url}: {e}")))?;

        if !resp.status().is_success() {
            return Err(ScrapeError::Network(format!("HTTP {} for {url}", resp.status())));
        }

        resp.text()
            .await
            .map_err(|e| ScrapeError::Network(format!("Body read error for {url}: {e}")))
    }
}

#[async_trait]
impl PageFetcher for ChessgamesClient {
    async fn fetch_game(&self, url: &str) -> Result<RawGamePayload, ScrapeError> {
        let body = self.get_text(url).await?;
        extract_game_payload(&body, &self.site)
    }

    async fn fetch_listing_page(&self, url: &str) -> Result<String, ScrapeError> {
        self.get_text(url).await
    }
}

/// Pull the PGN and the optional annotation payload out of a game page.
///
/// Values are read from the `site.game_element_id` element, or from the
/// first element carrying the PGN attribute when that element is missing.
/// The HTML parser decodes attribute entities once, which is all the PGN
/// needs; the annotation parser deals with whatever escaping is left.
pub fn extract_game_payload(
    markup: &str,
    site: &SiteConfig,
) -> Result<RawGamePayload, ScrapeError> {
    let pgn_name = site.pgn_attribute.to_ascii_lowercase();
    let notes_name = site.annotation_attribute.to_ascii_lowercase();
    let document = Html::parse_document(markup);

    let game_element = selector(&format!("#{}", site.game_element_id))?;
    let element = match document.select(&game_element).next() {
        Some(element) => Some(element),
        None => {
            debug!(
                element = %site.game_element_id,
                "Game element not found, searching whole page"
            );
            let with_pgn = selector(&format!("[{pgn_name}]"))?;
            document.select(&with_pgn).next()
        }
    };

    let attr = |name: &str| {
        element
            .and_then(|e| e.value().attr(name))
            .filter(|value| !value.trim().is_empty())
    };

    let pgn = attr(&pgn_name).ok_or_else(|| {
        ScrapeError::Parse(format!("No '{}' attribute in game page", site.pgn_attribute))
    })?;

    Ok(RawGamePayload::new(pgn, attr(&notes_name).map(str::to_string)))
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("Bad selector '{css}': {e}")))
}
