#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use collector::{FetchPolicy, PageFetcher, ScrapeError, Session, SessionConfig};
use pgn_core::RawGamePayload;

pub const BASE_URL: &str = "https://www.chessgames.com";

/// Canned answer for one URL.
#[derive(Clone, Debug)]
pub enum Response {
    Listing(String),
    Game(RawGamePayload),
    /// Always a network failure.
    Fail,
    /// Network failure for the first `n` attempts, then the inner response.
    FailTimes(usize, Box<Response>),
    /// The inner response after a delay.
    Slow(Duration, Box<Response>),
}

/// In-memory `PageFetcher` that records every request. Unknown URLs fail
/// like a 404.
#[derive(Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, response: Response) -> Self {
        self.responses.insert(url.into(), response);
        self
    }

    pub fn with_game(self, gid: u32, pgn: &str, notes: Option<&str>) -> Self {
        let payload = RawGamePayload::new(pgn, notes.map(str::to_string));
        self.with(game_url(gid), Response::Game(payload))
    }

    /// Every requested URL, in request order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn attempts(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| *c == url).count()
    }

    async fn respond(&self, url: &str) -> Result<Response, ScrapeError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.iter().filter(|c| *c == url).count()
        };

        let mut response = self
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::Network(format!("HTTP 404 Not Found for {url}")))?;

        loop {
            response = match response {
                Response::Fail => {
                    return Err(ScrapeError::Network(format!("connection refused for {url}")))
                }
                Response::FailTimes(n, inner) => {
                    if attempt <= n {
                        return Err(ScrapeError::Network(format!("connection reset for {url}")));
                    }
                    *inner
                }
                Response::Slow(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    *inner
                }
                other => return Ok(other),
            };
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_game(&self, url: &str) -> Result<RawGamePayload, ScrapeError> {
        match self.respond(url).await? {
            Response::Game(payload) => Ok(payload),
            _ => Err(ScrapeError::Parse(format!("No 'pgn' attribute in game page {url}"))),
        }
    }

    async fn fetch_listing_page(&self, url: &str) -> Result<String, ScrapeError> {
        match self.respond(url).await? {
            Response::Listing(markup) => Ok(markup),
            _ => Err(ScrapeError::Parse(format!("Not a listing page: {url}"))),
        }
    }
}

pub fn game_url(gid: u32) -> String {
    format!("{BASE_URL}/perl/chessgame?gid={gid}")
}

pub fn collection_url(cid: u32) -> String {
    format!("{BASE_URL}/perl/chesscollection?cid={cid}")
}

/// Listing markup in the site's layout; `pages` of 1 leaves the pager out.
pub fn listing_markup(page: usize, pages: usize, gids: &[u32]) -> String {
    let mut markup = String::from("<html><body>\n");
    if pages > 1 {
        markup.push_str(&format!(
            "<td>page {page} of {pages}; games {}-{}</td>\n",
            (page - 1) * 25 + 1,
            (page - 1) * 25 + gids.len()
        ));
    }
    for gid in gids {
        markup.push_str(&format!(
            "<tr><td><a href=\"/perl/chessgame?gid={gid}\">game {gid}</a></td></tr>\n"
        ));
    }
    markup.push_str("</body></html>");
    markup
}

pub fn simple_pgn(event: &str) -> String {
    format!("[Event \"{event}\"]\n[Result \"1-0\"]\n\n1.e4 e5 2.Nf3 Nc6 3.Bb5 a6 1-0")
}

/// Session over `fetcher` with no request delay and a short timeout.
pub fn session(fetcher: Arc<FakeFetcher>, retries: u32, concurrency: usize) -> Session {
    let config = SessionConfig {
        policy: FetchPolicy {
            timeout: Duration::from_millis(250),
            retries,
            request_delay: Duration::ZERO,
        },
        concurrency,
        ..SessionConfig::default()
    };
    Session::new(fetcher, config)
}
