//! Collection crawling: turns a listing URL into the ordered, de-duplicated
//! list of game pages it links to.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::clients::PageFetcher;
use crate::error::ScrapeError;
use crate::session::Session;

/// Collection pager, e.g. "page 1 of 3; games 1-25 of 61".
static PAGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"page\s+(\d+)\s+of\s+(\d+);\s*games").unwrap());

/// Upper bound on listing pages read from one collection.
pub const MAX_PAGES: usize = 200;

static PAGE_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[?&]page=\d+").unwrap());

static GAME_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/perl/chessgame\?gid=\d{4,}").unwrap());

/// Canonical URL of a single game page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameReference(String);

impl GameReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Game,
    Collection,
    /// Anything else; crawled like a collection.
    Other,
}

pub fn classify_source(url: &str) -> SourceKind {
    if url.contains("/chessgame?") {
        SourceKind::Game
    } else if url.contains("/chesscollection?") {
        SourceKind::Collection
    } else {
        SourceKind::Other
    }
}

/// `M` from the "page N of M; games" pager in listing markup. Missing,
/// unparsable or zero counts mean a single page; larger counts are capped at
/// [`MAX_PAGES`].
pub fn page_count(markup: &str) -> usize {
    pager_value(markup, 2)
        .filter(|&n| n > 0)
        .map_or(1, |n| n.min(MAX_PAGES))
}

/// `N` from "page N of M", when it names one of the listing's pages.
pub fn current_page(markup: &str) -> Option<usize> {
    pager_value(markup, 1).filter(|&n| n > 0 && n <= page_count(markup))
}

fn pager_value(markup: &str, group: usize) -> Option<usize> {
    PAGER_RE.captures(markup)?.get(group)?.as_str().parse().ok()
}

/// Drop every `page=N` query parameter, keeping the rest of the query intact.
pub fn strip_page_param(url: &str) -> String {
    let mut stripped = PAGE_PARAM_RE.replace_all(url, "").into_owned();
    if !stripped.contains('?') {
        if let Some(pos) = stripped.find('&') {
            stripped.replace_range(pos..pos + 1, "?");
        }
    }
    stripped
}

pub fn page_url(base: &str, page: usize) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}page={page}")
}

/// Game links on a listing page, absolute, in page order.
pub fn extract_game_links(markup: &str, base_url: &str) -> Vec<GameReference> {
    let base = base_url.trim_end_matches('/');
    GAME_LINK_RE
        .find_iter(markup)
        .map(|m| GameReference::new(format!("{base}{}", m.as_str())))
        .collect()
}

/// Remove repeats, keeping the first occurrence of each URL.
pub fn dedup_games(games: Vec<GameReference>) -> Vec<GameReference> {
    let mut seen = HashSet::with_capacity(games.len());
    games
        .into_iter()
        .filter(|game| seen.insert(game.url().to_string()))
        .collect()
}

pub struct Crawler {
    session: Session,
}

impl Crawler {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Resolve `url` into game references. A game URL is returned as is;
    /// anything else is crawled as a collection.
    pub async fn discover(&self, url: &str) -> Vec<GameReference> {
        match classify_source(url) {
            SourceKind::Game => vec![GameReference::new(url)],
            SourceKind::Collection => self.crawl_collection(url).await,
            SourceKind::Other => {
                info!(url, "Not a chess collection, but still searching endpoint for chessgames");
                self.crawl_collection(url).await
            }
        }
    }

    /// Fetch the listing, work out how many pages it has and gather the game
    /// links from every page. The listing itself stands in for the page it
    /// reports being; pages that fail are skipped.
    pub async fn crawl_collection(&self, url: &str) -> Vec<GameReference> {
        let first = match self.fetch_page(url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, error = %e, "Failed to fetch game collection");
                return Vec::new();
            }
        };

        let pages = page_count(&first);
        if pages == MAX_PAGES {
            warn!(url, pages, "Page count capped, later listing pages are not read");
        }
        let current = current_page(&first);
        let base_url = &self.session.site().base_url;

        let links = if pages <= 1 {
            info!(url, "Reading single page");
            extract_game_links(&first, base_url)
        } else {
            let base = strip_page_param(url);
            info!(url = %base, pages, "Reading paginated collection");

            let results: Vec<(String, Result<String, ScrapeError>)> = stream::iter(1..=pages)
                .map(|page| {
                    let target = page_url(&base, page);
                    let known = (current == Some(page)).then(|| first.clone());
                    async move {
                        let result = match known {
                            Some(body) => Ok(body),
                            None => self.fetch_page(&target).await,
                        };
                        (target, result)
                    }
                })
                .buffered(self.session.concurrency())
                .collect()
                .await;

            let mut links = Vec::new();
            for (target, result) in results {
                match result {
                    Ok(body) => {
                        let found = extract_game_links(&body, base_url);
                        debug!(url = %target, games = found.len(), "Read listing page");
                        links.extend(found);
                    }
                    Err(e) => {
                        warn!(url = %target, error = %e, "Had error getting page, but continuing");
                    }
                }
            }
            links
        };

        let total = links.len();
        let games = dedup_games(links);
        info!(url, found = total, unique = games.len(), "Collected game links");
        games
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let fetcher: &dyn PageFetcher = self.session.fetcher().as_ref();
        self.session
            .policy()
            .run(url, move || fetcher.fetch_listing_page(url))
            .await
    }
}
