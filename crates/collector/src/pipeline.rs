//! Batch pipeline: fetch, merge and write every discovered game.
//!
//! Games are fetched on spawned tasks bounded by a semaphore. Results come
//! back out of order and are buffered until the next game in input order is
//! ready, so the output file always follows the discovery order. A failed
//! write aborts whatever is still fetching.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use pgn_core::AnnotatedGame;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::clients::PageFetcher;
use crate::crawler::GameReference;
use crate::error::ScrapeError;
use crate::session::Session;

const GAME_SEPARATOR: &[u8] = b"\n\n";

/// A game that was left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGame {
    /// 1-based position in the input list
    pub position: usize,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: usize,
    pub skipped: Vec<SkippedGame>,
}

pub struct Pipeline {
    session: Session,
}

impl Pipeline {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Fetch and annotate `games`, writing each success to `out` in input
    /// order. Per-game failures are logged and reported; only write errors
    /// abort the run, and they cancel every fetch still in flight.
    pub async fn run<W: Write>(
        &self,
        games: &[GameReference],
        out: &mut W,
    ) -> Result<BatchReport, ScrapeError> {
        let semaphore = Arc::new(Semaphore::new(self.session.concurrency()));
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for (index, game) in games.iter().enumerate() {
            let semaphore = semaphore.clone();
            let session = self.session.clone();
            let game = game.clone();
            let tx = tx.clone();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = fetch_and_merge(&session, &game).await;
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let report = write_in_order(games, rx, out).await;
        if let Err(e) = &report {
            warn!(error = %e, pending = tasks.len(), "Write failed, cancelling remaining games");
            semaphore.close();
            tasks.abort_all();
        }
        report
    }
}

/// Drain results as they arrive and write them in input order.
async fn write_in_order<W: Write>(
    games: &[GameReference],
    mut rx: mpsc::UnboundedReceiver<(usize, Result<AnnotatedGame, ScrapeError>)>,
    out: &mut W,
) -> Result<BatchReport, ScrapeError> {
    let mut report = BatchReport::default();
    let mut pending = BTreeMap::new();
    let mut next = 0;

    while let Some((index, result)) = rx.recv().await {
        pending.insert(index, result);
        while let Some(result) = pending.remove(&next) {
            record(next, &games[next], result, out, &mut report)?;
            next += 1;
        }
    }

    // A task that died without sending leaves a gap.
    for index in next..games.len() {
        let result = pending.remove(&index).unwrap_or_else(|| {
            Err(ScrapeError::Parse("worker ended without a result".into()))
        });
        record(index, &games[index], result, out, &mut report)?;
    }

    Ok(report)
}

async fn fetch_and_merge(
    session: &Session,
    game: &GameReference,
) -> Result<AnnotatedGame, ScrapeError> {
    let fetcher: &dyn PageFetcher = session.fetcher().as_ref();
    let url = game.url();
    let payload = session
        .policy()
        .run(url, move || fetcher.fetch_game(url))
        .await?;
    Ok(pgn_core::annotate(&payload, session.index_mode())?)
}

fn record<W: Write>(
    index: usize,
    game: &GameReference,
    result: Result<AnnotatedGame, ScrapeError>,
    out: &mut W,
    report: &mut BatchReport,
) -> Result<(), ScrapeError> {
    let position = index + 1;
    match result {
        Ok(annotated) => {
            info!("Writing game {position} - {game}");
            if report.written > 0 {
                out.write_all(GAME_SEPARATOR)?;
            }
            out.write_all(annotated.to_pgn().trim_end().as_bytes())?;
            report.written += 1;
        }
        Err(e) => {
            warn!("Skipping game {position} - Failed to download {game} because {e}");
            report.skipped.push(SkippedGame {
                position,
                url: game.url().to_string(),
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}
