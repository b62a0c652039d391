//! chessgames-pgn
//!
//! Downloads a game or a whole collection from chessgames.com and writes the
//! games, with their annotations merged in, to a single PGN file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use collector::{ChessgamesClient, Cli, Crawler, Pipeline, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Cli::parse().into_config()?;
    info!(
        url = %config.source_url,
        output = %config.output.display(),
        index_mode = %config.session.index_mode,
        concurrency = config.session.concurrency,
        "Config loaded"
    );

    let client = ChessgamesClient::new(config.session.site.clone(), &config.session.policy)?;
    let session = Session::new(Arc::new(client), config.session.clone());

    let games = Crawler::new(session.clone()).discover(&config.source_url).await;
    if games.is_empty() {
        bail!("No games found at {}", config.source_url);
    }
    info!(games = games.len(), "Fetching games");

    let file = File::create(&config.output)
        .with_context(|| format!("Failed to create {}", config.output.display()))?;
    let mut out = BufWriter::new(file);

    let report = Pipeline::new(session).run(&games, &mut out).await?;
    out.flush()?;

    info!(
        "Wrote {} games from {} to file {}",
        report.written,
        config.source_url,
        config.output.display()
    );
    if !report.skipped.is_empty() {
        info!(skipped = report.skipped.len(), "Some games were skipped");
    }

    Ok(())
}
