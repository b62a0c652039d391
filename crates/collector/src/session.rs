use std::sync::Arc;

use pgn_core::IndexMode;

use crate::clients::{FetchPolicy, PageFetcher};
use crate::config::{SessionConfig, SiteConfig};

/// Fetcher plus run settings, shared by the crawler and the pipeline.
/// Cheap to clone.
#[derive(Clone)]
pub struct Session {
    fetcher: Arc<dyn PageFetcher>,
    config: SessionConfig,
}

impl Session {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: SessionConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn fetcher(&self) -> &Arc<dyn PageFetcher> {
        &self.fetcher
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.config.policy
    }

    pub fn site(&self) -> &SiteConfig {
        &self.config.site
    }

    pub fn index_mode(&self) -> IndexMode {
        self.config.index_mode
    }

    pub fn concurrency(&self) -> usize {
        self.config.concurrency.max(1)
    }
}
