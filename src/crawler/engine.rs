//! Crawl engine - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Waiting for the SOCKS proxy before any request
//! - Per-seed frontiers with a page cap
//! - Fetching, extraction and storage of each page
//! - Identity rotation every N fetches
//! - Randomized delays between requests

use crate::config::Config;
use crate::crawler::extractor::PageExtractor;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, FetchSettings, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::rate_gate::RateGate;
use crate::crawler::sleeper::{Sleeper, TokioSleeper};
use crate::proxy::{wait_for_proxy, IdentityRotator, TorControl};
use crate::state::{CrawlSummary, EngineState};
use crate::storage::{open_store, PageRecord, Store};
use crate::url::CrawlTarget;
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// Runs a crawl over every configured seed
///
/// Holds all per-run state; nothing is global. Seeds are crawled one after
/// another, each with its own [`Frontier`], and the pages of one seed are
/// visited breadth-first.
pub struct CrawlEngine {
    config: Config,
    fetcher: Fetcher,
    extractor: PageExtractor,
    store: Box<dyn Store>,
    rotator: Option<Box<dyn IdentityRotator>>,
    rate_gate: RateGate,
    sleeper: Arc<dyn Sleeper>,
    state: EngineState,
    /// Fetches across all seeds, drives identity rotation
    fetch_count: u64,
}

impl CrawlEngine {
    /// Creates an engine wired for production use
    ///
    /// # Arguments
    ///
    /// * `config` - A validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlEngine)` - Client, store and rotator are ready
    /// * `Err(RippleError)` - The client or store could not be created
    pub fn new(config: Config) -> Result<Self> {
        let client = build_http_client(Some(&config.proxy), &config.fetch)?;
        let fetcher = Fetcher::new(client, FetchSettings::from_config(&config.fetch));
        let store = open_store(&config.output)?;
        let rotator = config
            .control
            .as_ref()
            .map(|control| Box::new(TorControl::from_config(control)) as Box<dyn IdentityRotator>);

        Self::with_parts(config, fetcher, store, rotator)
    }

    /// Creates an engine from explicit collaborators
    pub fn with_parts(
        config: Config,
        fetcher: Fetcher,
        store: Box<dyn Store>,
        rotator: Option<Box<dyn IdentityRotator>>,
    ) -> Result<Self> {
        let extractor = PageExtractor::from_config(&config.crawler)?;
        let rate_gate = RateGate::new(config.rate_limit.base, config.rate_limit.jitter);

        Ok(Self {
            config,
            fetcher,
            extractor,
            store,
            rotator,
            rate_gate,
            sleeper: Arc::new(TokioSleeper),
            state: EngineState::Idle,
            fetch_count: 0,
        })
    }

    /// Uses `sleeper` for every wait: rate gate, settle time and retry backoff
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.fetcher = self.fetcher.with_sleeper(Arc::clone(&sleeper));
        self.sleeper = sleeper;
        self
    }

    pub fn with_rate_gate(mut self, rate_gate: RateGate) -> Self {
        self.rate_gate = rate_gate;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    fn transition(&mut self, next: EngineState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!("Unexpected engine transition {} -> {}", self.state, next);
        }
        tracing::debug!("Engine state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Runs the crawl to completion
    ///
    /// This is the core crawling logic that:
    /// 1. Waits for the proxy (fatal on timeout)
    /// 2. Crawls each seed in order until its frontier is drained or capped
    /// 3. Returns the counters collected along the way
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        self.transition(EngineState::WaitingForProxy);

        let proxy = &self.config.proxy;
        let ready =
            wait_for_proxy(&proxy.address(), proxy.poll_interval(), proxy.wait_timeout()).await;
        if let Err(e) = ready {
            self.transition(EngineState::Failed);
            return Err(e);
        }

        self.transition(EngineState::Running);
        tracing::info!(
            "Starting crawl of {} seed(s), up to {} page(s) each",
            self.config.crawler.seeds.len(),
            self.config.crawler.max_pages_per_domain
        );

        let mut summary = CrawlSummary::new();
        let seeds = self.config.crawler.seeds.clone();

        for seed in &seeds {
            match CrawlTarget::parse(seed) {
                Ok(target) => self.crawl_seed(target, &mut summary).await,
                Err(e) => tracing::warn!("Skipping seed {}: {}", seed, e),
            }
        }

        self.transition(EngineState::Finished);
        tracing::info!(
            "Crawl finished: {} attempted, {} stored, {} skipped, {} failed, {} rotation(s)",
            summary.pages_attempted,
            summary.pages_stored,
            summary.pages_skipped,
            summary.pages_failed,
            summary.rotations
        );

        Ok(summary)
    }

    /// Crawls one seed domain until its frontier has no more work
    async fn crawl_seed(&mut self, seed: CrawlTarget, summary: &mut CrawlSummary) {
        tracing::info!("Crawling seed {}", seed.url);
        let mut frontier = Frontier::seed(seed, self.config.crawler.max_pages_per_domain);

        while frontier.has_work() {
            let Some(target) = frontier.take_next() else {
                break;
            };

            if frontier.is_visited(&target.url) {
                continue;
            }
            if !frontier.record_visit(&target.url) {
                break;
            }
            summary.record_visit(&target.domain);

            match self.fetcher.fetch(&target.url).await {
                FetchOutcome::Success { status, body, .. } => {
                    self.process_page(&target, status, &body, &mut frontier, summary);
                }
                FetchOutcome::Skipped { reason } => {
                    tracing::warn!("Skipped {}: {}", target.url, reason);
                    summary.pages_skipped += 1;
                }
                FetchOutcome::Failed { error } => {
                    tracing::warn!("Failed {}: {}", target.url, error);
                    summary.pages_failed += 1;
                }
            }

            self.after_fetch(summary).await;
        }

        tracing::info!(
            "Finished {}: {} of at most {} page(s) visited, {} left pending",
            frontier.domain(),
            frontier.visited_count(),
            frontier.cap(),
            frontier.pending_count()
        );
    }

    /// Extracts, stores and follows one fetched page
    fn process_page(
        &mut self,
        target: &CrawlTarget,
        status: u16,
        body: &[u8],
        frontier: &mut Frontier,
        summary: &mut CrawlSummary,
    ) {
        let base_url = match Url::parse(&target.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot parse fetched URL {}: {}", target.url, e);
                return;
            }
        };

        let html = String::from_utf8_lossy(body);
        let fields = self.extractor.extract(&base_url, &html);

        let record = PageRecord {
            url: target.url.clone(),
            status: Some(status),
            title: Some(fields.title),
            snippet: Some(fields.snippet),
            links: fields.links,
            fetched_at: Utc::now(),
        };

        match self.store.append(&record) {
            Ok(()) => {
                summary.pages_stored += 1;
                tracing::info!(
                    "Stored {} ({}, {} link(s))",
                    record.url,
                    status,
                    record.links.len()
                );
            }
            Err(e) => {
                summary.store_errors += 1;
                tracing::warn!("Failed to store {}: {}", record.url, e);
            }
        }

        let mut queued = 0;
        for link in &record.links {
            match CrawlTarget::parse(link) {
                Ok(discovered) => {
                    if frontier.offer(discovered) {
                        queued += 1;
                    }
                }
                Err(e) => tracing::debug!("Ignoring link {}: {}", link, e),
            }
        }
        tracing::debug!("Queued {} new URL(s) from {}", queued, record.url);
    }

    /// Rotation and politeness delay after every fetch
    async fn after_fetch(&mut self, summary: &mut CrawlSummary) {
        self.fetch_count += 1;

        if let Some(control) = &self.config.control {
            let every = control.rotate_after_requests;
            if every > 0 && self.fetch_count % every == 0 {
                if let Some(rotator) = &self.rotator {
                    tracing::info!("Requesting new identity after {} fetches", self.fetch_count);
                    match rotator.rotate().await {
                        Ok(()) => summary.rotations += 1,
                        Err(e) => tracing::warn!("Identity rotation failed: {}", e),
                    }
                    self.sleeper.sleep(control.settle_time()).await;
                }
            }
        }

        let delay = self.rate_gate.next_delay();
        tracing::debug!("Waiting {:?} before next request", delay);
        self.sleeper.sleep(delay).await;
    }
}

/// Runs a complete crawl with production wiring
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(RippleError)` - Setup failed or the proxy never came up
pub async fn run_crawl(config: Config) -> Result<CrawlSummary> {
    let mut engine = CrawlEngine::new(config)?;
    engine.run().await
}
