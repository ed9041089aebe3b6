//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and size limits
//! - HTML extraction of titles, snippets and links
//! - The per-seed frontier and randomized request pacing
//! - Overall crawl orchestration

mod engine;
mod extractor;
mod fetcher;
mod frontier;
mod rate_gate;
mod retry;
mod sleeper;

pub use engine::{run_crawl, CrawlEngine};
pub use extractor::{PageExtractor, PageFields, SNIPPET_SENTINEL, TITLE_SENTINEL};
pub use fetcher::{build_http_client, FetchOutcome, FetchSettings, Fetcher, SkipReason};
pub use frontier::Frontier;
pub use rate_gate::{RateGate, MIN_DELAY};
pub use retry::RetryPolicy;
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
