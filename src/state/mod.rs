//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: lifecycle of a crawl engine (idle, waiting for the proxy, running, ...)
//! - `CrawlSummary`: counters accumulated over a run

mod engine_state;
mod summary;

// Re-export main types
pub use engine_state::EngineState;
pub use summary::CrawlSummary;
