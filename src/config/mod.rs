//! Configuration module for Onion-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section except `[crawler]` may be omitted; missing keys fall back to
//! built-in defaults (Tor on 127.0.0.1:9050, 5s +/- 3s between requests,
//! 200 KB bodies, 3 attempts).
//!
//! # Example
//!
//! ```no_run
//! use onion_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Pages per domain: {}", config.crawler.max_pages_per_domain);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ControlConfig, CrawlerConfig, FetchConfig, OutputConfig, OutputFormat, ProxyConfig,
    RateLimitConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
