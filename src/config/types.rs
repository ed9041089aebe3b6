use crate::url::HostPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Onion-Ripple
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub control: Option<ControlConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// SOCKS proxy endpoint and the startup readiness probe
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub host: String,

    pub port: u16,

    /// Overall time to wait for the proxy at startup (seconds)
    #[serde(rename = "wait-timeout")]
    pub wait_timeout: u64,

    /// Interval between connectivity probes (seconds)
    #[serde(rename = "poll-interval")]
    pub poll_interval: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9050,
            wait_timeout: 90,
            poll_interval: 2,
        }
    }
}

impl ProxyConfig {
    /// `host:port` of the proxy
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy URL handed to the HTTP client
    ///
    /// `socks5h` makes the proxy resolve host names, which onion
    /// addresses require.
    pub fn socks_url(&self) -> String {
        format!("socks5h://{}", self.address())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }
}

/// Tor control port used for identity rotation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlConfig {
    pub host: String,

    pub port: u16,

    /// Control port password; when absent the auth cookie or null auth is
    /// used, whichever the control port advertises
    pub password: Option<String>,

    /// Rotate identity after this many fetched pages (0 disables)
    #[serde(rename = "rotate-after-requests")]
    pub rotate_after_requests: u64,

    /// Pause after a rotation so the new circuit can settle (seconds)
    #[serde(rename = "settle-time")]
    pub settle_time: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9051,
            password: None,
            rotate_after_requests: 50,
            settle_time: 10,
        }
    }
}

impl ControlConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_secs(self.settle_time)
    }
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-attempt request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Total attempts per URL
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Largest body read; larger declared bodies are skipped
    #[serde(rename = "max-content-bytes")]
    pub max_content_bytes: usize,

    /// Backoff unit: attempt N waits `backoff-base * 2^N` seconds
    #[serde(rename = "backoff-base")]
    pub backoff_base: f64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Only fetch hosts ending with this suffix
    #[serde(rename = "host-suffix")]
    pub host_suffix: Option<String>,

    /// Only fetch these hosts
    #[serde(rename = "allow-list")]
    pub allow_list: Option<Vec<String>>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: 30,
            max_retries: 3,
            max_content_bytes: 200 * 1024,
            backoff_base: 1.0,
            user_agent: "Mozilla/5.0 (compatible; OnionRipple/0.1)".to_string(),
            host_suffix: Some(".onion".to_string()),
            allow_list: None,
        }
    }
}

impl FetchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base)
    }

    /// Resolves the configured host policy
    ///
    /// An `allow-list` takes precedence over `host-suffix`; an empty suffix
    /// with no allow-list disables the check.
    pub fn host_policy(&self) -> HostPolicy {
        match (&self.allow_list, &self.host_suffix) {
            (Some(hosts), _) => HostPolicy::allow_list(hosts),
            (None, Some(suffix)) if !suffix.is_empty() => HostPolicy::Suffix(suffix.clone()),
            _ => HostPolicy::Any,
        }
    }
}

/// Randomized delay between requests
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Base delay (seconds)
    pub base: f64,

    /// Maximum deviation from the base in either direction (seconds)
    pub jitter: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base: 5.0,
            jitter: 3.0,
        }
    }
}

/// Traversal and extraction behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlerConfig {
    /// Maximum pages visited per seed domain, failures included
    #[serde(rename = "max-pages-per-domain", default = "default_max_pages")]
    pub max_pages_per_domain: usize,

    /// Discovered links are kept only when they match this suffix
    #[serde(rename = "link-suffix-filter", default = "default_link_suffix")]
    pub link_suffix_filter: String,

    /// Elements considered for the page snippet, in document order
    #[serde(rename = "snippet-tags", default = "default_snippet_tags")]
    pub snippet_tags: Vec<String>,

    /// Snippet candidates must have strictly more characters than this
    #[serde(rename = "snippet-min-chars", default = "default_snippet_min")]
    pub snippet_min_chars: usize,

    /// Snippets are truncated to this many characters
    #[serde(rename = "snippet-max-chars", default = "default_snippet_max")]
    pub snippet_max_chars: usize,

    /// Seed URLs, crawled in order
    pub seeds: Vec<String>,
}

fn default_max_pages() -> usize {
    20
}

fn default_link_suffix() -> String {
    ".onion".to_string()
}

pub(crate) fn default_snippet_tags() -> Vec<String> {
    ["p", "div", "article", "section", "span", "h1", "h2", "h3", "h4", "h5", "h6"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_snippet_min() -> usize {
    50
}

fn default_snippet_max() -> usize {
    400
}

impl CrawlerConfig {
    /// Crawler settings with defaults for everything but the seeds
    pub fn with_seeds(seeds: Vec<String>) -> Self {
        Self {
            max_pages_per_domain: default_max_pages(),
            link_suffix_filter: default_link_suffix(),
            snippet_tags: default_snippet_tags(),
            snippet_min_chars: default_snippet_min(),
            snippet_max_chars: default_snippet_max(),
            seeds,
        }
    }
}

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    Jsonl,
    /// `pages` table in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Path to the JSON-lines file or SQLite database
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jsonl,
            path: "data/crawler_data.jsonl".to_string(),
        }
    }
}
