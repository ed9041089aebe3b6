//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients routed through the SOCKS proxy
//! - Host policy checks before any network traffic and on every redirect
//! - Content-Length and Content-Type gating
//! - Capped body reads
//! - Bounded retries with exponential backoff on transport errors

use crate::config::{FetchConfig, ProxyConfig};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::sleeper::{Sleeper, TokioSleeper};
use crate::url::{HostPolicy, PolicyVerdict};
use crate::RippleError;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect;
use reqwest::{Client, Proxy, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Redirect hops followed before a request is abandoned
const MAX_REDIRECTS: usize = 10;

/// Why a URL was not fetched (or its body not read)
///
/// Skips are definitive: they are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Host lacks the required suffix
    NotOnion,
    /// Host is not on the allow-list
    NotAllowed,
    /// URL could not be parsed or has no host
    InvalidUrl,
    /// Declared Content-Length exceeds the read cap
    TooLarge { declared: u64 },
    /// Declared Content-Type is neither text nor HTML
    UnsupportedContent { content_type: String },
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotOnion => "not-onion",
            Self::NotAllowed => "not-allowed",
            Self::InvalidUrl => "invalid-url",
            Self::TooLarge { .. } => "too-large",
            Self::UnsupportedContent { .. } => "unsupported-content",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { declared } => write!(f, "too-large ({} bytes)", declared),
            Self::UnsupportedContent { content_type } => {
                write!(f, "unsupported-content ({})", content_type)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// A response was received and its body read (possibly truncated)
    Success {
        /// HTTP status code, whatever its class
        status: u16,
        /// Content-Type header value
        content_type: Option<String>,
        /// Body bytes, at most `max_content_bytes`
        body: Vec<u8>,
        /// True if the body was cut at the cap
        truncated: bool,
    },

    /// URL excluded by policy or limits
    Skipped { reason: SkipReason },

    /// Every attempt hit a transport error
    Failed { error: RippleError },
}

/// Fetch limits and policies
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub max_content_bytes: usize,
    pub retry: RetryPolicy,
    pub host_policy: HostPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl FetchSettings {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            max_content_bytes: config.max_content_bytes,
            retry: RetryPolicy::new(config.max_retries, config.backoff_base()),
            host_policy: config.host_policy(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// All traffic goes through `proxy` when given. Tests pass `None` to talk
/// to a local mock server directly.
///
/// Redirects are followed only while the target host passes the configured
/// host policy. A redirect that leaves the policy is not followed and the
/// 3xx response itself is returned.
///
/// # Example
///
/// ```no_run
/// use onion_ripple::config::{FetchConfig, ProxyConfig};
/// use onion_ripple::crawler::build_http_client;
///
/// let client = build_http_client(Some(&ProxyConfig::default()), &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    proxy: Option<&ProxyConfig>,
    config: &FetchConfig,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .redirect(redirect_policy(config.host_policy()));

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy.socks_url())?);
    }

    builder.build()
}

/// Follows a redirect only when its target host passes `policy`
fn redirect_policy(policy: HostPolicy) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error(format!("more than {} redirects", MAX_REDIRECTS));
        }

        let verdict = attempt.url().host_str().map(|host| policy.check(host));
        if verdict == Some(PolicyVerdict::Allowed) {
            attempt.follow()
        } else {
            tracing::info!("Not following redirect to {}: host policy", attempt.url());
            attempt.stop()
        }
    })
}

/// Issues GET requests with limits and retries
pub struct Fetcher {
    client: Client,
    settings: FetchSettings,
    sleeper: Arc<dyn Sleeper>,
}

impl Fetcher {
    pub fn new(client: Client, settings: FetchSettings) -> Self {
        Self {
            client,
            settings,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replaces the primitive used to wait between attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Fetches a URL with policy checks, limits and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Host fails policy | Immediate → Skipped |
    /// | Content-Length > cap | Immediate → Skipped(too-large) |
    /// | Non-text Content-Type | Immediate → Skipped |
    /// | Connect error / timeout | Retry, waiting `base * 2^attempt` |
    /// | Retries exhausted | Failed |
    /// | Redirect to a host failing policy | Not followed → Success (3xx recorded) |
    /// | Any HTTP status | Success (status recorded) |
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        if let Some(reason) = self.policy_skip(url) {
            tracing::info!("Skipping {}: {}", url, reason);
            return FetchOutcome::Skipped { reason };
        }

        let retry = self.settings.retry;
        let max_attempts = retry.max_attempts();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            tracing::debug!(attempt, max_attempts, url, "Fetching");

            match self.attempt(url).await {
                Ok(outcome) => {
                    match &outcome {
                        FetchOutcome::Success {
                            status,
                            body,
                            truncated,
                            ..
                        } => tracing::debug!(
                            attempt,
                            url,
                            status,
                            bytes = body.len(),
                            truncated,
                            "Fetched"
                        ),
                        FetchOutcome::Skipped { reason } => {
                            tracing::info!(attempt, url, reason = %reason, "Skipped")
                        }
                        FetchOutcome::Failed { .. } => {}
                    }
                    return outcome;
                }
                Err(e) => {
                    tracing::warn!(attempt, max_attempts, url, error = %e, "Request error");
                    last_error = e.to_string();

                    if let Some(delay) = retry.next_delay(attempt) {
                        tracing::debug!("Backing off {:?} before retrying {}", delay, url);
                        self.sleeper.sleep(delay).await;
                    }
                }
            }
        }

        tracing::warn!("Failed after {} attempt(s): {}", max_attempts, url);
        FetchOutcome::Failed {
            error: RippleError::Transport {
                url: url.to_string(),
                attempts: max_attempts,
                message: last_error,
            },
        }
    }

    /// Checks the URL against the host policy without touching the network
    fn policy_skip(&self, url: &str) -> Option<SkipReason> {
        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => return Some(SkipReason::InvalidUrl),
            },
            Err(_) => return Some(SkipReason::InvalidUrl),
        };

        match self.settings.host_policy.check(&host) {
            PolicyVerdict::Allowed => None,
            PolicyVerdict::SuffixMismatch => Some(SkipReason::NotOnion),
            PolicyVerdict::NotAllowListed => Some(SkipReason::NotAllowed),
        }
    }

    /// One GET; transport errors bubble up for the retry loop
    async fn attempt(&self, url: &str) -> Result<FetchOutcome, reqwest::Error> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let cap = self.settings.max_content_bytes;

        if let Some(declared) = response.content_length() {
            if declared > cap as u64 {
                // Dropping the response aborts the transfer
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::TooLarge { declared },
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if let Some(ct) = &content_type {
            if !is_textual(ct) {
                return Ok(FetchOutcome::Skipped {
                    reason: SkipReason::UnsupportedContent {
                        content_type: ct.clone(),
                    },
                });
            }
        }

        let (body, truncated) = read_capped(&mut response, cap).await?;

        Ok(FetchOutcome::Success {
            status,
            content_type,
            body,
            truncated,
        })
    }
}

/// True for content types worth parsing as a page
fn is_textual(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("text") || ct.contains("html")
}

/// Reads at most `cap` bytes of the body, silently dropping the rest
async fn read_capped(response: &mut Response, cap: usize) -> Result<(Vec<u8>, bool), reqwest::Error> {
    let mut body = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        let remaining = cap - body.len();
        if chunk.len() > remaining {
            body.extend_from_slice(&chunk[..remaining]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }

    Ok((body, false))
}
