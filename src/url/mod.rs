//! URL handling module for Onion-Ripple
//!
//! This module provides host normalization, crawl target construction,
//! the fetch host policy and the outbound link suffix filter.

mod domain;
mod policy;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, normalize_host, strip_fragment};
pub use policy::{link_matches_suffix, HostPolicy, PolicyVerdict};

/// A URL scheduled or eligible for crawling, paired with its domain
///
/// The URL is stored without its fragment. Two targets belong to the same
/// domain iff their `domain` strings are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    /// Fragment-stripped absolute URL
    pub url: String,

    /// Normalized host (lowercase, no trailing dot)
    pub domain: String,
}

impl CrawlTarget {
    /// Builds a target from an already parsed URL
    ///
    /// Only `http` and `https` URLs with a host are accepted.
    pub fn from_url(url: &Url) -> UrlResult<Self> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        let domain = extract_domain(url).ok_or(UrlError::MissingHost)?;

        Ok(Self {
            url: strip_fragment(url).to_string(),
            domain,
        })
    }

    /// Parses a URL string into a target
    ///
    /// # Examples
    ///
    /// ```
    /// use onion_ripple::url::CrawlTarget;
    ///
    /// let target = CrawlTarget::parse("http://ABC.onion/page#top").unwrap();
    /// assert_eq!(target.url, "http://abc.onion/page");
    /// assert_eq!(target.domain, "abc.onion");
    /// ```
    pub fn parse(raw: &str) -> UrlResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
        Self::from_url(&url)
    }
}
