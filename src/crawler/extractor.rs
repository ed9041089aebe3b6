//! HTML extraction of page titles, snippets and links
//!
//! This module turns a fetched HTML document into:
//! - A title (from the first `<title>` element)
//! - A short snippet of visible text
//! - The outbound links worth following

use crate::config::CrawlerConfig;
use crate::url::{link_matches_suffix, strip_fragment};
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Title used when a page has no usable `<title>`
pub const TITLE_SENTINEL: &str = "[No Title]";

/// Snippet used when no candidate element has enough visible text
pub const SNIPPET_SENTINEL: &str = "[No visible text found]";

/// Elements whose text is never shown to a reader
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Fields extracted from one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFields {
    pub title: String,
    pub snippet: String,
    /// Absolute, fragment-free, deduplicated in first-seen order
    pub links: Vec<String>,
}

/// Extracts titles, snippets and links from HTML
///
/// Extraction is pure: the same base URL and document always produce the
/// same fields.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    title_selector: Selector,
    snippet_selector: Selector,
    link_selector: Selector,
    min_chars: usize,
    max_chars: usize,
    link_suffix: String,
}

impl PageExtractor {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `snippet_tags` - Element names scanned for the snippet
    /// * `min_chars` - Candidates need strictly more characters than this
    /// * `max_chars` - Snippets are cut to this many characters
    /// * `link_suffix` - Suffix filter for discovered links (empty keeps all)
    ///
    /// # Returns
    ///
    /// * `Ok(PageExtractor)` - Ready to use
    /// * `Err(ConfigError)` - A tag name is not a valid selector
    pub fn new<S: AsRef<str>>(
        snippet_tags: &[S],
        min_chars: usize,
        max_chars: usize,
        link_suffix: &str,
    ) -> ConfigResult<Self> {
        let tags = snippet_tags
            .iter()
            .map(|t| t.as_ref().trim())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            title_selector: parse_selector("title")?,
            snippet_selector: parse_selector(&tags)?,
            link_selector: parse_selector("a[href], area[href]")?,
            min_chars,
            max_chars,
            link_suffix: link_suffix.to_string(),
        })
    }

    pub fn from_config(config: &CrawlerConfig) -> ConfigResult<Self> {
        Self::new(
            &config.snippet_tags,
            config.snippet_min_chars,
            config.snippet_max_chars,
            &config.link_suffix_filter,
        )
    }

    /// Extracts all fields from `html`, resolving links against `base_url`
    ///
    /// # Example
    ///
    /// ```
    /// use onion_ripple::crawler::PageExtractor;
    /// use url::Url;
    ///
    /// let extractor = PageExtractor::new(&["p"], 5, 400, ".onion").unwrap();
    /// let base = Url::parse("http://abc.onion/").unwrap();
    /// let html = r#"<title>Hi</title><p>Hello there, reader.</p><a href="/next">n</a>"#;
    ///
    /// let fields = extractor.extract(&base, html);
    /// assert_eq!(fields.title, "Hi");
    /// assert_eq!(fields.snippet, "Hello there, reader.");
    /// assert_eq!(fields.links, vec!["http://abc.onion/next"]);
    /// ```
    pub fn extract(&self, base_url: &Url, html: &str) -> PageFields {
        let document = Html::parse_document(html);

        PageFields {
            title: self.extract_title(&document),
            snippet: self.extract_snippet(&document),
            links: self.extract_links(&document, base_url),
        }
    }

    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&self.title_selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| TITLE_SENTINEL.to_string())
    }

    /// First candidate whose visible text is longer than the threshold
    fn extract_snippet(&self, document: &Html) -> String {
        for element in document.select(&self.snippet_selector) {
            let text = visible_text(element);
            if text.chars().count() > self.min_chars {
                return text.chars().take(self.max_chars).collect();
            }
        }

        SNIPPET_SENTINEL.to_string()
    }

    fn extract_links(&self, document: &Html, base_url: &Url) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(resolved) = resolve_link(href, base_url) else {
                continue;
            };
            if !link_matches_suffix(&resolved, &self.link_suffix) {
                continue;
            }

            let link = resolved.to_string();
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }

        links
    }
}

fn parse_selector(selectors: &str) -> ConfigResult<Selector> {
    Selector::parse(selectors)
        .map_err(|e| ConfigError::Validation(format!("invalid selector {:?}: {:?}", selectors, e)))
}

/// Resolves a link href to an absolute, fragment-free URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(strip_fragment(&absolute)),
        _ => None,
    }
}

/// Text of `element` a reader would see, whitespace collapsed
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_visible(element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_visible(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if HIDDEN_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_visible(child, out);
                }
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
