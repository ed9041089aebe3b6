use crate::url::domain::normalize_host;
use std::collections::HashSet;
use url::Url;

/// Which hosts the fetcher is allowed to contact
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HostPolicy {
    /// Every host is allowed
    #[default]
    Any,
    /// Only hosts ending with the suffix (e.g. `.onion`)
    Suffix(String),
    /// Only hosts that are members of the set
    AllowList(HashSet<String>),
}

/// Outcome of checking a host against a [`HostPolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyVerdict {
    Allowed,
    /// Host does not carry the required suffix
    SuffixMismatch,
    /// Host is not on the allow-list
    NotAllowListed,
}

impl HostPolicy {
    /// Builds an allow-list policy, normalizing every host
    pub fn allow_list<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::AllowList(hosts.into_iter().map(|h| normalize_host(h.as_ref())).collect())
    }

    /// Checks a host against this policy
    ///
    /// The host is normalized before comparison.
    pub fn check(&self, host: &str) -> PolicyVerdict {
        let host = normalize_host(host);
        match self {
            Self::Any => PolicyVerdict::Allowed,
            Self::Suffix(suffix) => {
                if host.ends_with(&suffix.to_lowercase()) {
                    PolicyVerdict::Allowed
                } else {
                    PolicyVerdict::SuffixMismatch
                }
            }
            Self::AllowList(hosts) => {
                if hosts.contains(&host) {
                    PolicyVerdict::Allowed
                } else {
                    PolicyVerdict::NotAllowListed
                }
            }
        }
    }
}

/// Returns true if a discovered link should be retained
///
/// A link is kept when its host ends with `suffix`, or when the URL text
/// contains `suffix` immediately followed by a path separator. An empty
/// suffix keeps every link.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use onion_ripple::url::link_matches_suffix;
///
/// let link = Url::parse("http://abc.onion/page").unwrap();
/// assert!(link_matches_suffix(&link, ".onion"));
///
/// let link = Url::parse("https://example.com/page").unwrap();
/// assert!(!link_matches_suffix(&link, ".onion"));
/// ```
pub fn link_matches_suffix(link: &Url, suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }

    let suffix = suffix.to_lowercase();
    let host_matches = link
        .host_str()
        .map(|host| normalize_host(host).ends_with(&suffix))
        .unwrap_or(false);

    host_matches || link.as_str().contains(&format!("{}/", suffix))
}
