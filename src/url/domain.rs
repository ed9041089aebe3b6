use url::Url;

/// Normalizes a raw host string for domain comparison
///
/// Hosts are lowercased and a single trailing dot (fully-qualified form) is
/// removed, so `ABC.onion.` and `abc.onion` compare equal.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_lowercase()
}

/// Extracts the normalized domain from a URL
///
/// This function retrieves the host portion of a URL and normalizes it with
/// [`normalize_host`]. Ports are not part of the domain.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use onion_ripple::url::extract_domain;
///
/// let url = Url::parse("http://ABC.onion./path").unwrap();
/// assert_eq!(extract_domain(&url), Some("abc.onion".to_string()));
///
/// let url = Url::parse("http://sub.abc.onion:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.abc.onion".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .map(normalize_host)
        .filter(|host| !host.is_empty())
}

/// Returns a copy of the URL without its fragment
pub fn strip_fragment(url: &Url) -> Url {
    let mut stripped = url.clone();
    stripped.set_fragment(None);
    stripped
}
