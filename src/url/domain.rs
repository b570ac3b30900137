use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host without a leading `www.`, which is the form
/// mail domains are compared against. Returns None if the URL has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use station_mail::url::extract_domain;
///
/// let url = Url::parse("https://www.Example.ORG/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.org".to_string()));
///
/// let url = Url::parse("https://radio.example.org/").unwrap();
/// assert_eq!(extract_domain(&url), Some("radio.example.org".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| strip_www(&h.to_lowercase()).to_string())
}

/// Removes a single leading `www.` label
pub fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Returns true when both URLs point at the same site
///
/// Hosts are compared case-insensitively and without their `www.` prefix;
/// explicit ports must match.
pub fn same_site(candidate: &Url, base: &Url) -> bool {
    match (extract_domain(candidate), extract_domain(base)) {
        (Some(a), Some(b)) => a == b && candidate.port() == base.port(),
        _ => false,
    }
}
