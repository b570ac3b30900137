use crate::url::domain::strip_www;
use crate::UrlError;
use url::Url;

/// Derives the base URL a site crawl starts from
///
/// # Normalization Steps
///
/// 1. Trim the roster value; reject if empty
/// 2. Parse it, assuming `https://` when it has no scheme
///    (rosters often carry bare hosts such as `radio.example.org`)
/// 3. Reject non-HTTP(S) schemes and URLs without a host
/// 4. Force the https scheme when `upgrade_to_https` is set
/// 5. Remove a leading `www.` from the host
/// 6. Normalize the path (dot segments, duplicate and trailing slashes)
/// 7. Drop query and fragment
///
/// # Examples
///
/// ```
/// use station_mail::url::site_base_url;
///
/// let url = site_base_url("http://www.example.org/radio/?lang=fr", true).unwrap();
/// assert_eq!(url.as_str(), "https://example.org/radio");
///
/// let url = site_base_url("example.org", true).unwrap();
/// assert_eq!(url.as_str(), "https://example.org/");
/// ```
pub fn site_base_url(site: &str, upgrade_to_https: bool) -> Result<Url, UrlError> {
    let site = site.trim();
    if site.is_empty() {
        return Err(UrlError::MissingDomain);
    }

    let mut url = match Url::parse(site) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", site))
            .map_err(|e| UrlError::Parse(e.to_string()))?,
        Err(e) => return Err(UrlError::Parse(e.to_string())),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if upgrade_to_https && url.scheme() == "http" {
        url.set_scheme("https")
            .map_err(|_| UrlError::Malformed(format!("Cannot upgrade {} to https", site)))?;
    }

    let host = match url.host_str() {
        Some(host) => strip_www(host).to_string(),
        None => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
///
/// `..` above the root stays at the root, the same way a filesystem
/// resolves `/../page` to `/page`.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            // Empty segments come from repeated slashes
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    format!("/{}", normalized_segments.join("/"))
}
