//! URL handling module for Station-Mail
//!
//! This module derives a site's base URL, extracts and compares domains, and
//! resolves raw hyperlinks found on a page into same-site URLs worth fetching.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_site, strip_www};
pub use normalize::{normalize_path, site_base_url};

use std::fmt;
use std::path::Path;
use url::Url;

/// Extensions that never carry text worth scanning for addresses
pub const MEDIA_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "mp3", "mp4"];

/// A link that survived resolution: same site, navigable, HTTP(S)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedUrl(Url);

impl ResolvedUrl {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for ResolvedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Returns true if the last path segment has a media extension
///
/// The comparison is case-insensitive.
pub fn is_media_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|media| ext.eq_ignore_ascii_case(media))
        })
        .unwrap_or(false)
}

/// Resolves a raw hyperlink relative to a site's base URL
///
/// # Resolution Rules
///
/// 1. Links to media files (see [`MEDIA_EXTENSIONS`]) are rejected
/// 2. Absolute links are kept as-is when they point at the base site over
///    HTTP(S); any other host or scheme is rejected
/// 3. Schemes without a host (`mailto:`, `tel:`, `javascript:`, `data:`)
///    are not navigable and are rejected
/// 4. Relative links are joined to the base path, dot segments are removed,
///    and query and fragment are dropped
///
/// Malformed input resolves to `None`; this function never fails.
///
/// # Examples
///
/// ```
/// use station_mail::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.org/").unwrap();
///
/// let about = resolve_link("/team/../about?ref=nav#top", &base).unwrap();
/// assert_eq!(about.as_str(), "https://example.org/about");
///
/// assert!(resolve_link("https://elsewhere.net/contact", &base).is_none());
/// assert!(resolve_link("/img/logo.PNG", &base).is_none());
/// ```
pub fn resolve_link(raw: &str, base: &Url) -> Option<ResolvedUrl> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match Url::parse(raw) {
        Ok(url) => resolve_absolute(url, base),
        Err(url::ParseError::RelativeUrlWithoutBase) => resolve_relative(raw, base),
        Err(_) => None,
    }
}

fn resolve_absolute(url: Url, base: &Url) -> Option<ResolvedUrl> {
    if is_media_path(url.path()) {
        return None;
    }

    url.host_str()?;

    if !same_site(&url, base) {
        return None;
    }

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    Some(ResolvedUrl(url))
}

fn resolve_relative(raw: &str, base: &Url) -> Option<ResolvedUrl> {
    // Protocol-relative links carry their own host
    if raw.starts_with("//") {
        let url = Url::parse(&format!("{}:{}", base.scheme(), raw)).ok()?;
        return resolve_absolute(url, base);
    }

    let without_fragment = raw.split('#').next().unwrap_or_default();
    let path = without_fragment.split('?').next().unwrap_or_default();

    if is_media_path(path) {
        return None;
    }

    let joined = if path.starts_with('/') {
        path.to_string()
    } else if path.is_empty() {
        base.path().to_string()
    } else {
        format!("{}/{}", base.path().trim_end_matches('/'), path)
    };

    let mut url = base.clone();
    url.set_path(&normalize_path(&joined));
    url.set_query(None);
    url.set_fragment(None);

    Some(ResolvedUrl(url))
}
