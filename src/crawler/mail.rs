//! Classification of raw address matches

use crate::url::MEDIA_EXTENSIONS;
use std::collections::BTreeSet;

/// Addresses found for one site, split by confidence
///
/// `unsure_emails` is only ever populated when `domain_emails` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailResult {
    /// Addresses whose mail domain is the site's own domain
    pub domain_emails: BTreeSet<String>,

    /// Other addresses seen on the site, kept as a fallback
    pub unsure_emails: BTreeSet<String>,
}

impl MailResult {
    pub fn is_empty(&self) -> bool {
        self.domain_emails.is_empty() && self.unsure_emails.is_empty()
    }

    pub fn has_domain_emails(&self) -> bool {
        !self.domain_emails.is_empty()
    }
}

/// Returns true if either side of the address ends like a media filename
///
/// Matching addresses over markup picks up names such as `logo@2x.png`.
pub fn is_media_address(email: &str) -> bool {
    email.split('@').any(|part| {
        part.rsplit_once('.')
            .map(|(_, ext)| {
                MEDIA_EXTENSIONS
                    .iter()
                    .any(|media| ext.eq_ignore_ascii_case(media))
            })
            .unwrap_or(false)
    })
}

/// Returns the part after `@`, if any
pub fn mail_domain(email: &str) -> Option<&str> {
    email.rsplit_once('@').map(|(_, domain)| domain)
}

/// Splits raw matches into domain and unsure addresses
///
/// Media-looking matches must already be removed. Unsure addresses are
/// kept only when `save_unsure` is set and no domain address exists, and
/// never more than `max_unsure` of them.
pub fn classify(
    raw_emails: &BTreeSet<String>,
    home_domain: &str,
    save_unsure: bool,
    max_unsure: usize,
) -> MailResult {
    let domain_emails: BTreeSet<String> = raw_emails
        .iter()
        .filter(|email| {
            mail_domain(email)
                .map(|domain| domain.eq_ignore_ascii_case(home_domain))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let unsure_emails = if domain_emails.is_empty() && save_unsure {
        raw_emails.iter().take(max_unsure).cloned().collect()
    } else {
        BTreeSet::new()
    };

    MailResult {
        domain_emails,
        unsure_emails,
    }
}
