//! Domain-based source credibility classification.

use crate::model::Credibility;

const HIGH_DOMAINS: &[&str] = &[
    // Government and public-health authorities
    "gov",
    "gov.in",
    "nic.in",
    "gov.uk",
    "europa.eu",
    "who.int",
    // Wire services and established outlets
    "reuters.com",
    "apnews.com",
    "bbc.co.uk",
    "bbc.com",
    "thehindu.com",
    "indianexpress.com",
    "ndtv.com",
    "ptinews.com",
    "aninews.in",
    // Fact-checkers
    "factcheck.org",
    "snopes.com",
    "politifact.com",
    "fullfact.org",
    "altnews.in",
    "boomlive.in",
    "vishvasnews.com",
];

const LOW_DOMAINS: &[&str] = &[
    "blogspot.com",
    "wordpress.com",
    "medium.com",
    "substack.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "reddit.com",
    "tiktok.com",
    "instagram.com",
    "whatsapp.com",
    "t.me",
];

/// Host label that marks a source as low credibility wherever it appears.
const LOW_LABELS: &[&str] = &["blog"];

/// Static table mapping hosts to a [`Credibility`] tier.
///
/// A domain `d` matches host `h` when `h == d` or `h` ends with `.d`, so `gov`
/// covers every `*.gov` host and `reuters.com` covers `www.reuters.com`.
#[derive(Debug, Clone)]
pub struct CredibilityTable {
    high: Vec<String>,
    low: Vec<String>,
    low_labels: Vec<String>,
}

impl Default for CredibilityTable {
    fn default() -> Self {
        Self::new(HIGH_DOMAINS, LOW_DOMAINS)
    }
}

impl CredibilityTable {
    pub fn new(high: &[&str], low: &[&str]) -> Self {
        Self {
            high: high.iter().map(|d| d.to_lowercase()).collect(),
            low: low.iter().map(|d| d.to_lowercase()).collect(),
            low_labels: LOW_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// High-credibility entries win over low ones; unmatched hosts are medium.
    pub fn classify(&self, host: &str) -> Credibility {
        let host = host.trim_end_matches('.').to_lowercase();

        if self.high.iter().any(|d| domain_matches(&host, d)) {
            return Credibility::High;
        }

        if self.low.iter().any(|d| domain_matches(&host, d))
            || host
                .split('.')
                .any(|label| self.low_labels.iter().any(|l| l == label))
        {
            return Credibility::Low;
        }

        Credibility::Medium
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// Extracts the lowercase host of `url`.
///
/// Falls back to the segment after `scheme://` when the URL does not parse.
pub fn host_of(url: &str) -> Option<String> {
    if let Ok(parsed) = reqwest::Url::parse(url)
        && let Some(host) = parsed.host_str()
    {
        return Some(host.to_lowercase());
    }

    url.split('/')
        .nth(2)
        .map(|h| h.split(':').next().unwrap_or(h).to_lowercase())
        .filter(|h| !h.is_empty())
}
