//! DuckDuckGo web search client.
//!
//! Scrapes the HTML results page (`html.duckduckgo.com/html/`), which returns
//! ordinary web results. The Instant Answer JSON API only carries topic and
//! encyclopedia links, so it finds nothing for most "claim + fact check" queries.
//! The HTML markup is not a stable API: when DuckDuckGo changes it, searches
//! return zero hits and claims degrade to the no-evidence path.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::error::{ProviderError, ProviderResult};
use super::{SearchHit, SearchProvider};

const ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("claimguard/", env!("CARGO_PKG_VERSION"));

const RESULT_SELECTOR: &str = "div.result";
const TITLE_SELECTOR: &str = "a.result__a";
const SNIPPET_SELECTOR: &str = ".result__snippet";
const AD_CLASS: &str = "result--ad";

/// Search provider backed by DuckDuckGo's HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    http: HttpClient,
    endpoint: String,
    region: String,
}

impl DuckDuckGoSearch {
    /// Creates a client for `region` (DuckDuckGo `kl` code, e.g. `wt-wt`, `in-en`).
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            http: HttpClient::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| HttpClient::new()),
            endpoint: ENDPOINT.to_string(),
            region: region.into(),
        }
    }

    /// Overrides the results endpoint (used against local fixtures).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> ProviderResult<Vec<SearchHit>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query), ("kl", self.region.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let mut hits = parse_results_page(&body)?;
        hits.truncate(max_results);

        debug!(query = query, hits = hits.len(), "DuckDuckGo search complete");
        Ok(hits)
    }
}

fn selector(css: &str) -> ProviderResult<Selector> {
    Selector::parse(css).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Extracts organic results from a results page, in page order. Ads are skipped.
pub(crate) fn parse_results_page(html: &str) -> ProviderResult<Vec<SearchHit>> {
    let result_selector = selector(RESULT_SELECTOR)?;
    let title_selector = selector(TITLE_SELECTOR)?;
    let snippet_selector = selector(SNIPPET_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for result in document.select(&result_selector) {
        if result.value().classes().any(|c| c == AD_CLASS) {
            continue;
        }

        let Some(anchor) = result.select(&title_selector).next() else {
            continue;
        };
        let Some(url) = anchor.value().attr("href").and_then(resolve_result_url) else {
            continue;
        };

        let snippet = result
            .select(&snippet_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        hits.push(SearchHit::new(element_text(anchor), url, snippet));
    }

    Ok(hits)
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwraps DuckDuckGo's `/l/?uddg=<target>` redirect links.
fn resolve_result_url(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{href}")
    } else {
        href.to_string()
    };

    let parsed = reqwest::Url::parse(&absolute).ok()?;
    if parsed.path().starts_with("/l/")
        && let Some((_, target)) = parsed.query_pairs().find(|(k, _)| k == "uddg")
    {
        return Some(target.into_owned());
    }

    match parsed.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
