//! Web search by scraping a search engine's HTML results page, plus
//! on-site search probing and page text extraction.
//!
//! Every public operation is best-effort: failures are logged and come back as
//! an empty result so a chat turn never aborts because the web misbehaved.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Node, Selector};

use crate::core::errors::{degrade, AppError};

pub const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const DOMAIN_PROBE_TIMEOUT: Duration = Duration::from_secs(8);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_BODY_BYTES: usize = 5_000_000;
const PAGE_TEXT_LIMIT: usize = 4000;
const LINK_TITLE_CHARS: usize = 80;
const LINK_SNIPPET_CHARS: usize = 200;

const CONTENT_CONTAINERS: [&str; 5] = ["main", "article", ".content", "#content", "body"];
const HIDDEN_ELEMENTS: &str = "script, style, nav, footer, header, aside, .ad, .advertisement";
const LINK_CONTAINERS: [&str; 4] = ["article", "li", "div", "p"];

static REDIRECT_TARGET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"uddg=([^&]+)").expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// The web operations the chat pipeline relies on.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult>;

    async fn search_domain_direct(
        &self,
        domain: &str,
        term: &str,
        max_results: usize,
    ) -> Vec<SearchResult>;

    async fn fetch_page_content(&self, url: &str) -> String;
}

#[derive(Clone)]
pub struct WebSearchTool {
    client: Client,
    search_endpoint: String,
    site_scheme: String,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_search_endpoint(SEARCH_ENDPOINT)
    }

    pub fn with_search_endpoint(endpoint: &str) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            search_endpoint: endpoint.to_string(),
            site_scheme: "https".to_string(),
        }
    }

    /// Scheme used to reach sites during on-site search (`https` unless set).
    pub fn with_site_scheme(mut self, scheme: &str) -> Self {
        self.site_scheme = scheme.to_string();
        self
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>, AppError> {
        let response = self
            .client
            .get(&self.search_endpoint)
            .query(&[("q", query)])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .map_err(AppError::internal)?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Search engine returned {}",
                response.status()
            )));
        }

        let html = response.text().await.map_err(AppError::internal)?;
        parse_search_results(&html, max_results)
    }

    async fn try_domain_endpoint(
        &self,
        endpoint: &str,
        domain: &str,
        term: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let page_url = Url::parse(endpoint).map_err(AppError::internal)?;
        let html = self.get_html(page_url.clone(), DOMAIN_PROBE_TIMEOUT).await?;
        collect_domain_links(&html, &page_url, domain, term, max_results)
    }

    async fn try_fetch_page(&self, url: &str) -> Result<String, AppError> {
        let parsed = Url::parse(url).map_err(AppError::internal)?;
        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(AppError::BadRequest(
                "Only http/https URLs are supported".to_string(),
            ));
        }

        let html = self.get_html(parsed, FETCH_TIMEOUT).await?;
        extract_page_text(&html)
    }

    /// GET an HTML page, refusing non-2xx answers, non-HTML bodies and bodies
    /// over `MAX_BODY_BYTES`.
    async fn get_html(&self, url: Url, timeout: Duration) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(AppError::internal)?;
        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Fetch failed: {}",
                response.status()
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(AppError::BadRequest(format!(
                    "Expected HTML, got {}",
                    content_type
                )));
            }
        }

        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_BODY_BYTES)
        {
            return Err(AppError::BadRequest(format!(
                "Fetched content exceeded max size of {} bytes",
                MAX_BODY_BYTES
            )));
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(AppError::internal)?;
            if bytes.len().saturating_add(chunk.len()) > MAX_BODY_BYTES {
                return Err(AppError::BadRequest(format!(
                    "Fetched content exceeded max size of {} bytes",
                    MAX_BODY_BYTES
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearch for WebSearchTool {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let results = degrade("web search", self.try_search(query, max_results).await);
        tracing::info!("search: query={:?} results={}", query, results.len());
        results
    }

    async fn search_domain_direct(
        &self,
        domain: &str,
        term: &str,
        max_results: usize,
    ) -> Vec<SearchResult> {
        for endpoint in domain_search_endpoints(&self.site_scheme, domain, term) {
            match self
                .try_domain_endpoint(&endpoint, domain, term, max_results)
                .await
            {
                Ok(results) if !results.is_empty() => {
                    tracing::info!("search: site {} answered via {}", domain, endpoint);
                    return results;
                }
                Ok(_) => {}
                Err(err) => tracing::debug!("search: site probe {} failed: {}", endpoint, err),
            }
        }
        Vec::new()
    }

    async fn fetch_page_content(&self, url: &str) -> String {
        degrade("page fetch", self.try_fetch_page(url).await)
    }
}

/// On-site search URL shapes, tried in order.
pub fn domain_search_endpoints(scheme: &str, domain: &str, term: &str) -> Vec<String> {
    let encoded = urlencoding::encode(term);
    vec![
        format!("{}://{}/search?q={}", scheme, domain, encoded),
        format!("{}://{}/?s={}", scheme, domain, encoded),
        format!("{}://{}/search?query={}", scheme, domain, encoded),
        format!("{}://{}/?q={}", scheme, domain, encoded),
    ]
}

/// Deterministic plain-text rendering of a result list.
pub fn format_search_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found.".to_string();
    }

    let mut formatted = String::from("Search Results:\n\n");
    for (index, result) in results.iter().enumerate() {
        formatted.push_str(&format!("{}. {}\n", index + 1, result.title));
        formatted.push_str(&format!("   URL: {}\n", result.url));
        if !result.snippet.is_empty() {
            formatted.push_str(&format!("   {}\n", result.snippet));
        }
        formatted.push('\n');
    }
    formatted
}

pub fn parse_search_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>, AppError> {
    let result_sel = selector(".result")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;
    let url_sel = selector(".result__url")?;

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for block in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let title_elem = block.select(&title_sel).next();
        let title = title_elem.map(element_text).unwrap_or_default();
        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let mut url = block
            .select(&url_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        if let Some(destination) = title_elem
            .and_then(|el| el.value().attr("href"))
            .and_then(unwrap_redirect)
        {
            url = destination;
        }

        if !title.is_empty() && !url.is_empty() {
            results.push(SearchResult {
                title,
                url,
                snippet,
            });
        }
    }

    Ok(results)
}

/// Pull the destination out of a `...?uddg=<encoded>&...` redirect link.
pub fn unwrap_redirect(href: &str) -> Option<String> {
    let encoded = REDIRECT_TARGET.captures(href)?.get(1)?.as_str();
    urlencoding::decode(encoded).ok().map(|url| url.into_owned())
}

/// Same-domain links on `html` whose text (or surrounding block) mentions one
/// of the query terms.
pub fn collect_domain_links(
    html: &str,
    page_url: &Url,
    domain: &str,
    term: &str,
    max_results: usize,
) -> Result<Vec<SearchResult>, AppError> {
    let anchor_sel = selector("a[href]")?;
    let words = query_terms(term);
    let domain = domain
        .split(':')
        .next()
        .unwrap_or(domain)
        .to_ascii_lowercase();

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for anchor in document.select(&anchor_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        let host = resolved.host_str().unwrap_or_default().to_ascii_lowercase();
        if !host.ends_with(&domain) {
            continue;
        }

        let text = element_text(anchor);
        let container_text = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| LINK_CONTAINERS.contains(&el.value().name()))
            .map(element_text)
            .unwrap_or_default();
        let snippet_source = if container_text.is_empty() {
            text.clone()
        } else {
            container_text
        };
        if snippet_source.is_empty() {
            continue;
        }

        let haystack = snippet_source.to_lowercase();
        let has_keyword = words.is_empty() || words.iter().any(|w| haystack.contains(w.as_str()));
        if !has_keyword {
            continue;
        }

        let title = if text.is_empty() {
            take_chars(&snippet_source, LINK_TITLE_CHARS)
        } else {
            text
        };
        results.push(SearchResult {
            title,
            url: resolved.to_string(),
            snippet: take_chars(&snippet_source, LINK_SNIPPET_CHARS),
        });
    }

    Ok(results)
}

/// Readable text of the page's main content, whitespace-collapsed and capped.
pub fn extract_page_text(html: &str) -> Result<String, AppError> {
    let hidden = selector(HIDDEN_ELEMENTS)?;
    let document = Html::parse_document(html);

    let mut container = None;
    for css in CONTENT_CONTAINERS {
        if let Some(found) = document.select(&selector(css)?).next() {
            container = Some(found);
            break;
        }
    }
    let Some(container) = container else {
        return Ok(String::new());
    };

    let mut raw = String::new();
    for node in container.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let is_hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| hidden.matches(&el));
        if !is_hidden {
            raw.push_str(text);
        }
    }

    Ok(take_chars(&collapse_whitespace(&raw), PAGE_TEXT_LIMIT))
}

/// Lower-cased query words longer than two characters.
fn query_terms(term: &str) -> Vec<String> {
    term.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn take_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn selector(css: &'static str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Internal(format!("invalid selector {}: {:?}", css, e)))
}
