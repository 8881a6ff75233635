//! Page parsing: the contract the crawl engine depends on, and the HTML
//! implementation shipped with the crate
//!
//! The engine only ever sees [`PageParser`]. Given a URL it yields the links
//! found on the page and a per-page word-frequency map, or a recoverable
//! [`ParseError`](crate::ParseError).

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{build_http_client, fetch_document};
use crate::url::{resolve_link, ExclusionSet};
use crate::{CrawlError, ParseError, ParseResult};
use reqwest::Client;
use scraper::{Html, Node, Selector};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Links and word counts extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Absolute URLs linked from the page, in document order
    pub links: Vec<String>,

    /// How often each word appears on the page
    pub word_counts: HashMap<String, u64>,
}

/// Turns a URL into the links and words found on that page
///
/// Implementations must be shareable across the crawl's tasks. Latency is
/// unspecified and a failure only affects the page being parsed.
pub trait PageParser: Send + Sync + 'static {
    fn parse(&self, url: &str) -> impl Future<Output = ParseResult<ParsedPage>> + Send;
}

/// Parser that loads pages over HTTP(S) or from disk and reads them as HTML
#[derive(Debug, Clone)]
pub struct HtmlPageParser {
    client: Client,
    ignored_words: ExclusionSet,
}

impl HtmlPageParser {
    /// Creates a parser around an existing client
    pub fn new(client: Client, ignored_words: ExclusionSet) -> Self {
        Self {
            client,
            ignored_words,
        }
    }

    /// Builds a parser from crawler configuration
    ///
    /// The HTTP request timeout follows `parse-timeout-ms` when it is set, so
    /// a cancelled parse does not leave a request running behind it.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let request_timeout = config.parse_timeout().unwrap_or(Duration::from_secs(30));
        let client = build_http_client(request_timeout)?;
        let ignored_words = ExclusionSet::new(&config.ignored_words)?;
        Ok(Self::new(client, ignored_words))
    }
}

impl PageParser for HtmlPageParser {
    async fn parse(&self, url: &str) -> ParseResult<ParsedPage> {
        let base_url = Url::parse(url).map_err(|e| ParseError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let body = fetch_document(&self.client, &base_url).await?;
        Ok(parse_html(&body, &base_url, &self.ignored_words))
    }
}

/// Parses HTML content and extracts links and word counts
///
/// # Link Extraction Rules
///
/// - `<a href="...">` tags anywhere in the document
/// - `<a href="..." download>` is skipped
/// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs are skipped
/// - `rel="nofollow"` links ARE followed
///
/// # Word Extraction Rules
///
/// - Text under `<body>` (the whole document if there is none)
/// - `<script>`, `<style>` and `<noscript>` contents are ignored
/// - Words are maximal runs of alphanumeric characters, lowercased
/// - Words fully matching any `ignored_words` pattern are not counted
///
/// # Example
///
/// ```
/// use ripple_tally::crawler::parse_html;
/// use ripple_tally::url::ExclusionSet;
/// use url::Url;
///
/// let html = r#"<html><body><p>Rust, rust!</p><a href="/next">Next</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url, &ExclusionSet::empty());
/// assert_eq!(parsed.links, vec!["https://example.com/next".to_string()]);
/// assert_eq!(parsed.word_counts["rust"], 2);
/// ```
pub fn parse_html(html: &str, base_url: &Url, ignored_words: &ExclusionSet) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_links(&document, base_url),
        word_counts: count_words(&document, ignored_words),
    }
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Counts words in the visible text of the document
fn count_words(document: &Html, ignored_words: &ExclusionSet) -> HashMap<String, u64> {
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut counts = HashMap::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| match parent.value() {
                Node::Element(element) => Some(element.name()),
                _ => None,
            })
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript"));
        if hidden {
            continue;
        }

        for word in text.split(|c: char| !c.is_alphanumeric()) {
            if word.is_empty() {
                continue;
            }
            let word = word.to_lowercase();
            if ignored_words.matches(&word) {
                continue;
            }
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    counts
}
