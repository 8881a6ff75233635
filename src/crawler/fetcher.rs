//! Document loader used by the HTML page parser
//!
//! This module handles:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests for `http`/`https` pages, with status and Content-Type checks
//! - Reading `file` URLs from disk, for crawling local test sites

use crate::{ParseError, ParseResult};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by every parse call of a crawl
///
/// # Arguments
///
/// * `request_timeout` - Upper bound on a single request, connect included
///
/// # Example
///
/// ```no_run
/// use ripple_tally::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(request_timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("ripple-tally/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(request_timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Loads the raw HTML of a page
///
/// | Scheme | Behavior |
/// |--------|----------|
/// | `http`, `https` | GET; non-2xx → `Status`, non-HTML → `ContentMismatch` |
/// | `file` | Read the file from disk |
/// | other | `UnsupportedScheme` |
pub async fn fetch_document(client: &Client, url: &Url) -> ParseResult<String> {
    match url.scheme() {
        "http" | "https" => fetch_http(client, url).await,
        "file" => read_file(url).await,
        _ => Err(ParseError::UnsupportedScheme {
            url: url.to_string(),
        }),
    }
}

async fn fetch_http(client: &Client, url: &Url) -> ParseResult<String> {
    let http_error = |source| ParseError::Http {
        url: url.to_string(),
        source,
    };

    let response = client.get(url.clone()).send().await.map_err(http_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ParseError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    // A missing Content-Type is given the benefit of the doubt
    if let Some(content_type) = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        if !is_html(content_type) {
            return Err(ParseError::ContentMismatch {
                url: url.to_string(),
                content_type: content_type.to_string(),
            });
        }
    }

    response.text().await.map_err(http_error)
}

async fn read_file(url: &Url) -> ParseResult<String> {
    let path = url.to_file_path().map_err(|_| ParseError::InvalidUrl {
        url: url.to_string(),
        message: "not a local file path".to_string(),
    })?;

    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ParseError::Io {
            url: url.to_string(),
            source,
        })
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
