// src/crawl/fetch.rs
// =============================================================================
// Downloads pages for the crawler.
//
// Key functionality:
// - GET with a timeout and our own user agent
// - Retries failed requests with a growing pause (1s, 2s, ...)
// - Never returns an error: a page that can't be fetched comes back as
//   FetchResult::Failed and the crawl moves on
// - Never follows redirects itself: a 3xx comes back as FetchResult::Redirect
//   and the engine decides whether the target may be crawled (same host,
//   robots.txt, not seen before)
//
// Rust concepts:
// - Enums with data: Ok carries the body, Redirect the new location,
//   Failed the reason
// - async loops: retrying with tokio::time::sleep between attempts
// =============================================================================

use crate::config::CrawlConfig;
use reqwest::redirect::Policy;
use reqwest::{header, Client};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Outcome of fetching one URL (after retries).
#[derive(Debug, Clone)]
pub enum FetchResult {
    Ok { body: String, content_type: String },
    /// A 3xx with a Location header. `location` is the raw header value,
    /// possibly relative to the requested URL.
    Redirect { status: u16, location: String },
    Failed { reason: FailureReason, attempts: usize },
}

/// Why the last attempt for a URL failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Non-2xx answer (a 3xx only lands here when it has no usable Location)
    Status(u16),
    Timeout,
    Connect,
    /// The response arrived but the body couldn't be read
    Body(String),
    Other(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Status(code) => write!(f, "HTTP {}", code),
            FailureReason::Timeout => write!(f, "request timed out"),
            FailureReason::Connect => write!(f, "connection failed"),
            FailureReason::Body(e) => write!(f, "could not read body: {}", e),
            FailureReason::Other(e) => write!(f, "{}", e),
        }
    }
}

// Only text/html (and XHTML) bodies are parsed for keywords and links
pub fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

pub struct Fetcher {
    client: Client,
    max_retries: usize,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            // reqwest would follow redirects without asking robots.txt, so
            // every hop goes back to the engine as a new link instead
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// The underlying client, shared with the robots.txt loader.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches `url`, retrying up to `max_retries` times.
    ///
    /// Attempt n (starting at 1) that fails waits `retry_backoff * n` before
    /// the next one, so a URL that always fails costs exactly
    /// `1 + max_retries` requests.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        // Attempts are numbered from 1 so the backoff grows 1x, 2x, 3x...
        let mut attempt = 1;

        loop {
            match self.fetch_once(url).await {
                // Success and redirects are final, only failures are retried
                Ok(result) => return result,
                Err(reason) if attempt <= self.max_retries => {
                    let backoff = self.retry_backoff * attempt as u32;
                    debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt, url, reason, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(reason) => {
                    return FetchResult::Failed {
                        reason,
                        attempts: attempt,
                    }
                }
            }
        }
    }

    // One request, no retries. Returns Ok for a page or a redirect.
    async fn fetch_once(&self, url: &str) -> Result<FetchResult, FailureReason> {
        let response = self.client.get(url).send().await.map_err(categorize_error)?;

        let status = response.status();
        if status.is_redirection() {
            // A 3xx without a readable Location (e.g. 304) is just a failure
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or(FailureReason::Status(status.as_u16()))?;
            return Ok(FetchResult::Redirect {
                status: status.as_u16(),
                location,
            });
        }
        if !status.is_success() {
            return Err(FailureReason::Status(status.as_u16()));
        }

        // Missing Content-Type means "" which is_html() rejects
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        // text() decodes using the charset from Content-Type (UTF-8 by default)
        let body = response
            .text()
            .await
            .map_err(|e| FailureReason::Body(e.to_string()))?;

        Ok(FetchResult::Ok { body, content_type })
    }
}

fn categorize_error(error: reqwest::Error) -> FailureReason {
    if error.is_timeout() {
        FailureReason::Timeout
    } else if error.is_connect() {
        FailureReason::Connect
    } else {
        FailureReason::Other(error.to_string())
    }
}
