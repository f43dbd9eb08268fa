// src/search/google.rs
// =============================================================================
// Google Custom Search client.
//
// Strategy:
// - Ask the JSON API for up to 10 results per request (its page size)
// - Move the `start` index forward until we have enough results, a page
//   comes back empty, or we hit the API's 100-result limit
// - Sleep between pages so we stay well under the rate limit
//
// Credentials (API key and engine id) come from SearchConfig; nothing is
// hard-coded.
//
// Rust concepts:
// - serde Deserialize: turning the JSON response into structs
// - Option<T> fields: the API omits keys it has nothing for
// =============================================================================

use crate::config::SearchConfig;
use crate::error::SearchError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// The API serves 10 results per request
const PAGE_SIZE: usize = 10;

// ...and never more than 100 in total (start + num <= 101)
const MAX_START: usize = 91;

// Appended to the query in community-only mode
const EXCLUDE_NEWS: &str = "-site:news.google.com -inurl:news";

// A link must contain one of these to count as a community post
const COMMUNITY_MARKERS: [&str; 3] = ["bbs", "board", "community"];

/// One search result. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

// The parts of the API response we read
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

pub struct GoogleSearch {
    client: Client,
    config: SearchConfig,
}

impl GoogleSearch {
    pub fn new(client: Client, config: SearchConfig) -> Self {
        Self { client, config }
    }

    // Collects up to `num_results` hits for `keyword`
    //
    // Returns: the hits in API order, or an error if the API refused a request
    pub async fn search(
        &self,
        keyword: &str,
        num_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let query = self.build_query(keyword);
        let mut hits = Vec::new();
        let mut start = 1;

        while hits.len() < num_results && start <= MAX_START {
            let num = PAGE_SIZE.min(num_results - hits.len());
            let items = self.fetch_page(&query, start, num).await?;

            debug!("'{}' start={} returned {} item(s)", query, start, items.len());
            if items.is_empty() {
                break;
            }

            hits.extend(
                items
                    .into_iter()
                    .filter_map(into_hit)
                    .filter(|hit| !self.config.community_only || is_community_link(&hit.link)),
            );

            start += PAGE_SIZE;
            if hits.len() < num_results {
                tokio::time::sleep(self.config.page_delay).await;
            }
        }

        hits.truncate(num_results);
        info!("Search '{}' produced {} result(s)", keyword, hits.len());
        Ok(hits)
    }

    fn build_query(&self, keyword: &str) -> String {
        if self.config.community_only {
            format!("{} {}", keyword, EXCLUDE_NEWS)
        } else {
            keyword.to_string()
        }
    }

    async fn fetch_page(
        &self,
        query: &str,
        start: usize,
        num: usize,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let start = start.to_string();
        let num = num.to_string();

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.cx.as_str()),
                ("q", query),
                ("start", start.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api { status, body });
        }

        let page: SearchResponse = response.json().await?;
        Ok(page.items)
    }
}

// Items without a link are useless to us
fn into_hit(item: SearchItem) -> Option<SearchHit> {
    Some(SearchHit {
        link: item.link?,
        title: item.title.unwrap_or_default(),
        snippet: item.snippet.unwrap_or_default(),
    })
}

fn is_community_link(link: &str) -> bool {
    COMMUNITY_MARKERS.iter().any(|marker| link.contains(marker))
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why build the query string with .query()?
//    - reqwest percent-encodes every value for us
//    - Keywords with spaces or non-ASCII text ("해외 구인") just work
//
// 2. Why #[serde(default)] on items?
//    - When there are no results the API leaves "items" out entirely
//    - default turns a missing key into an empty Vec instead of an error
//
// 3. Why does search() return Result but the crawler's fetch() doesn't?
//    - A crawl has hundreds of pages; one bad page must not stop it
//    - A search is one API; if it says no (bad key, quota), the caller
//      has to know
// -----------------------------------------------------------------------------
