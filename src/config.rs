// src/config.rs
// =============================================================================
// Configuration for every part of the program.
//
// Nothing here is a global: main.rs builds these structs from the command
// line (and environment variables for credentials) and hands them to the
// constructors that need them.
//
// Rust concepts:
// - Default trait: one place that defines the "normal" settings
// - Duration: typed time values instead of raw seconds
// =============================================================================

use std::time::Duration;

/// User agent sent with every request. The part before the first '/' is the
/// token we look for in robots.txt.
pub const DEFAULT_USER_AGENT: &str =
    "KeywordCrawler/1.0 (+https://github.com/jijoytae) - polite crawler";

/// Delay between requests when robots.txt does not declare one.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra attempts after the first failed fetch.
pub const DEFAULT_MAX_RETRIES: usize = 2;

pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

// Settings for a single crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Retries after the first attempt (so 2 means up to 3 requests)
    pub max_retries: usize,
    /// Backoff unit: retry n waits `retry_backoff * n`
    pub retry_backoff: Duration,
    /// Used when robots.txt is missing or has no Crawl-delay
    pub default_delay: Duration,
    /// Stop after this many fetches (None = until the frontier is empty)
    pub max_pages: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: Duration::from_secs(1),
            default_delay: DEFAULT_DELAY,
            max_pages: None,
        }
    }
}

impl CrawlConfig {
    /// The product token robots.txt groups are matched against.
    ///
    /// "KeywordCrawler/1.0 (...)" -> "KeywordCrawler"
    pub fn robots_agent(&self) -> &str {
        let token = self.user_agent.split('/').next().unwrap_or_default().trim();
        if token.is_empty() {
            "*"
        } else {
            token
        }
    }
}

// Google Custom Search credentials and paging behaviour
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub cx: String,
    pub endpoint: String,
    /// Sleep between result pages
    pub page_delay: Duration,
    /// Exclude news and keep only bulletin-board style links
    pub community_only: bool,
}

impl SearchConfig {
    pub fn new(api_key: impl Into<String>, cx: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cx: cx.into(),
            endpoint: GOOGLE_CSE_ENDPOINT.to_string(),
            page_delay: Duration::from_secs(1),
            community_only: false,
        }
    }
}

// Telegram bot used to deliver result files
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}
