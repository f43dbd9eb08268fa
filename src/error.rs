// src/error.rs
// =============================================================================
// Error types for each part of the program.
//
// Per-page problems (a 404, a timeout, a broken robots.txt) are NOT errors
// here: the crawler recovers from them and keeps going. These enums cover
// what the caller actually has to deal with.
// =============================================================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("Keyword must not be empty")]
    EmptyKeyword,

    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Could not compile keyword pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// Writing results to disk
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// Delivering results to a chat
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {status} {body}")]
    Api { status: u16, body: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error: {status} {body}")]
    Api { status: u16, body: String },
}
