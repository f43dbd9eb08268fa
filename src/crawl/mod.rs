// src/crawl/mod.rs
// =============================================================================
// This module handles crawling one website for a keyword.
//
// Features:
// - Breadth-first crawling starting from a URL
// - Same-host restriction (never requests another site)
// - robots.txt rules and Crawl-delay
// - Retries with backoff for flaky pages
// - Optional page ceiling
//
// Submodules, leaf to root:
// - policy: robots.txt and the delay between requests
// - normalize: href -> canonical URL, same-domain check
// - fetch: GET with timeout, retries and the content-type gate
// - frontier: the FIFO of URLs waiting to be fetched
// - engine: the loop that ties everything together
// =============================================================================

mod engine;
mod fetch;
mod frontier;
mod normalize;
mod policy;

pub use engine::{CrawlReport, Crawler};
