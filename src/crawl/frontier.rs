// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: URLs waiting to be fetched, in breadth-first order.
//
// How it works:
// - push() adds a URL at the back, unless it is already queued
// - pop() takes the oldest URL from the front
// - The visited set lives next to it in the engine; together they make sure
//   a URL is never queued twice and never fetched twice
//
// Rust concepts:
// - VecDeque: cheap push_back/pop_front, perfect for BFS
// - HashSet: O(1) "is it already queued?" checks
// =============================================================================

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL the crawler will fetch. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    url: Url,
}

impl CrawlTarget {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    // Mirrors the contents of `queue`, keyed by canonical URL string
    queued: HashSet<String>,
}

impl Frontier {
    /// Adds `target` at the back. Returns false (and does nothing) if the
    /// same URL is already waiting.
    pub fn push(&mut self, target: CrawlTarget) -> bool {
        if !self.queued.insert(target.as_str().to_string()) {
            return false;
        }
        self.queue.push_back(target);
        true
    }

    pub fn pop(&mut self) -> Option<CrawlTarget> {
        let target = self.queue.pop_front()?;
        self.queued.remove(target.as_str());
        Some(target)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.queued.contains(url)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
