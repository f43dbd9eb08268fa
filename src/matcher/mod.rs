// src/matcher/mod.rs
// =============================================================================
// Everything the crawler does with a page body once it has one.
//
// Submodules:
// - keyword: case-insensitive keyword test, snippet and Match record
// - html: the PageDom parse-tree abstraction (links and title)
// =============================================================================

mod html;
mod keyword;

pub use html::{extract_links, ScraperPage};
pub use keyword::{KeywordMatcher, Match};
