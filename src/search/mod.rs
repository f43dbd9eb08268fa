// src/search/mod.rs
// =============================================================================
// This module talks to a web search API.
//
// Currently implements:
// - Google Custom Search JSON API, with paging
// - An optional "community only" filter (no news, bulletin-board links)
//
// The crawler doesn't need this; it's the other way to find pages for a
// keyword, used by the `search` subcommand.
// =============================================================================

mod google;

pub use google::{GoogleSearch, SearchHit};
