// src/crawl/normalize.rs
// =============================================================================
// Turns raw href values into canonical, crawlable URLs.
//
// Every link we discover goes through `normalize` before it can reach the
// frontier. Two hrefs that point at the same page (for example "/b" and
// "/b#top") come out as the same string, which is what makes the visited set
// work.
//
// Rust concepts:
// - Option<T>: "not crawlable" is a normal answer, not an error
// - Url: parsing, joining and comparing hosts
// =============================================================================

use crate::error::CrawlError;
use url::Url;

// Links that never lead to another page
const SKIPPED_PREFIXES: [&str; 3] = ["javascript:", "mailto:", "tel:"];

// Resolves an href found on `base` into an absolute http(s) URL
//
// Returns None for:
//   - empty hrefs and pure in-page anchors ("#section")
//   - javascript:, mailto:, tel: pseudo-links
//   - anything that resolves to a non-HTTP scheme (ftp:, data:, ...)
//
// The fragment is always removed.
pub fn normalize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !is_http(&url) {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

// Compares hosts only; scheme, port and path are ignored
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

// Validates the crawl's start URL
//
// The start URL has to be absolute, http(s) and have a host. Its fragment is
// stripped so it dedups against links that point back to it.
pub fn parse_start_url(raw: &str) -> Result<Url, CrawlError> {
    let invalid = |reason: &str| CrawlError::InvalidStartUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !is_http(&url) {
        return Err(invalid("only http and https are supported"));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }

    url.set_fragment(None);
    Ok(url)
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
