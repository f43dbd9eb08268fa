// src/matcher/html.rs
// =============================================================================
// Reading titles and links out of HTML pages.
//
// The crawler only needs two things from a parsed page:
// - "give me attribute X of every element matching selector Y" (links)
// - "give me the text of the first element matching selector Y" (title)
//
// The PageDom trait captures exactly that, and ScraperPage implements it with
// the `scraper` crate (html5ever underneath). Broken HTML is fine: html5ever
// recovers the same way a browser would and we take whatever it finds.
//
// Rust concepts:
// - Traits: describe a capability, not a concrete parser
// - Iterators: select() yields matching elements lazily
// =============================================================================

use scraper::{Html, Selector};
use tracing::debug;

pub trait PageDom {
    /// Value of `attr` for every element matching `selector`, in document order.
    fn select_attr(&self, selector: &str, attr: &str) -> Vec<String>;

    /// Text content of the first element matching `selector`.
    fn first_text(&self, selector: &str) -> Option<String>;
}

pub struct ScraperPage {
    document: Html,
}

impl ScraperPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }
}

impl PageDom for ScraperPage {
    fn select_attr(&self, selector: &str, attr: &str) -> Vec<String> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };

        self.document
            .select(&selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::to_string)
            .collect()
    }

    fn first_text(&self, selector: &str) -> Option<String> {
        let selector = parse_selector(selector)?;
        self.document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>())
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            debug!("Invalid selector '{}': {:?}", selector, e);
            None
        }
    }
}

// All href values of <a> elements, unresolved
pub fn extract_links(dom: &impl PageDom) -> Vec<String> {
    dom.select_attr("a[href]", "href")
}

// Trimmed <title> text, or "" when the page has none
pub fn page_title(dom: &impl PageDom) -> String {
    dom.first_text("title")
        .map(|title| title.trim().to_string())
        .unwrap_or_default()
}
