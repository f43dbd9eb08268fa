// src/output/mod.rs
// =============================================================================
// Where results go once a crawl or search is done.
//
// Submodules:
// - sink: CSV and plain-text files
// - notify: sending files and messages to Telegram
// - seen: the list of results already reported
// =============================================================================

mod notify;
mod seen;
mod sink;

pub use notify::{Notifier, TelegramNotifier};
pub use seen::SeenStore;
pub use sink::{write_csv, write_summary};
