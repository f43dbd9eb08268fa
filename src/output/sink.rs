// src/output/sink.rs
// =============================================================================
// Writing results to disk.
//
// Two formats:
// - CSV with a UTF-8 byte order mark, so spreadsheet tools open Korean (or
//   any non-ASCII) text correctly
// - A numbered plain-text summary, one block per record
//
// Both crawl matches and search hits can be written; the Record trait is
// what they have in common.
// =============================================================================

use crate::error::SinkError;
use crate::matcher::Match;
use crate::search::SearchHit;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Something we can persist: a serde row for CSV plus the three lines of the
/// text summary.
pub trait Record: Serialize {
    /// CSV header, in field order
    const COLUMNS: &'static [&'static str];

    fn title(&self) -> &str;
    fn link(&self) -> &str;
    fn snippet(&self) -> &str;
}

impl Record for Match {
    const COLUMNS: &'static [&'static str] = &["url", "title", "snippet"];

    fn title(&self) -> &str {
        &self.title
    }

    fn link(&self) -> &str {
        &self.url
    }

    fn snippet(&self) -> &str {
        &self.snippet
    }
}

impl Record for SearchHit {
    const COLUMNS: &'static [&'static str] = &["title", "link", "snippet"];

    fn title(&self) -> &str {
        &self.title
    }

    fn link(&self) -> &str {
        &self.link
    }

    fn snippet(&self) -> &str {
        &self.snippet
    }
}

// Writes `records` as CSV; the header comes from the struct's field names
pub fn write_csv<R: Record>(path: &Path, records: &[R]) -> Result<(), SinkError> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        // serialize() only writes the header together with the first row
        writer.write_record(R::COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Saved {} row(s) to {}", records.len(), path.display());
    Ok(())
}

// Writes the numbered summary:
//
//   1. <title>
//   <link>
//   <snippet>
//
pub fn write_summary<R: Record>(path: &Path, records: &[R]) -> Result<(), SinkError> {
    let mut file = BufWriter::new(File::create(path)?);

    for (i, record) in records.iter().enumerate() {
        write!(
            file,
            "{}. {}\n{}\n{}\n\n",
            i + 1,
            record.title(),
            record.link(),
            record.snippet()
        )?;
    }
    file.flush()?;

    info!("Saved summary to {}", path.display());
    Ok(())
}
