// src/output/seen.rs
// =============================================================================
// Remembering which results were already reported.
//
// The seen file holds one "title | link" line per result. A run loads it,
// keeps only results that are not in it yet, and appends those once they are
// saved. Running the same search again (from cron, say) therefore only
// reports what is new.
// =============================================================================

use super::sink::Record;
use crate::error::SinkError;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SeenStore {
    path: PathBuf,
    entries: HashSet<String>,
}

impl SeenStore {
    /// Loads `path`. A file that doesn't exist yet is an empty store.
    pub fn load(path: &Path) -> Result<Self, SinkError> {
        let entries: HashSet<String> = match std::fs::read_to_string(path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("{} result(s) already seen in {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Keeps the records not seen before and marks them as seen (in memory
    /// only, see `append`). A duplicate inside `records` is kept once.
    pub fn retain_new<R: Record>(&mut self, records: Vec<R>) -> Vec<R> {
        records
            .into_iter()
            .filter(|record| self.entries.insert(entry_line(record)))
            .collect()
    }

    /// Appends `records` to the seen file, creating it if needed.
    pub fn append<R: Record>(&self, records: &[R]) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut file = BufWriter::new(file);
        for record in records {
            writeln!(file, "{}", entry_line(record))?;
        }
        file.flush()?;

        info!("Added {} result(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

// "title | link", on a single line so the file stays one entry per line
fn entry_line<R: Record>(record: &R) -> String {
    let title = record.title().replace(['\r', '\n'], " ");
    format!("{} | {}", title.trim(), record.link().trim())
}
