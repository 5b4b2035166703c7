//! Work-list input and result output
//!
//! Work items come from a CSV with a required `username` column and an
//! optional `post_link` column; results go out as pretty-printed JSON.
//! Both sides are traits so callers can substitute other stores.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::record::{ItemRecord, WorkItem};

use super::scrape_error::{ScrapeError, ScrapeResult};

pub trait RowSource {
    fn work_items(&self) -> ScrapeResult<Vec<WorkItem>>;
}

pub trait ResultSink {
    fn write_records(&mut self, records: &[ItemRecord]) -> ScrapeResult<()>;
}

pub struct CsvRowSource {
    path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RowSource for CsvRowSource {
    fn work_items(&self) -> ScrapeResult<Vec<WorkItem>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|error| ScrapeError::work_list(format!("{}: {error}", self.path.display())))?;

        let headers = reader
            .headers()
            .map_err(|error| ScrapeError::work_list(error.to_string()))?
            .clone();
        let username_col = headers
            .iter()
            .position(|h| h.trim() == "username")
            .ok_or_else(|| ScrapeError::work_list("missing required 'username' column"))?;
        let link_col = headers.iter().position(|h| h.trim() == "post_link");

        let mut items = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.map_err(|error| ScrapeError::work_list(error.to_string()))?;
            let username = row.get(username_col).unwrap_or_default().trim();
            if username.is_empty() {
                warn!(row = index + 2, "skipping row with empty username");
                continue;
            }
            let post_link = link_col
                .and_then(|col| row.get(col))
                .map(str::trim)
                .filter(|link| !link.is_empty());
            items.push(match post_link {
                Some(link) => WorkItem::targeted(username, link),
                None => WorkItem::account(username),
            });
        }
        debug!(count = items.len(), path = %self.path.display(), "work list loaded");
        Ok(items)
    }
}

pub struct JsonSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> ResultSink for JsonSink<W> {
    fn write_records(&mut self, records: &[ItemRecord]) -> ScrapeResult<()> {
        serde_json::to_writer_pretty(&mut self.writer, records)
            .map_err(|error| ScrapeError::work_list(error.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|error| ScrapeError::work_list(error.to_string()))?;
        Ok(())
    }
}
