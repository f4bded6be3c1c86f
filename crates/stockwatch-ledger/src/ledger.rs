//! Append-only record of sent notifications.

use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::entry::{format_line, LedgerEntry};
use crate::LedgerError;

/// Line-oriented ledger file.
///
/// Each [`record`](Self::record) is a single `write_all` of a complete line.
/// A line torn by a crash mid-append is closed off with a newline before the
/// next record, so at most that one line is lost and every later line parses.
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    file: Mutex<File>,
}

impl DedupLedger {
    /// Open (creating if needed) the ledger at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file cannot be opened.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await
            .map_err(|source| io_error(&path, source))?;
        tracing::debug!(path = %path.display(), "ledger: opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `vendor, item_id, <now>,` as one line.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the tail check or the append fails.
    pub async fn record(&self, vendor: &str, item_id: &str) -> Result<(), LedgerError> {
        let line = format_line(vendor, item_id, Utc::now());

        let mut file = self.file.lock().await;
        let mut buf = String::with_capacity(line.len() + 2);
        if !ends_with_newline(&mut file)
            .await
            .map_err(|source| io_error(&self.path, source))?
        {
            tracing::warn!(path = %self.path.display(), "ledger: closing torn trailing line");
            buf.push('\n');
        }
        buf.push_str(&line);
        buf.push('\n');

        file.write_all(buf.as_bytes())
            .await
            .map_err(|source| io_error(&self.path, source))?;
        file.flush()
            .await
            .map_err(|source| io_error(&self.path, source))?;

        tracing::debug!(vendor, item_id, "ledger: recorded");
        Ok(())
    }

    /// Every complete, well-formed line in file order.
    ///
    /// A trailing line without its newline is still being written (or was
    /// torn) and is left out, as are malformed lines.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file cannot be read.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let _guard = self.file.lock().await;
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| io_error(&self.path, source))?;
        Ok(parse_entries(&raw))
    }

    /// Item ids recorded for `vendor`, read in one pass over the file.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Io`] if the file cannot be read.
    pub async fn recorded_ids(&self, vendor: &str) -> Result<HashSet<String>, LedgerError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.vendor == vendor)
            .map(|e| e.item_id)
            .collect())
    }
}

async fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0_u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

fn parse_entries(raw: &str) -> Vec<LedgerEntry> {
    let complete = match raw.rfind('\n') {
        Some(end) => &raw[..end],
        None => return Vec::new(),
    };
    complete
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| match LedgerEntry::parse(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "ledger: skipping unparseable line");
                None
            }
        })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
