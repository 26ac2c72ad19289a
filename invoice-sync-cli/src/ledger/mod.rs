//! Append-only ledgers of invoice identifiers
//!
//! Each run appends one human-readable batch:
//!
//! ```text
//!
//! -. = Processed Invoices Batch - 2024-05-01 09:30:00 (Total: 2) = .-
//!
//!
//! 1001
//! 1002
//!
//! ```
//!
//! Loading ignores everything that is not a bare run of digits, so banners and
//! blank lines never leak into the identifier set.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::SyncResult;

pub const PROCESSED_LABEL: &str = "Processed Invoices";
pub const CRASH_LABEL: &str = "Crash Entries";

/// A ledger file and the label its batches carry
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    label: &'static str,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>, label: &'static str) -> Self {
        Self {
            path: path.into(),
            label,
        }
    }

    pub fn processed(path: impl Into<PathBuf>) -> Self {
        Self::new(path, PROCESSED_LABEL)
    }

    pub fn crashes(path: impl Into<PathBuf>) -> Self {
        Self::new(path, CRASH_LABEL)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> SyncResult<HashSet<String>> {
        load_invoice_ids(&self.path)
    }

    /// Append a batch; returns the number of identifiers written
    pub fn append(&self, ids: &[String]) -> SyncResult<usize> {
        save_invoice_ids(&self.path, ids, self.label)
    }
}

fn is_identifier(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Load every identifier recorded in a ledger; a missing file is an empty set
pub fn load_invoice_ids<P: AsRef<Path>>(path: P) -> SyncResult<HashSet<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut ids = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let token = line.trim();
        if is_identifier(token) {
            ids.insert(token.to_string());
        }
    }

    log::debug!("Loaded {} identifiers from {}", ids.len(), path.display());
    Ok(ids)
}

/// Append one batch of identifiers under `label`
///
/// An empty batch writes nothing, leaving the file untouched.
pub fn save_invoice_ids<P: AsRef<Path>>(
    path: P,
    ids: &[String],
    label: &str,
) -> SyncResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }

    let path = path.as_ref();
    let block = format_batch(ids, label, Local::now().naive_local());

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(block.as_bytes())?;
    file.flush()?;

    log::info!("Appended {} identifiers to {}", ids.len(), path.display());
    Ok(ids.len())
}

fn format_batch(ids: &[String], label: &str, timestamp: NaiveDateTime) -> String {
    let mut sorted = ids.to_vec();
    sorted.sort();

    let banner = format!(
        "-. = {} Batch - {} (Total: {}) = .-",
        label,
        timestamp.format("%Y-%m-%d %H:%M:%S"),
        ids.len()
    );

    format!("\n{}\n\n\n{}\n\n", banner, sorted.join("\n"))
}
