//! Publisher: CSV -> remote sheet, appending only unseen invoices
//!
//! Per run the publisher walks
//! `Disconnected -> Connected -> HeaderChecked -> Uploaded | Skipped`,
//! dropping to `Failed` on the first error. There is no retry edge.
//!
//! A header mismatch clears the remote sheet before the local header is
//! written. Rows under the old header are lost; the [`ClearGuard`] decides
//! whether that is allowed to happen. An empty sheet is set up without asking.

use std::collections::HashSet;
use std::fmt;

use crate::api::{GoogleSheet, RemoteSheet, SheetsClient};
use crate::config::Config;
use crate::error::SyncResult;
use crate::records::read_record_csv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Disconnected,
    Connected,
    HeaderChecked,
    Uploaded,
    Skipped,
    Failed,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishState::Disconnected => write!(f, "Disconnected"),
            PublishState::Connected => write!(f, "Connected"),
            PublishState::HeaderChecked => write!(f, "HeaderChecked"),
            PublishState::Uploaded => write!(f, "Uploaded"),
            PublishState::Skipped => write!(f, "Skipped"),
            PublishState::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Every local invoice is already on the sheet
    NoNewRecords,
    /// The header differs and clearing the sheet was not approved
    ClearDeclined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub state: PublishState,
    pub appended: usize,
    /// Local rows skipped because their identifier is already remote
    pub already_present: usize,
    /// Whether the sheet was cleared and given the local header
    pub header_reset: bool,
    pub skip_reason: Option<SkipReason>,
}

/// Approves clearing the remote sheet on a header mismatch
pub trait ClearGuard {
    fn confirm_clear(&mut self, sheet: &str, remote: Option<&[String]>, local: &[String]) -> bool;
}

/// Approves every clear (`--yes`)
pub struct AlwaysClear;

impl ClearGuard for AlwaysClear {
    fn confirm_clear(&mut self, _sheet: &str, _remote: Option<&[String]>, _local: &[String]) -> bool {
        true
    }
}

pub struct Publisher<'a> {
    config: &'a Config,
    state: PublishState,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            state: PublishState::Disconnected,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    fn advance(&mut self, next: PublishState) {
        log::debug!("Publisher: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Authenticate and open the configured spreadsheet
    pub async fn connect(&mut self) -> SyncResult<GoogleSheet> {
        let config = self.config;
        let opened = match SheetsClient::connect(&config.keyfile, config.request_timeout()).await {
            Ok(client) => client.open_by_name(&config.sheet_name).await,
            Err(e) => Err(e),
        };

        match opened {
            Ok(sheet) => {
                self.advance(PublishState::Connected);
                Ok(sheet)
            }
            Err(e) => {
                self.advance(PublishState::Failed);
                Err(e)
            }
        }
    }

    /// Upload the CSV's unseen rows to `sheet`
    ///
    /// Holding a sheet handle means the connection step succeeded, so a
    /// publisher that is still `Disconnected` moves to `Connected` first.
    pub async fn upload<S>(&mut self, sheet: &mut S, guard: &mut dyn ClearGuard) -> SyncResult<PublishReport>
    where
        S: RemoteSheet + ?Sized,
    {
        if self.state == PublishState::Disconnected {
            self.advance(PublishState::Connected);
        }

        match self.upload_inner(sheet, guard).await {
            Ok(report) => Ok(report),
            Err(e) => {
                self.advance(PublishState::Failed);
                Err(e)
            }
        }
    }

    async fn upload_inner<S>(&mut self, sheet: &mut S, guard: &mut dyn ClearGuard) -> SyncResult<PublishReport>
    where
        S: RemoteSheet + ?Sized,
    {
        let config = self.config;
        let local = read_record_csv(&config.csv_file)?;
        let id_idx = local.require_column(&config.id_column, &config.csv_file)?;
        let header = local.header();

        let remote = sheet.get_all_values().await?;
        let remote_header = remote.first().map(Vec::as_slice);

        let existing: HashSet<String>;
        let mut header_reset = false;

        if remote_header.is_some_and(|remote| same_header(remote, header)) {
            existing = remote_identifiers(&remote, id_idx);
        } else {
            // Only a populated sheet needs approval
            if !remote.is_empty() && !guard.confirm_clear(sheet.title(), remote_header, header) {
                log::warn!(
                    "Header mismatch on '{}' and clear was declined; nothing uploaded",
                    sheet.title()
                );
                self.advance(PublishState::Skipped);
                return Ok(PublishReport {
                    state: self.state,
                    appended: 0,
                    already_present: 0,
                    header_reset: false,
                    skip_reason: Some(SkipReason::ClearDeclined),
                });
            }

            log::warn!(
                "Header mismatch on '{}': clearing {} remote rows",
                sheet.title(),
                remote.len()
            );
            sheet.clear().await?;
            sheet.append_row(header).await?;
            header_reset = true;
            existing = HashSet::new();
        }
        self.advance(PublishState::HeaderChecked);

        let candidates: Vec<Vec<String>> = local
            .records()
            .iter()
            .filter(|r| !r.is_blank())
            .map(|r| r.to_strings())
            .collect();
        let total = candidates.len();
        let new_rows: Vec<Vec<String>> = candidates
            .into_iter()
            .filter(|row| !existing.contains(&row[id_idx]))
            .collect();
        let already_present = total - new_rows.len();

        if new_rows.is_empty() {
            self.advance(PublishState::Skipped);
            return Ok(PublishReport {
                state: self.state,
                appended: 0,
                already_present,
                header_reset,
                skip_reason: Some(SkipReason::NoNewRecords),
            });
        }

        sheet.append_rows(&new_rows).await?;
        log::info!("Appended {} rows to '{}'", new_rows.len(), sheet.title());
        self.advance(PublishState::Uploaded);

        Ok(PublishReport {
            state: self.state,
            appended: new_rows.len(),
            already_present,
            header_reset,
            skip_reason: None,
        })
    }
}

/// Headers match when they agree up to trailing empty cells
fn same_header(remote: &[String], local: &[String]) -> bool {
    fn significant(header: &[String]) -> &[String] {
        let len = header
            .iter()
            .rposition(|name| !name.is_empty())
            .map_or(0, |i| i + 1);
        &header[..len]
    }
    significant(remote) == significant(local)
}

/// Identifiers in the data rows of a sheet (everything after the header)
///
/// Empty rows are ignored; a row too short to reach the column counts as an
/// empty identifier.
fn remote_identifiers(rows: &[Vec<String>], id_idx: usize) -> HashSet<String> {
    rows.iter()
        .skip(1)
        .filter(|row| !row.is_empty())
        .map(|row| row.get(id_idx).cloned().unwrap_or_default())
        .collect()
}
