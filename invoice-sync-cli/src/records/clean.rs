//! Cleaning pipeline for raw invoice rows
//!
//! Steps, in order:
//! 1. drop rows where every cell is missing
//! 2. split the rest on a completeness threshold of `columns / 2`:
//!    rows with at most that many filled cells are crash entries
//! 3. drop valid rows whose cells are all blank or a lone comma
//! 4. de-duplicate valid rows on the identifier column, first one wins

use std::collections::HashSet;

use super::{Record, RecordSet};

/// Outcome of [`clean_invoice_data`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedRecords {
    /// Rows that passed every step
    pub valid: RecordSet,
    /// Rows with too few filled cells to be trusted
    pub crash_entries: RecordSet,
    /// Fully empty rows dropped in step 1
    pub blank_rows: usize,
    /// Rows of blanks and commas dropped in step 3
    pub filler_rows: usize,
    /// Later duplicates dropped in step 4
    pub duplicates: usize,
}

/// Filled-cell count a row must exceed to count as valid
pub fn completeness_threshold(column_count: usize) -> usize {
    column_count / 2
}

fn is_filler(record: &Record) -> bool {
    record.cells.iter().all(|cell| match cell {
        None => true,
        Some(value) => matches!(value.trim(), "" | ","),
    })
}

/// Run the cleaning steps over `records`, de-duplicating on `id_idx`
pub fn clean_invoice_data(records: RecordSet, id_idx: usize) -> CleanedRecords {
    let threshold = completeness_threshold(records.column_count());
    let mut valid = records.empty_like();
    let mut crash_entries = records.empty_like();
    let mut blank_rows = 0;
    let mut filler_rows = 0;
    let mut duplicates = 0;
    let mut seen: HashSet<Option<String>> = HashSet::new();

    for record in records.into_records() {
        if record.is_blank() {
            blank_rows += 1;
            continue;
        }

        if record.filled_count() <= threshold {
            crash_entries.push(record);
            continue;
        }

        if is_filler(&record) {
            filler_rows += 1;
            continue;
        }

        // Missing identifiers share a single key
        let key = record.get(id_idx).map(str::to_string);
        if !seen.insert(key) {
            duplicates += 1;
            continue;
        }

        valid.push(record);
    }

    log::debug!(
        "Cleaned records: {} valid, {} crash entries, {} blank, {} filler, {} duplicates (threshold {})",
        valid.len(),
        crash_entries.len(),
        blank_rows,
        filler_rows,
        duplicates,
        threshold
    );

    CleanedRecords {
        valid,
        crash_entries,
        blank_rows,
        filler_rows,
        duplicates,
    }
}
