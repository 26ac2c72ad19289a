//! Extractor: spreadsheet -> cleaned, de-duplicated CSV of new invoices
//!
//! Writes happen in a fixed order: output CSV (atomic replace), then the
//! processed ledger, then the crash ledger. When no new invoices remain
//! nothing is written at all.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::SyncResult;
use crate::ledger::Ledger;
use crate::records::{
    CleanedRecords, RecordSet, clean_invoice_data, read_record_csv, read_record_excel,
    write_record_csv,
};

/// Counts from the cleaning step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanStats {
    pub valid: usize,
    pub crash_entries: usize,
    pub blank_rows: usize,
    pub filler_rows: usize,
    pub duplicates: usize,
    /// Valid rows skipped because the processed ledger already has them
    pub already_processed: usize,
}

/// What a completed extraction wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub stats: CleanStats,
    pub new_records: usize,
    pub processed_ids_appended: usize,
    pub crash_ids_appended: usize,
    /// Rows found when reading the output back
    pub readback_rows: usize,
    pub readback_elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// Every valid invoice is already in the processed ledger; nothing written
    NothingToDo(CleanStats),
    Written(ExtractSummary),
}

pub struct Extractor<'a> {
    config: &'a Config,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    fn processed_ledger(&self) -> Ledger {
        Ledger::processed(&self.config.processed_ledger)
    }

    fn crash_ledger(&self) -> Ledger {
        Ledger::crashes(&self.config.crash_ledger)
    }

    /// Run the whole extraction
    pub fn run(&self) -> SyncResult<ExtractOutcome> {
        let source = &self.config.source_file;
        let records = read_record_excel(source)?;
        let id_idx = records.require_column(&self.config.id_column, source)?;

        let CleanedRecords {
            valid,
            crash_entries,
            blank_rows,
            filler_rows,
            duplicates,
        } = clean_invoice_data(records, id_idx);

        let ledger = self.processed_ledger();
        let processed = ledger.load()?;
        log::debug!(
            "{} invoices already recorded in {}",
            processed.len(),
            ledger.path().display()
        );
        let new_records = select_new(valid.clone(), id_idx, |id| processed.contains(id));

        let stats = CleanStats {
            valid: valid.len(),
            crash_entries: crash_entries.len(),
            blank_rows,
            filler_rows,
            duplicates,
            already_processed: valid.len() - new_records.len(),
        };

        if new_records.is_empty() {
            log::info!("No new invoices in {}", source.display());
            return Ok(ExtractOutcome::NothingToDo(stats));
        }

        write_record_csv(&new_records, &self.config.csv_file)?;

        let processed_ids_appended = ledger.append(&new_records.column_values(id_idx))?;
        let crash_ids_appended = self
            .crash_ledger()
            .append(&crash_entries.column_values(id_idx))?;

        let started = Instant::now();
        let readback = read_record_csv(&self.config.csv_file)?;
        let readback_elapsed = started.elapsed();

        log::info!(
            "Extracted {} new invoices from {} into {}",
            new_records.len(),
            source.display(),
            self.config.csv_file.display()
        );

        Ok(ExtractOutcome::Written(ExtractSummary {
            stats,
            new_records: new_records.len(),
            processed_ids_appended,
            crash_ids_appended,
            readback_rows: readback.len(),
            readback_elapsed,
        }))
    }
}

/// Keep records whose identifier is not already known
///
/// Records without an identifier are never known, so they are always kept.
fn select_new<F>(mut records: RecordSet, id_idx: usize, known: F) -> RecordSet
where
    F: Fn(&str) -> bool,
{
    records.retain(|r| !r.get(id_idx).is_some_and(|id| known(id)));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::ledger::load_invoice_ids;
    use rust_xlsxwriter::Workbook;
    use std::collections::HashSet;
    use std::path::Path;

    fn write_workbook(path: &Path, header: &[&str], rows: &[&[&str]]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in header.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let (r, c) = ((r + 1) as u32, c as u16);
                match value.parse::<f64>() {
                    Ok(n) => sheet.write_number(r, c, n).unwrap(),
                    Err(_) => sheet.write_string(r, c, *value).unwrap(),
                };
            }
        }
        workbook.save(path).unwrap();
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            source_file: dir.join("customer.xlsx"),
            csv_file: dir.join("customer.csv"),
            processed_ledger: dir.join("processed_invoices.txt"),
            crash_ledger: dir.join("crash_entries.txt"),
            log_file: dir.join("process.log"),
            ..Config::default()
        }
    }

    fn id_set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const HEADER: &[&str] = &["InvoiceNo", "Customer", "Amount", "Date"];

    #[test]
    fn test_first_run_writes_output_and_ledgers() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_workbook(
            &config.source_file,
            HEADER,
            &[
                &["1001", "Acme", "10", "2024-01-01"],
                &["1002", "Globex", "20", "2024-01-02"],
                &["1001", "Acme", "10", "2024-01-01"],
                &["", "", "", ""],
                &["1003", "", "", ""],
            ],
        );

        let outcome = Extractor::new(&config).run().unwrap();

        let ExtractOutcome::Written(summary) = outcome else {
            panic!("expected output to be written");
        };
        assert_eq!(summary.new_records, 2);
        assert_eq!(summary.processed_ids_appended, 2);
        assert_eq!(summary.readback_rows, 2);
        assert_eq!(summary.stats.duplicates, 1);
        assert_eq!(summary.stats.crash_entries, 1);
        assert_eq!(summary.crash_ids_appended, 1);

        let csv = read_record_csv(&config.csv_file).unwrap();
        assert_eq!(csv.header(), HEADER);
        assert_eq!(csv.column_values(0), vec!["1001", "1002"]);

        assert_eq!(load_invoice_ids(&config.processed_ledger).unwrap(), id_set(&["1001", "1002"]));
        assert_eq!(load_invoice_ids(&config.crash_ledger).unwrap(), id_set(&["1003"]));
    }

    #[test]
    fn test_only_unseen_invoices_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        Ledger::processed(&config.processed_ledger)
            .append(&["1001".to_string(), "1002".to_string()])
            .unwrap();
        write_workbook(
            &config.source_file,
            HEADER,
            &[
                &["1002", "Globex", "20", "2024-01-02"],
                &["1003", "Initech", "30", "2024-01-03"],
            ],
        );

        Extractor::new(&config).run().unwrap();

        let csv = read_record_csv(&config.csv_file).unwrap();
        assert_eq!(csv.column_values(0), vec!["1003"]);
        assert_eq!(
            load_invoice_ids(&config.processed_ledger).unwrap(),
            id_set(&["1001", "1002", "1003"])
        );
        let ledger = std::fs::read_to_string(&config.processed_ledger).unwrap();
        assert!(ledger.contains("(Total: 1) = .-\n\n\n1003\n\n"));
    }

    #[test]
    fn test_rerun_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_workbook(
            &config.source_file,
            HEADER,
            &[&["1001", "Acme", "10", "2024-01-01"], &["1004", "", "", ""]],
        );

        Extractor::new(&config).run().unwrap();
        let processed = std::fs::read(&config.processed_ledger).unwrap();
        let crashes = std::fs::read(&config.crash_ledger).unwrap();
        let output = std::fs::read(&config.csv_file).unwrap();

        let outcome = Extractor::new(&config).run().unwrap();

        let ExtractOutcome::NothingToDo(stats) = outcome else {
            panic!("second run should have nothing to do");
        };
        assert_eq!(stats.already_processed, 1);
        assert_eq!(std::fs::read(&config.processed_ledger).unwrap(), processed);
        assert_eq!(std::fs::read(&config.crash_ledger).unwrap(), crashes);
        assert_eq!(std::fs::read(&config.csv_file).unwrap(), output);
    }

    #[test]
    fn test_output_is_replaced_not_merged() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        write_workbook(&config.source_file, HEADER, &[&["1001", "Acme", "10", "2024-01-01"]]);
        Extractor::new(&config).run().unwrap();

        write_workbook(
            &config.source_file,
            HEADER,
            &[&["1001", "Acme", "10", "2024-01-01"], &["1005", "Hooli", "50", "2024-02-01"]],
        );
        Extractor::new(&config).run().unwrap();

        let csv = read_record_csv(&config.csv_file).unwrap();
        assert_eq!(csv.column_values(0), vec!["1005"]);
    }

    #[test]
    fn test_missing_identifier_column() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_workbook(&config.source_file, &["Invoice", "Customer"], &[&["1", "Acme"]]);

        let err = Extractor::new(&config).run().unwrap_err();

        assert!(matches!(err, SyncError::Schema { .. }));
        assert!(!config.csv_file.exists());
        assert!(!config.processed_ledger.exists());
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let err = Extractor::new(&config).run().unwrap_err();
        assert!(matches!(err, SyncError::FileNotFound(_)));
    }

    #[test]
    fn test_select_new_keeps_rows_without_identifier() {
        let set = RecordSet::new(
            vec!["InvoiceNo".into(), "Customer".into()],
            vec![
                crate::records::Record::from_strings(["1001", "a"]),
                crate::records::Record::from_strings(["", "b"]),
                crate::records::Record::from_strings(["1002", "c"]),
            ],
        );
        let known = id_set(&["1001"]);

        let selected = select_new(set, 0, |id| known.contains(id));

        assert_eq!(selected.len(), 2);
        assert_eq!(selected.records()[0].get(1), Some("b"));
    }
}
