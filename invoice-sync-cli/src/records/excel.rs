//! Read invoice rows from a spreadsheet workbook
//!
//! The first worksheet is read; its first row is the header. Any format
//! calamine can auto-detect is accepted (xlsx, xlsm, xls, xlsb, ods).

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{NaiveDateTime, Timelike};

use super::{Cell, Record, RecordSet};
use crate::error::{SyncError, SyncResult};

/// Read the first worksheet of a workbook into a [`RecordSet`]
pub fn read_record_excel<P: AsRef<Path>>(path: P) -> SyncResult<RecordSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SyncError::FileNotFound(path.to_path_buf()));
    }

    let spreadsheet_err = |message: String| SyncError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| spreadsheet_err("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| spreadsheet_err(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(first) => parse_header(first),
        None => {
            log::debug!("Sheet '{}' in {} is empty", sheet_name, path.display());
            return Ok(RecordSet::default());
        }
    };

    let mut set = RecordSet::new(header, Vec::new());
    for row in rows {
        set.push(Record::new(row.iter().map(cell_text).collect()));
    }

    log::debug!(
        "Read {} rows x {} columns from '{}' in {}",
        set.len(),
        set.column_count(),
        sheet_name,
        path.display()
    );

    Ok(set)
}

/// Header names; blank header cells get a positional placeholder
fn parse_header(row: &[Data]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            cell_text(cell)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Unnamed: {}", idx))
        })
        .collect()
}

/// Convert a cell to its text form, `None` for empty and error cells
fn cell_text(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_float(*f)),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(ndt) => format_datetime(&ndt),
            None => format_float(dt.as_f64()),
        }),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Whole floats are written without a fraction so numeric ids stay digit-only
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1001.0), "1001");
        assert_eq!(format_float(-3.0), "-3");
        assert_eq!(format_float(12.5), "12.5");
        assert_eq!(format_float(0.1), "0.1");
    }

    #[test]
    fn test_format_datetime() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(format_datetime(&date.and_hms_opt(0, 0, 0).unwrap()), "2024-03-01");
        assert_eq!(
            format_datetime(&date.and_hms_opt(13, 5, 9).unwrap()),
            "2024-03-01 13:05:09"
        );
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(String::new())), None);
        assert_eq!(cell_text(&Data::String("Acme".into())), Some("Acme".into()));
        assert_eq!(cell_text(&Data::Int(7)), Some("7".into()));
        assert_eq!(cell_text(&Data::Float(1002.0)), Some("1002".into()));
        assert_eq!(cell_text(&Data::Bool(true)), Some("True".into()));
    }

    #[test]
    fn test_parse_header_fills_blanks() {
        let header = parse_header(&[
            Data::String("InvoiceNo".into()),
            Data::Empty,
            Data::String(" Amount ".into()),
        ]);
        assert_eq!(header, vec!["InvoiceNo", "Unnamed: 1", "Amount"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_record_excel(dir.path().join("nope.xlsx")).unwrap_err();
        assert!(matches!(err, SyncError::FileNotFound(_)));
    }

    #[test]
    fn test_read_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customer.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "InvoiceNo").unwrap();
        sheet.write_string(0, 1, "Customer").unwrap();
        sheet.write_string(0, 2, "Amount").unwrap();
        sheet.write_number(1, 0, 1001.0).unwrap();
        sheet.write_string(1, 1, "Acme").unwrap();
        sheet.write_number(1, 2, 12.5).unwrap();
        sheet.write_number(2, 0, 1002.0).unwrap();
        sheet.write_number(2, 2, 3.0).unwrap();
        workbook.save(&path).unwrap();

        let set = read_record_excel(&path).unwrap();

        assert_eq!(set.header(), &["InvoiceNo", "Customer", "Amount"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0].to_strings(), vec!["1001", "Acme", "12.5"]);
        assert_eq!(set.records()[1].cells, vec![Some("1002".into()), None, Some("3".into())]);
    }
}
