//! Comma-separated output file shared between extract and publish

use std::path::Path;

use csv::{ReaderBuilder, Writer};
use tempfile::NamedTempFile;

use super::{Record, RecordSet};
use crate::error::{SyncError, SyncResult};

/// Replace `path` with header + records
///
/// The file is written to a temporary sibling and renamed into place, so a
/// reader never observes a partially written file.
pub fn write_record_csv<P: AsRef<Path>>(set: &RecordSet, path: P) -> SyncResult<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut wtr = Writer::from_writer(tmp.as_file_mut());
        wtr.write_record(set.header())?;
        for record in set.records() {
            wtr.write_record(record.to_strings())?;
        }
        wtr.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SyncError::Io(e.error))?;

    log::debug!("Wrote {} records to {}", set.len(), path.display());
    Ok(())
}

/// Read a CSV file written by [`write_record_csv`]
///
/// Empty fields come back as missing cells. A file with no header row is an
/// [`SyncError::EmptyInput`].
pub fn read_record_csv<P: AsRef<Path>>(path: P) -> SyncResult<RecordSet> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SyncError::FileNotFound(path.to_path_buf()));
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if header.is_empty() {
        return Err(SyncError::EmptyInput(format!("{} is empty", path.display())));
    }

    let mut set = RecordSet::new(header, Vec::new());
    for row in rdr.records() {
        let row = row?;
        set.push(Record::from_strings(row.iter()));
    }

    Ok(set)
}
