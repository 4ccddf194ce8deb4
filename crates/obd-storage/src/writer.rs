//! JSON Lines Writer

use crate::{ObdRecord, StorageError};
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// `<VIN>-<YYYYmmddHHMMSS>-utc.json`, or `<VIN>-<TAG>-<...>` when tagged
pub fn output_file_name(vin: &str, tag: Option<&str>, started: DateTime<Utc>) -> String {
    let stamp = started.format("%Y%m%d%H%M%S");
    match tag {
        Some(tag) => format!("{}-{}-{}-utc.json", vin, tag, stamp),
        None => format!("{}-{}-utc.json", vin, stamp),
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Append-only writer for one output file
pub struct JsonLinesWriter {
    path: PathBuf,
    out: BufWriter<File>,
    records: usize,
}

impl JsonLinesWriter {
    /// Create `<base>/<vin>/<file name>`, making directories as needed
    pub fn create(
        base: &Path,
        vin: &str,
        tag: Option<&str>,
        started: DateTime<Utc>,
    ) -> Result<Self, StorageError> {
        let dir = base.join(vin);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Self::open(&dir.join(output_file_name(vin, tag, started)))
    }

    /// Open `path` for appending
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_error(path))?;

        info!("Writing records to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            records: 0,
        })
    }

    /// Append one record and flush it to disk
    pub fn append(&mut self, record: &ObdRecord) -> Result<(), StorageError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n").map_err(io_error(&self.path))?;
        self.out.flush().map_err(io_error(&self.path))?;
        self.records += 1;
        debug!("{}: record {} ({})", self.path.display(), self.records, record.command_name);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this writer
    pub fn records(&self) -> usize {
        self.records
    }
}

/// Read every record back from an output file
pub fn read_records(path: &Path) -> Result<Vec<ObdRecord>, StorageError> {
    let file = File::open(path).map_err(io_error(path))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(io_error(path))?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn started() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            output_file_name("1G1JC5444R7252367", None, started()),
            "1G1JC5444R7252367-20240301123005-utc.json"
        );
        assert_eq!(
            output_file_name("1G1JC5444R7252367", Some("TEST"), started()),
            "1G1JC5444R7252367-TEST-20240301123005-utc.json"
        );
    }

    #[test]
    fn test_append_creates_vin_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonLinesWriter::create(dir.path(), "VIN1", None, started()).unwrap();
        assert_eq!(
            writer.path(),
            dir.path().join("VIN1").join("VIN1-20240301123005-utc.json")
        );

        let pre = started();
        writer
            .append(&ObdRecord::new("SPEED", json!("50.0 kilometer_per_hour"), pre, pre))
            .unwrap();
        writer
            .append(&ObdRecord::new("FUEL_PRESSURE", json!("no response"), pre, pre))
            .unwrap();
        assert_eq!(writer.records(), 2);

        // flushed per record, readable while the writer is still open
        let records = read_records(writer.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].command_name, "FUEL_PRESSURE");
        assert_eq!(records[0].obd_response_value, json!("50.0 kilometer_per_hour"));
    }

    #[test]
    fn test_open_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let record = ObdRecord::new("RPM", json!(null), started(), started());

        JsonLinesWriter::open(&path).unwrap().append(&record).unwrap();
        JsonLinesWriter::open(&path).unwrap().append(&record).unwrap();

        assert_eq!(read_records(&path).unwrap().len(), 2);
    }
}
