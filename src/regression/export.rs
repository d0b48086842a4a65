//! Append-mode JSON exports.
//!
//! Each call appends one JSON document on its own line, so repeated runs
//! accumulate records in the same file and `read_exports` returns them in
//! write order.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub const SECRET_KEY_FILE: &str = "secret_key.txt";
pub const PUBLIC_KEY_FILE: &str = "public_key.txt";
pub const ENCRYPTED_DATA_FILE: &str = "encrypted_data.txt";
pub const RAW_DATA_FILE: &str = "raw_data.txt";

/// Append `value` as one line of JSON, creating the file if needed.
pub fn append_export<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    file.write_all(&line)?;
    Ok(())
}

/// Every record in an export file, oldest first.
pub fn read_exports<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// The four export files inside one directory.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    dir: PathBuf,
}

impl ExportPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn secret_key(&self) -> PathBuf {
        self.dir.join(SECRET_KEY_FILE)
    }

    pub fn public_key(&self) -> PathBuf {
        self.dir.join(PUBLIC_KEY_FILE)
    }

    pub fn encrypted_data(&self) -> PathBuf {
        self.dir.join(ENCRYPTED_DATA_FILE)
    }

    pub fn raw_data(&self) -> PathBuf {
        self.dir.join(RAW_DATA_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_accumulates_records() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::new(dir.path());
        let raw = paths.raw_data();

        append_export(&raw, &vec![vec![1i64, 2], vec![3, 4]]).unwrap();
        append_export(&raw, &vec![vec![5i64, 6]]).unwrap();

        let records: Vec<Vec<Vec<i64>>> = read_exports(&raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], vec![vec![1, 2], vec![3, 4]]);
        assert_eq!(records[1], vec![vec![5, 6]]);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ExportPaths::new(dir.path()).secret_key();
        let err = read_exports::<u64>(&missing).unwrap_err();
        assert!(matches!(err, crate::error::RegressionError::Io(_)));
    }
}
