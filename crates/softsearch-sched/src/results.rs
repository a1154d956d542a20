use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use softsearch_core::errors::{ErrorInfo, SwsError};

/// Column header every results file starts with.
pub const RESULTS_HEADER: [&str; 8] = [
    "application",
    "job_id",
    "ranks",
    "input",
    "start_time",
    "duration",
    "input_config",
    "hpctoolkit_path",
];

/// One completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub application: String,
    pub job_id: String,
    pub ranks: u32,
    pub input: String,
    pub start_time: String,
    pub duration: f64,
    pub input_config: String,
    pub hpctoolkit_path: String,
}

/// Append-only CSV file collecting run results.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the file and writes the header row.
    pub fn initialize(&self) -> Result<(), SwsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error("results-mkdir", err))?;
        }
        let file = File::create(&self.path).map_err(|err| self.io_error("results-create", err))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(RESULTS_HEADER)
            .map_err(|err| self.csv_error("results-write-header", err))?;
        writer
            .flush()
            .map_err(|err| self.io_error("results-flush", err))
    }

    /// Appends one row after the existing content.
    pub fn append(&self, row: &ResultRow) -> Result<(), SwsError> {
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|err| self.io_error("results-open", err))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .serialize(row)
            .map_err(|err| self.csv_error("results-write-row", err))?;
        writer
            .flush()
            .map_err(|err| self.io_error("results-flush", err))
    }

    /// Reads all rows below the header.
    pub fn rows(&self) -> Result<Vec<ResultRow>, SwsError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|err| self.csv_error("results-open", err))?;
        reader
            .deserialize()
            .collect::<Result<Vec<ResultRow>, _>>()
            .map_err(|err| self.csv_error("results-read-row", err))
    }

    fn io_error(&self, code: &str, err: std::io::Error) -> SwsError {
        SwsError::Serde(
            ErrorInfo::new(code, err.to_string()).with_path(&self.path),
        )
    }

    fn csv_error(&self, code: &str, err: csv::Error) -> SwsError {
        SwsError::Serde(
            ErrorInfo::new(code, err.to_string()).with_path(&self.path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(job_id: &str) -> ResultRow {
        ResultRow {
            application: "laghos".into(),
            job_id: job_id.into(),
            ranks: 64,
            input: "-p 1, -dim 3".into(),
            start_time: "2021-07-20T10:00:00".into(),
            duration: 12.5,
            input_config: "{\"ranks\":64}".into(),
            hpctoolkit_path: String::new(),
        }
    }

    #[test]
    fn initialize_truncates_and_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultsFile::new(dir.path().join("out/data.csv"));
        results.initialize().unwrap();
        results.append(&row("1")).unwrap();
        results.initialize().unwrap();
        let text = fs::read_to_string(results.path()).unwrap();
        assert_eq!(
            text,
            "application,job_id,ranks,input,start_time,duration,input_config,hpctoolkit_path\n"
        );
    }

    #[test]
    fn appended_rows_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let results = ResultsFile::new(dir.path().join("data.csv"));
        results.initialize().unwrap();
        results.append(&row("11")).unwrap();
        results.append(&row("12")).unwrap();
        let rows = results.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].job_id, "12");
        assert_eq!(rows[0].input, "-p 1, -dim 3");
    }
}
