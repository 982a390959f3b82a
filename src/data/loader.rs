// ============================================================
// Layer 4 - Table Loader
// ============================================================
// Reads the input CSV into a RecordTable. The file must carry a
// header row; every cell is kept as a string, validation happens
// in the extractor. Ragged rows are a hard error here because a
// shifted cell would silently move labels between columns.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::error::SchemaError;
use crate::domain::record::RecordTable;
use crate::domain::traits::RecordSource;

/// Loads a CSV table from a single file path.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvRecordSource {
    path: PathBuf,
}

impl CsvRecordSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl RecordSource for CsvRecordSource {
    fn load(&self) -> Result<RecordTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("cannot open table '{}'", self.path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("cannot read header of '{}'", self.path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("cannot parse row {} of '{}'", i + 1, self.path.display()))?;
            if record.len() != headers.len() {
                return Err(SchemaError::RaggedRow {
                    row:      i + 1,
                    expected: headers.len(),
                    found:    record.len(),
                }
                .into());
            }
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        tracing::info!(
            "Loaded table '{}': {} rows, {} columns",
            self.path.display(),
            rows.len(),
            headers.len()
        );
        Ok(RecordTable::new(headers, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("tempfile");
        f.write_all(content.as_bytes()).expect("write");
        f
    }

    #[test]
    fn test_loads_header_and_rows() {
        let f = write_csv("text,email,phone\nhello,0,1\nworld,1,0\n");
        let table = CsvRecordSource::new(f.path()).load().unwrap();
        assert_eq!(table.headers, vec!["text", "email", "phone"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0], vec!["hello", "0", "1"]);
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        // csv itself flags unequal field counts; either way it must error
        let f = write_csv("text,email\nhello,0\nbroken\n");
        assert!(CsvRecordSource::new(f.path()).load().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = CsvRecordSource::new("/does/not/exist.csv").load();
        assert!(err.is_err());
    }
}
