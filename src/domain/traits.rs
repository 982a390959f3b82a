// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits instead
// of concrete types, so a source can be swapped without touching
// the pipeline.
//
//   - CsvRecordSource implements RecordSource today
//   - a parquet or database reader could implement it tomorrow

use anyhow::Result;

use crate::domain::record::RecordTable;

/// Any component that can produce the raw input table.
pub trait RecordSource {
    /// Load the full table into memory. The pipeline materializes
    /// everything up front; no streaming.
    fn load(&self) -> Result<RecordTable>;
}
