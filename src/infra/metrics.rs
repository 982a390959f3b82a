// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Appends one CSV row per epoch so a run can be inspected after
// the fact:
//
//   epoch,train_loss,macro_f1,flat_accuracy
//
// Output file: {checkpoint_dir}/metrics.csv. The header is only
// written when the file is new, so restarted runs append.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single training epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number, starting at 1
    pub epoch: usize,

    /// Mean training loss over the epoch's batches
    pub train_loss: f64,

    /// Validation macro F1 in percent
    pub macro_f1: f64,

    /// Validation flat (exact-match) accuracy in percent
    pub flat_accuracy: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, macro_f1: f64, flat_accuracy: f64) -> Self {
        Self { epoch, train_loss, macro_f1, flat_accuracy }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file does
    /// not exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,macro_f1,flat_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{:.6},{:.4},{:.4}",
            m.epoch, m.train_loss, m.macro_f1, m.flat_accuracy,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, macro_f1={:.2}",
            m.epoch,
            m.train_loss,
            m.macro_f1,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// --- Unit Tests --------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().to_str().unwrap()).unwrap();
        logger.log(&EpochMetrics::new(1, 0.6931, 12.5, 3.0)).unwrap();
        logger.log(&EpochMetrics::new(2, 0.5012, 40.0, 11.0)).unwrap();

        let content = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,macro_f1,flat_accuracy");
        assert!(lines[1].starts_with("1,0.693100"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_reopening_appends_without_new_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        MetricsLogger::new(path).unwrap().log(&EpochMetrics::new(1, 0.5, 1.0, 1.0)).unwrap();
        MetricsLogger::new(path).unwrap().log(&EpochMetrics::new(2, 0.4, 2.0, 2.0)).unwrap();

        let content = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(content.matches("epoch,").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }
}
