// ============================================================
// Layer 3 - Record Types
// ============================================================
// A RecordTable is the raw, untyped view of the input file:
// header names plus string cells, exactly as read. The label
// extractor turns it into typed LabeledText rows; nothing else
// in the pipeline touches raw cells.

use serde::{Deserialize, Serialize};

/// A raw table: header row plus string-valued data rows.
#[derive(Debug, Clone)]
pub struct RecordTable {
    /// Column names in file order
    pub headers: Vec<String>,

    /// One entry per data row; each entry has one cell per header
    pub rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One validated sample: free text plus its binary label vector.
/// `labels[i]` is 0 or 1 and refers to the i-th schema category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledText {
    pub text:   String,
    pub labels: Vec<u8>,
}

impl LabeledText {
    pub fn new(text: impl Into<String>, labels: Vec<u8>) -> Self {
        Self { text: text.into(), labels }
    }

    /// Number of categories flagged present in this sample.
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&v| v == 1).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_count() {
        let s = LabeledText::new("call me on 555-0100", vec![0, 1, 0, 1, 1]);
        assert_eq!(s.positive_count(), 3);
    }

    #[test]
    fn test_zero_label_sample() {
        let s = LabeledText::new("nothing sensitive here", vec![0, 0, 0]);
        assert_eq!(s.positive_count(), 0);
    }
}
