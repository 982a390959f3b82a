// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Two failure families with different propagation rules:
//
//   SchemaError - the input table or a persisted run disagrees
//                 with what the pipeline expects. Always fatal,
//                 raised before the first training step.
//
//   TrainError  - the training loop itself went wrong. A
//                 non-finite loss aborts the run immediately
//                 rather than corrupting parameters further.
//
// Recoverable metric edge cases (a label with no positives at
// all) are NOT errors: the evaluator degrades them to a defined
// value and logs a warning.

use thiserror::Error;

/// Input table / persisted-run schema violations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The configured text column is not in the table header.
    #[error("text column '{column}' not found in table header")]
    MissingTextColumn { column: String },

    /// The table has a text column but no label columns at all.
    #[error("table has no label columns besides '{text_column}'")]
    NoLabelColumns { text_column: String },

    /// A label cell held something other than 0 or 1.
    #[error("label column '{column}' row {row}: value '{value}' is not 0 or 1")]
    NonBinaryValue {
        column: String,
        row:    usize,
        value:  String,
    },

    /// A row had a different field count than the header.
    #[error("row {row} has {found} fields, header has {expected}")]
    RaggedRow {
        row:      usize,
        expected: usize,
        found:    usize,
    },

    /// A saved model head disagrees with the current label count.
    #[error("saved model expects {expected} labels, table provides {found}")]
    LabelCountMismatch { expected: usize, found: usize },

    /// Same label count but different category names or order.
    #[error("label column set differs from the saved run (first mismatch: '{saved}' vs '{found}')")]
    LabelSetMismatch { saved: String, found: String },
}

/// Training-loop failures.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Loss became NaN or infinite. Continuing would corrupt the
    /// parameters, so the run halts here.
    #[error("non-finite loss {value} at epoch {epoch}, step {step}")]
    NonFiniteLoss {
        epoch: usize,
        step:  usize,
        value: f64,
    },

    /// The training split ended up empty, nothing to fit.
    #[error("training split is empty (dataset of {total} samples, fraction {fraction})")]
    EmptyTrainSplit { total: usize, fraction: f64 },
}
