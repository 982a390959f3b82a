// ============================================================
// Layer 4 - Label Extractor
// ============================================================
// Turns the raw RecordTable into typed training rows:
//
//   - the text column (by name) supplies the sample text
//   - every other column, in header order, is a label category
//   - each label cell must be exactly 0 or 1
//
// Header order is preserved into the LabelSchema, so label index
// i means the same category everywhere downstream. Any deviation
// is a SchemaError and aborts before training starts.

use crate::domain::error::SchemaError;
use crate::domain::labels::LabelSchema;
use crate::domain::record::{LabeledText, RecordTable};

/// Extracted view of a table: the schema plus one labelled row
/// per input row.
#[derive(Debug, Clone)]
pub struct ExtractedRows {
    pub schema:  LabelSchema,
    pub samples: Vec<LabeledText>,
}

/// Split a table into text + binary label matrix.
///
/// `text_column` names the free-text column; all remaining
/// columns become label categories in header order.
pub fn extract_labels(
    table:       &RecordTable,
    text_column: &str,
) -> Result<ExtractedRows, SchemaError> {
    let text_idx = table
        .headers
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| SchemaError::MissingTextColumn {
            column: text_column.to_string(),
        })?;

    // Label columns: everything except the text column, file order
    let label_indices: Vec<usize> = (0..table.headers.len())
        .filter(|&i| i != text_idx)
        .collect();
    if label_indices.is_empty() {
        return Err(SchemaError::NoLabelColumns {
            text_column: text_column.to_string(),
        });
    }

    let names: Vec<String> = label_indices
        .iter()
        .map(|&i| table.headers[i].clone())
        .collect();
    let schema = LabelSchema::new(names);

    let mut samples = Vec::with_capacity(table.rows.len());
    for (row_no, row) in table.rows.iter().enumerate() {
        let mut labels = Vec::with_capacity(label_indices.len());
        for &col in &label_indices {
            let value = row[col].trim();
            match value {
                "0" => labels.push(0u8),
                "1" => labels.push(1u8),
                other => {
                    return Err(SchemaError::NonBinaryValue {
                        column: table.headers[col].clone(),
                        row:    row_no + 1,
                        value:  other.to_string(),
                    });
                }
            }
        }
        samples.push(LabeledText::new(row[text_idx].clone(), labels));
    }

    tracing::info!(
        "Extracted {} samples with {} label categories: {:?}",
        samples.len(),
        schema.len(),
        schema.names()
    );
    Ok(ExtractedRows { schema, samples })
}
