// ============================================================
// Layer 3 - Label Schema
// ============================================================
// The ordered list of PII category names. Column order in the
// input table IS the label order: index i in every label vector,
// logit row, and confusion matrix refers to names[i]. A model
// trained against one schema can only be reused with a table
// that reproduces the same names in the same order.

use serde::{Deserialize, Serialize};

use crate::domain::error::SchemaError;

/// Ordered PII label categories for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSchema {
    names: Vec<String>,
}

impl LabelSchema {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Number of label categories (L).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Category names in label-index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Check that `other` (freshly extracted from a table) matches
    /// this persisted schema exactly: same count, same names, same
    /// order. Mismatched count is fatal at head construction;
    /// mismatched names would silently scramble label meanings.
    pub fn ensure_matches(&self, other: &LabelSchema) -> Result<(), SchemaError> {
        if self.len() != other.len() {
            return Err(SchemaError::LabelCountMismatch {
                expected: self.len(),
                found:    other.len(),
            });
        }
        for (saved, found) in self.names.iter().zip(other.names.iter()) {
            if saved != found {
                return Err(SchemaError::LabelSetMismatch {
                    saved: saved.clone(),
                    found: found.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> LabelSchema {
        LabelSchema::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_matching_schemas_pass() {
        let a = schema(&["email", "phone", "address"]);
        let b = schema(&["email", "phone", "address"]);
        assert!(a.ensure_matches(&b).is_ok());
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let a = schema(&["email", "phone"]);
        let b = schema(&["email", "phone", "address"]);
        match a.ensure_matches(&b) {
            Err(SchemaError::LabelCountMismatch { expected: 2, found: 3 }) => {}
            other => panic!("expected LabelCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_reordered_names_are_rejected() {
        let a = schema(&["email", "phone"]);
        let b = schema(&["phone", "email"]);
        assert!(a.ensure_matches(&b).is_err());
    }
}
