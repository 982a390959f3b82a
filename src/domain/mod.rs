// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Pure Rust types and traits shared by every other layer.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O or ML code
//   - Only plain structs, enums, and traits

/// Raw tabular records and labelled text rows
pub mod record;

/// Ordered PII label categories and schema checks
pub mod labels;

/// Error taxonomy: schema violations and training failures
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
