// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the raw CSV table to GPU-ready tensor batches.
//
//   CSV file
//       |
//       v
//   CsvRecordSource  -> reads header + string rows
//       |
//       v
//   extractor        -> label schema + (text, binary vector) rows
//       |
//       v
//   TokenEncoder     -> fixed-length (input_ids, attention_mask)
//       |
//       v
//   splitter         -> seeded train / validation partition
//       |
//       v
//   PiiDataset       -> implements Burn's Dataset trait
//       |
//       v
//   PiiBatcher       -> stacks samples into tensor batches
//       |
//       v
//   DataLoader       -> feeds batches to the training loop
//
// Each module is responsible for exactly one step.

/// Loads the CSV input table
pub mod loader;

/// Turns raw table rows into a label schema + binary label matrix
pub mod extractor;

/// Tokenizer adapter: text to fixed-shape id/mask sequences
pub mod encoder;

/// Implements Burn's Dataset trait for labelled PII samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Seeded shuffle-and-split into train/validation index sets
pub mod splitter;
