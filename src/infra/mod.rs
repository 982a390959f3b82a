// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs  - model weight blobs per epoch, the latest
//                    pointer, the run config and label schema
//                    JSON needed to rebuild the model later
//
//   vocab_store.rs - vocabulary resource management: load a
//                    tokenizer file, or build and persist a
//                    word-level vocabulary so training and
//                    evaluation share one token table
//
//   metrics.rs     - per-epoch metrics CSV logger

/// Model checkpoint, run config, and label schema persistence
pub mod checkpoint;

/// Tokenizer vocabulary loading and building
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
