// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All Burn framework specific code lives here. No other layer
// imports from burn directly except the data batcher.
//
//   model.rs     - the transformer encoder trunk (token and
//                  position embeddings, multi-head attention
//                  blocks, GELU feed-forward, layer norm) with
//                  mask-aware mean pooling and the multi-label
//                  classification head; encoder presets
//
//   loss.rs      - numerically stable multi-label BCE on logits
//
//   decay.rs     - weight-decay parameter grouping fixed at
//                  model-build time, plus the decoupled decay
//                  step applied before each optimizer update
//
//   context.rs   - compute-context seam (replica count, batch
//                  scatter, loss reduction) the training loop is
//                  written against
//
//   trainer.rs   - the epoch/batch training loop with Adam,
//                  per-epoch reporting and checkpointing
//
//   evaluator.rs - thresholded multi-label evaluation: per-label
//                  confusion matrices, macro F1, flat accuracy

/// Transformer encoder trunk + classification head
pub mod model;

/// Multi-label binary cross-entropy on logits
pub mod loss;

/// Weight-decay parameter groups and the decay step
pub mod decay;

/// Replication seam between trainer and device topology
pub mod context;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Validation metrics: confusion matrices, macro F1, flat accuracy
pub mod evaluator;
