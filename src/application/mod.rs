// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - no ML math or model code here
//   - no argument parsing here (that is Layer 1)
//   - only workflow coordination

// The training workflow
pub mod train_use_case;

// The checkpoint re-evaluation workflow
pub mod eval_use_case;
