//! Binary cross-entropy with logits for multi-label targets.
//!
//! Each of the L outputs is an independent binary decision, so the
//! loss is the elementwise BCE between `sigmoid(logits)` and the
//! 0/1 target matrix, averaged over every batch x label position.
//!
//! Computed directly from logits in the numerically stable form
//!
//! ```text
//! L_i = max(x_i, 0) - x_i * t_i + ln(1 + exp(-|x_i|))
//! ```
//!
//! which never overflows for large |x| and is exact for moderate x.

use burn::prelude::*;

/// Mean elementwise BCE over a `(batch, num_labels)` logit matrix.
///
/// Targets must hold 0.0/1.0 values of the same shape. Returns a
/// scalar tensor of shape `(1,)`.
pub fn bce_with_logits<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let relu_term = logits.clone().clamp_min(0.0);
    let prod_term = logits.clone() * targets;
    let log_term  = logits.abs().neg().exp().add_scalar(1.0).log();

    (relu_term - prod_term + log_term).mean()
}
