// ============================================================
// Layer 5 - Compute Context
// ============================================================
// Seam between the training loop and the device topology. The
// loop never asks how many replicas exist; it scatters a batch,
// collects one loss tensor per replica, and reduces them to a
// single scalar before the backward pass. With one replica the
// scatter is the identity and the reduction is a no-op mean.
//
// The model itself is never wrapped or duplicated here, so the
// parameter snapshot handed to the checkpoint layer is always
// directly serializable.

use burn::prelude::*;

use crate::data::batcher::PiiBatch;

/// Replication policy the training loop is written against.
pub trait ComputeContext<B: Backend> {
    /// Number of replicas a batch is spread across.
    fn replica_count(&self) -> usize;

    /// Split one batch into per-replica sub-batches. Every sample
    /// appears in exactly one sub-batch; empty chunks are skipped
    /// when the batch is smaller than the replica count.
    fn scatter(&self, batch: PiiBatch<B>) -> Vec<PiiBatch<B>>;

    /// Reduce per-replica scalar losses to a single scalar; the
    /// backward pass runs on the reduced value.
    fn reduce(&self, losses: Vec<Tensor<B, 1>>) -> Tensor<B, 1>;
}

/// Default context: one device, one replica.
#[derive(Debug, Clone, Default)]
pub struct SingleDevice;

impl<B: Backend> ComputeContext<B> for SingleDevice {
    fn replica_count(&self) -> usize {
        1
    }

    fn scatter(&self, batch: PiiBatch<B>) -> Vec<PiiBatch<B>> {
        vec![batch]
    }

    fn reduce(&self, losses: Vec<Tensor<B, 1>>) -> Tensor<B, 1> {
        mean_losses(losses)
    }
}

/// Splits each batch into `replicas` contiguous chunks and
/// averages their losses. Chunks run on the same device; the
/// type exists to exercise the scatter/reduce path and as the
/// template for a true multi-device context.
#[derive(Debug, Clone)]
pub struct ChunkedReplicas {
    pub replicas: usize,
}

impl ChunkedReplicas {
    pub fn new(replicas: usize) -> Self {
        Self { replicas: replicas.max(1) }
    }
}

impl<B: Backend> ComputeContext<B> for ChunkedReplicas {
    fn replica_count(&self) -> usize {
        self.replicas
    }

    fn scatter(&self, batch: PiiBatch<B>) -> Vec<PiiBatch<B>> {
        let total = batch.batch_size();
        if self.replicas <= 1 || total <= 1 {
            return vec![batch];
        }

        let chunk = total.div_ceil(self.replicas);
        let mut out = Vec::with_capacity(self.replicas);
        let mut start = 0;
        while start < total {
            let end = (start + chunk).min(total);
            out.push(PiiBatch {
                input_ids:      batch.input_ids.clone().slice([start..end]),
                attention_mask: batch.attention_mask.clone().slice([start..end]),
                labels:         batch.labels.clone().slice([start..end]),
            });
            start = end;
        }
        out
    }

    fn reduce(&self, losses: Vec<Tensor<B, 1>>) -> Tensor<B, 1> {
        mean_losses(losses)
    }
}

fn mean_losses<B: Backend>(losses: Vec<Tensor<B, 1>>) -> Tensor<B, 1> {
    Tensor::cat(losses, 0).mean()
}
