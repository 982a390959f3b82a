// ============================================================
// Layer 4 - PII Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<PiiSample>
// into stacked tensors.
//
// Input:  Vec of N samples, each with sequences of length S and
//         label vectors of length L (pre-padded, pre-validated)
// Output: PiiBatch with
//           input_ids      [N, S]  Int
//           attention_mask [N, S]  Int
//           labels         [N, L]  Float (0.0 / 1.0 targets)
//
// All rows were already padded to the same length by the token
// encoder, so batching is flatten + reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::PiiSample;

// --- PiiBatch ----------------------------------------------------------------
/// A batch of samples ready for the model forward pass.
/// B is the Burn Backend (e.g. Wgpu, NdArray), generic so the
/// same batcher works for training and evaluation backends.
#[derive(Debug, Clone)]
pub struct PiiBatch<B: Backend> {
    /// Token id sequences, shape [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks, shape [batch_size, seq_len]; 1 = real token
    pub attention_mask: Tensor<B, 2, Int>,

    /// Binary label targets as floats, shape [batch_size, num_labels]
    pub labels: Tensor<B, 2>,
}

impl<B: Backend> PiiBatch<B> {
    pub fn batch_size(&self) -> usize {
        self.input_ids.dims()[0]
    }
}

// --- PiiBatcher --------------------------------------------------------------
/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct PiiBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> PiiBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<PiiSample, PiiBatch<B>> for PiiBatcher<B> {
    fn batch(&self, items: Vec<PiiSample>) -> PiiBatch<B> {
        let batch_size = items.len();
        // All sequences share one length, all label vectors another
        let seq_len    = items[0].input_ids.len();
        let num_labels = items[0].labels.len();

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let label_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.labels.iter().map(|&x| x as f32))
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(mask_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);

        let labels = Tensor::<B, 1>::from_floats(label_flat.as_slice(), &self.device)
            .reshape([batch_size, num_labels]);

        PiiBatch { input_ids, attention_mask, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn sample(ids: Vec<u32>, mask: Vec<u32>, labels: Vec<u8>) -> PiiSample {
        PiiSample { input_ids: ids, attention_mask: mask, labels }
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = PiiBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![
            sample(vec![4, 7, 0], vec![1, 1, 0], vec![1, 0]),
            sample(vec![9, 0, 0], vec![1, 0, 0], vec![0, 1]),
        ]);
        assert_eq!(batch.input_ids.dims(), [2, 3]);
        assert_eq!(batch.attention_mask.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2, 2]);
        assert_eq!(batch.batch_size(), 2);
    }

    #[test]
    fn test_labels_become_zero_one_floats() {
        let device = Default::default();
        let batcher = PiiBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![sample(vec![4], vec![1], vec![1, 0, 1])]);
        let values: Vec<f32> = batch.labels.into_data().to_vec().unwrap();
        assert_eq!(values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_row_order_is_preserved() {
        let device = Default::default();
        let batcher = PiiBatcher::<TestBackend>::new(device);
        let batch = batcher.batch(vec![
            sample(vec![11, 12], vec![1, 1], vec![0]),
            sample(vec![21, 22], vec![1, 1], vec![1]),
        ]);
        let ids: Vec<i64> = batch.input_ids.into_data().to_vec().unwrap();
        assert_eq!(ids, vec![11, 12, 21, 22]);
    }
}
