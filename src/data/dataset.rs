use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One fully tokenised and padded training sample.
/// All sequences in a dataset share the same length, and all
/// label vectors share the same category count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels:         Vec<u8>,
}

impl PiiSample {
    /// Number of real (non-padding) tokens.
    pub fn real_token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Immutable, indexable collection of samples.
pub struct PiiDataset {
    samples: Vec<PiiSample>,
}

impl PiiDataset {
    pub fn new(samples: Vec<PiiSample>) -> Self {
        Self { samples }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl Dataset<PiiSample> for PiiDataset {
    fn get(&self, index: usize) -> Option<PiiSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
