// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the CSV table         (Layer 4 - data)
//   Step 2: Extract labels + schema    (Layer 4 - data)
//   Step 3: Load / build tokenizer     (Layer 6 - infra)
//   Step 4: Encode all texts           (Layer 4 - data)
//   Step 5: Split train/validation     (Layer 4 - data)
//   Step 6: Persist config + labels    (Layer 6 - infra)
//   Step 7: Run training + evaluation  (Layer 5 - ml)
//
// Every schema problem surfaces in steps 1-2, before any model
// is built or any training step runs.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{PiiDataset, PiiSample},
    encoder::TokenEncoder,
    extractor::extract_labels,
    loader::CsvRecordSource,
    splitter::{partition, split_indices},
};
use crate::domain::error::TrainError;
use crate::domain::traits::RecordSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::model::EncoderPreset;
use crate::ml::trainer::run_training;

// --- Run Configuration -------------------------------------------------------
// All hyperparameters of one run. Serialisable so the exact run,
// including the resolved seed, can be rebuilt for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub data_path:       String,
    pub text_column:     String,
    pub checkpoint_dir:  String,
    pub encoder:         String,
    pub encoder_weights: Option<String>,
    pub vocab_size:      usize,
    pub max_seq_len:     usize,
    pub batch_size:      usize,
    pub eval_batch_size: usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub dropout:         f64,
    pub train_fraction:  f64,
    pub threshold:       f64,
    pub seed:            u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_path:       "data/pii_samples.csv".to_string(),
            text_column:     "text".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            encoder:         "base-uncased".to_string(),
            encoder_weights: None,
            vocab_size:      30522,
            max_seq_len:     128,
            batch_size:      8,
            eval_batch_size: 16,
            epochs:          4,
            lr:              2e-5,
            dropout:         0.1,
            train_fraction:  0.8,
            threshold:       0.5,
            seed:            42,
        }
    }
}

// --- TrainUseCase ------------------------------------------------------------
pub struct TrainUseCase {
    config: RunConfig,
}

impl TrainUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end.
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // Fail on a bad identifier before touching any data
        let preset = EncoderPreset::resolve(&cfg.encoder)
            .ok_or_else(|| anyhow::anyhow!("unknown encoder identifier '{}'", cfg.encoder))?;

        // -- Step 1: Load the raw table -----------------------------------
        tracing::info!("Loading table from '{}'", cfg.data_path);
        let table = CsvRecordSource::new(&cfg.data_path).load()?;

        // -- Step 2: Extract label schema + binary matrix -----------------
        let extracted = extract_labels(&table, &cfg.text_column)?;
        let schema = extracted.schema;

        // -- Step 3: Load or build the vocabulary -------------------------
        let texts: Vec<String> = extracted
            .samples
            .iter()
            .map(|s| s.text.clone())
            .collect();
        let vocab_store = VocabStore::new(cfg.checkpoint_dir.clone());
        let tokenizer = vocab_store.load_or_build(&texts, cfg.vocab_size, preset.lowercase)?;

        // -- Step 4: Encode every text in one call ------------------------
        let encoder = TokenEncoder::new(tokenizer, cfg.max_seq_len);
        let encoded = encoder.encode_all(&texts)?;
        let samples: Vec<PiiSample> = encoded
            .into_iter()
            .zip(extracted.samples.iter())
            .map(|(row, labelled)| PiiSample {
                input_ids:      row.input_ids,
                attention_mask: row.attention_mask,
                labels:         labelled.labels.clone(),
            })
            .collect();
        tracing::info!("Encoded {} samples at seq_len {}", samples.len(), cfg.max_seq_len);

        // -- Step 5: Seeded train/validation split ------------------------
        let split = split_indices(samples.len(), cfg.train_fraction, cfg.seed);
        if split.train.is_empty() {
            return Err(TrainError::EmptyTrainSplit {
                total:    samples.len(),
                fraction: cfg.train_fraction,
            }
            .into());
        }
        let (train_samples, val_samples) = partition(&samples, &split);
        tracing::info!(
            "Split (seed {}): {} train, {} validation",
            cfg.seed,
            train_samples.len(),
            val_samples.len()
        );

        let train_dataset = PiiDataset::new(train_samples);
        let val_dataset   = PiiDataset::new(val_samples);

        // -- Step 6: Persist config + labels for later evaluation ---------
        let ckpt_manager = CheckpointManager::new(cfg.checkpoint_dir.clone());
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_labels(&schema)?;

        // -- Step 7: Train, evaluate, report ------------------------------
        let report = run_training(cfg, &schema, train_dataset, val_dataset, &ckpt_manager)?;
        report.print(&schema);

        Ok(())
    }
}
