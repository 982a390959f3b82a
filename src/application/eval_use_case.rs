// ============================================================
// Layer 2 - EvalUseCase
// ============================================================
// Re-evaluates a finished run from its persisted artefacts:
//
//   1. load run_config.json and labels.json
//   2. reload the table and re-extract labels; the schema must
//      match the saved one exactly (count, names, order)
//   3. load the persisted tokenizer and re-encode
//   4. rebuild the same seeded split and keep the validation side
//   5. rebuild the model, load the latest parameter blob
//   6. evaluate and print the report
//
// Because the split seed, the tokenizer, and the threshold are
// all persisted, this reproduces the metrics of the training run
// that saved the blob.

use anyhow::Result;

use crate::data::{
    dataset::{PiiDataset, PiiSample},
    encoder::TokenEncoder,
    extractor::extract_labels,
    loader::CsvRecordSource,
    splitter::{partition, split_indices},
};
use crate::domain::traits::RecordSource;
use crate::infra::{checkpoint::CheckpointManager, vocab_store::VocabStore};
use crate::ml::evaluator::run_evaluation;

pub struct EvalUseCase {
    checkpoint_dir: String,
    /// Overrides the table recorded in the run config when set.
    data_path: Option<String>,
}

impl EvalUseCase {
    pub fn new(checkpoint_dir: String, data_path: Option<String>) -> Self {
        Self { checkpoint_dir, data_path }
    }

    pub fn execute(&self) -> Result<()> {
        let ckpt_manager = CheckpointManager::new(self.checkpoint_dir.clone());
        let cfg = ckpt_manager.load_config()?;
        let saved_schema = ckpt_manager.load_labels()?;

        let data_path = self.data_path.as_ref().unwrap_or(&cfg.data_path);
        tracing::info!("Evaluating checkpoint '{}' on '{}'", self.checkpoint_dir, data_path);

        let table = CsvRecordSource::new(data_path).load()?;
        let extracted = extract_labels(&table, &cfg.text_column)?;
        saved_schema.ensure_matches(&extracted.schema)?;

        // The persisted tokenizer must exist; building a fresh one
        // here would silently change every input id.
        let tokenizer = VocabStore::new(self.checkpoint_dir.clone()).load()?;
        let encoder = TokenEncoder::new(tokenizer, cfg.max_seq_len);

        let texts: Vec<String> = extracted.samples.iter().map(|s| s.text.clone()).collect();
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

        let split = split_indices(samples.len(), cfg.train_fraction, cfg.seed);
        let (_, val_samples) = partition(&samples, &split);
        tracing::info!("Rebuilt validation split: {} samples", val_samples.len());

        let report = run_evaluation(
            &cfg,
            &saved_schema,
            PiiDataset::new(val_samples),
            &ckpt_manager,
        )?;
        report.print(&saved_schema);

        Ok(())
    }
}
