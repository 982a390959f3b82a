// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Saves and restores everything a later run needs:
//
//   model_epoch_{n}.mpk.gz - parameter blob after epoch n
//   latest_epoch.json      - which epoch was saved last
//   run_config.json        - hyperparameters incl. resolved seed
//   labels.json            - label schema (category order)
//
// Burn's CompactRecorder serialises the parameter record to
// MessagePack and gzips it; loading fails if the architecture
// does not match, and the label count is checked explicitly
// before any load is attempted.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::RunConfig;
use crate::domain::labels::LabelSchema;
use crate::ml::model::{PiiClassifier, TextEncoder, TextEncoderConfig};

/// Manages all files of one training run's checkpoint directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save the model parameter blob for one epoch and move the
    /// latest-epoch pointer. The model is never wrapped by any
    /// replication layer, so the record is standalone.
    pub fn save_model<B: AutodiffBackend>(
        &self,
        model: &PiiClassifier<B>,
        epoch: usize,
    ) -> Result<()> {
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint for epoch {}", epoch);
        Ok(())
    }

    /// Load the weights of the latest saved epoch into `model`.
    /// The model must already have the recorded architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  PiiClassifier<B>,
        device: &B::Device,
    ) -> Result<PiiClassifier<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "cannot load checkpoint '{}'. Has training been run?",
                    path.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    /// Load pretrained trunk weights from an explicit file path.
    /// The classification head is not part of this record; it is
    /// always freshly initialized by the caller.
    pub fn load_encoder<B: Backend>(
        &self,
        weights: &Path,
        config:  &TextEncoderConfig,
        device:  &B::Device,
    ) -> Result<TextEncoder<B>> {
        let record = CompactRecorder::new()
            .load(weights.to_path_buf(), device)
            .with_context(|| {
                format!("cannot load encoder weights '{}'", weights.display())
            })?;
        tracing::info!("Initialized encoder trunk from '{}'", weights.display());
        Ok(config.init(device).load_record(record))
    }

    /// Persist the run configuration (including the resolved seed)
    /// so evaluation can rebuild the exact same pipeline.
    pub fn save_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.dir.join("run_config.json");
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<RunConfig> {
        let path = self.dir.join("run_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "cannot read config from '{}'. Run 'train' before 'evaluate'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist the label schema; category order defines what every
    /// head output and confusion matrix means.
    pub fn save_labels(&self, schema: &LabelSchema) -> Result<()> {
        let path = self.dir.join("labels.json");
        fs::write(&path, serde_json::to_string_pretty(schema)?)
            .with_context(|| format!("cannot write labels to '{}'", path.display()))?;
        Ok(())
    }

    pub fn load_labels(&self) -> Result<LabelSchema> {
        let path = self.dir.join("labels.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!("cannot read labels from '{}'", path.display())
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Check a freshly extracted schema against the persisted one
    /// before building the head; a width mismatch must fail here,
    /// not deep inside a record load.
    pub fn ensure_labels_match(&self, current: &LabelSchema) -> Result<()> {
        let saved = self.load_labels()?;
        saved.ensure_matches(current)?;
        Ok(())
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| "cannot find 'latest_epoch.json'. Run 'train' first.")?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}
