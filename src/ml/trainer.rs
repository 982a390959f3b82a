// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Fine-tunes the classifier over a fixed number of epochs.
//
// Per batch: scatter across the compute context's replicas, one
// forward + BCE loss per replica, reduce losses to a scalar,
// one backward pass, decoupled per-group weight decay, one Adam
// step at a fixed learning rate. A non-finite loss aborts the
// run; there is no retry.
//
// Backend split:
//   - training runs on an AutodiffBackend
//   - model.valid() hands the evaluator the inner-backend model,
//     with dropout disabled and no gradient tracking
//
// After every epoch: mean training loss on stdout, validation
// metrics into the CSV log, parameter snapshot to the checkpoint
// directory.

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::RunConfig;
use crate::data::{batcher::PiiBatcher, dataset::PiiDataset};
use crate::domain::error::TrainError;
use crate::domain::labels::LabelSchema;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::context::{ComputeContext, SingleDevice};
use crate::ml::decay::{apply_weight_decay, ParamGroups};
use crate::ml::evaluator::{evaluate, MetricsReport};
use crate::ml::loss::bce_with_logits;
use crate::ml::model::{EncoderPreset, PiiClassifier, PiiClassifierConfig};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Entry point used by the application layer: trains on the
/// default WGPU device with the single-replica context.
pub fn run_training(
    cfg:           &RunConfig,
    schema:        &LabelSchema,
    train_dataset: PiiDataset,
    val_dataset:   PiiDataset,
    ckpt_manager:  &CheckpointManager,
) -> Result<MetricsReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend, _>(
        cfg, schema, train_dataset, val_dataset, ckpt_manager, device, &SingleDevice,
    )
}

/// The full epoch/batch loop, generic over backend and compute
/// context so tests run it on CPU and replica handling is
/// covered without extra devices.
pub fn train_loop<B, C>(
    cfg:           &RunConfig,
    schema:        &LabelSchema,
    train_dataset: PiiDataset,
    val_dataset:   PiiDataset,
    ckpt_manager:  &CheckpointManager,
    device:        B::Device,
    context:       &C,
) -> Result<MetricsReport>
where
    B: AutodiffBackend,
    C: ComputeContext<B>,
{
    // --- Build model: preset trunk (optionally pretrained) + fresh head ------
    let preset = EncoderPreset::resolve(&cfg.encoder)
        .ok_or_else(|| anyhow::anyhow!("unknown encoder identifier '{}'", cfg.encoder))?;
    let enc_config = preset.encoder_config(cfg.vocab_size, cfg.max_seq_len, cfg.dropout);
    let model_cfg  = PiiClassifierConfig::new(enc_config.clone(), schema.len());

    let encoder = match &cfg.encoder_weights {
        Some(path) => {
            ckpt_manager.load_encoder::<B>(std::path::Path::new(path), &enc_config, &device)?
        }
        None => enc_config.init(&device),
    };
    let mut model: PiiClassifier<B> = model_cfg.head_on(encoder, &device);
    tracing::info!(
        "Model ready: encoder '{}', {} labels, {} parameters",
        preset.name,
        schema.len(),
        model.num_params(),
    );

    // --- Parameter groups, fixed once at build time --------------------------
    let groups = ParamGroups::from_module(&model);
    debug_assert_eq!(groups.total_elements(), model.num_params());
    tracing::info!(
        "Weight decay groups: {} decaying tensors, {} exempt (bias/norm)",
        groups.decay_count(),
        groups.no_decay_count(),
    );

    // --- Adam optimiser (decay applied separately, per group) ----------------
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // --- Training data loader: fresh shuffle order every epoch ---------------
    let train_batcher = PiiBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train_dataset);

    // --- Validation loader: natural order, inner backend ---------------------
    let val_batcher = PiiBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.eval_batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics_logger = MetricsLogger::new(
        ckpt_manager.dir().to_string_lossy().to_string(),
    )?;

    let mut last_report = None;

    // --- Epoch loop -----------------------------------------------------------
    for epoch in 1..=cfg.epochs {
        let mut loss_sum = 0.0f64;
        let mut steps    = 0usize;

        for batch in train_loader.iter() {
            let mut losses = Vec::with_capacity(context.replica_count());
            for part in context.scatter(batch) {
                let logits = model.forward(part.input_ids, part.attention_mask);
                losses.push(bce_with_logits(logits, part.labels));
            }
            let loss = context.reduce(losses);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            if !loss_val.is_finite() {
                return Err(TrainError::NonFiniteLoss {
                    epoch,
                    step: steps,
                    value: loss_val,
                }
                .into());
            }
            loss_sum += loss_val;
            steps    += 1;

            // Backward, decoupled decay, Adam update. The decay
            // mapper keeps parameter ids, so the gradients recorded
            // before it still address the right tensors.
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = apply_weight_decay(model, &groups, cfg.lr);
            model = optim.step(cfg.lr, model, grads);
        }

        let mean_loss = if steps > 0 { loss_sum / steps as f64 } else { f64::NAN };
        println!(
            "Epoch {:>2}/{} | train_loss={:.4}",
            epoch, cfg.epochs, mean_loss,
        );

        // Validation pass on the inner backend (dropout off, no grads)
        let report = evaluate(&model.valid(), val_loader.clone(), cfg.threshold, schema);
        metrics_logger.log(&EpochMetrics::new(
            epoch,
            mean_loss,
            report.macro_f1,
            report.flat_accuracy,
        ))?;

        ckpt_manager.save_model(&model, epoch)?;
        tracing::info!(
            "Epoch {} done: loss={:.4}, macro_f1={:.2}%, flat_acc={:.2}%",
            epoch,
            mean_loss,
            report.macro_f1,
            report.flat_accuracy,
        );
        last_report = Some(report);
    }

    tracing::info!("Training complete");
    last_report.ok_or_else(|| anyhow::anyhow!("no epochs were run (epochs = 0)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::PiiSample;
    use crate::ml::context::ChunkedReplicas;
    use burn::backend::ndarray::NdArray;
    use burn::backend::Autodiff;

    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    fn tiny_config(dir: &str) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.encoder        = "mini-uncased".to_string();
        cfg.checkpoint_dir = dir.to_string();
        cfg.vocab_size     = 30;
        cfg.max_seq_len    = 4;
        cfg.batch_size     = 4;
        cfg.eval_batch_size = 4;
        cfg.epochs         = 1;
        cfg.dropout        = 0.0;
        cfg.seed           = 7;
        cfg
    }

    fn synthetic_dataset(n: usize) -> PiiDataset {
        let samples: Vec<PiiSample> = (0..n)
            .map(|i| PiiSample {
                input_ids:      vec![(i % 11) as u32 + 2, (i % 5) as u32 + 2, 0, 0],
                attention_mask: vec![1, 1, 0, 0],
                labels:         vec![(i % 2) as u8, ((i / 2) % 2) as u8],
            })
            .collect();
        PiiDataset::new(samples)
    }

    fn schema() -> LabelSchema {
        LabelSchema::new(vec!["email".into(), "phone".into()])
    }

    #[test]
    fn test_one_epoch_produces_report_and_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path().to_str().unwrap());
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone());

        let report = train_loop::<TestAutodiffBackend, _>(
            &cfg,
            &schema(),
            synthetic_dataset(12),
            synthetic_dataset(8),
            &ckpt,
            Default::default(),
            &SingleDevice,
        )
        .unwrap();

        assert_eq!(report.sample_count, 8);
        assert_eq!(report.per_label.len(), 2);
        for cm in &report.per_label {
            assert_eq!(cm.total(), 8);
        }
        assert!(dir.path().join("latest_epoch.json").exists());
        assert!(dir.path().join("metrics.csv").exists());
    }

    #[test]
    fn test_chunked_replica_context_matches_loop_contract() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path().to_str().unwrap());
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone());

        // Two logical replicas: the loop must still converge on a
        // well-formed report with all samples accounted for.
        let report = train_loop::<TestAutodiffBackend, _>(
            &cfg,
            &schema(),
            synthetic_dataset(8),
            synthetic_dataset(4),
            &ckpt,
            Default::default(),
            &ChunkedReplicas::new(2),
        )
        .unwrap();
        assert_eq!(report.sample_count, 4);
    }

    #[test]
    fn test_unknown_encoder_identifier_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = tiny_config(dir.path().to_str().unwrap());
        cfg.encoder = "nonexistent-encoder".to_string();
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone());

        let err = train_loop::<TestAutodiffBackend, _>(
            &cfg,
            &schema(),
            synthetic_dataset(4),
            synthetic_dataset(4),
            &ckpt,
            Default::default(),
            &SingleDevice,
        )
        .unwrap_err();
        assert!(err.to_string().contains("encoder identifier"));
    }
}
