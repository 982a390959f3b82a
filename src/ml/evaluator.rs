// ============================================================
// Layer 5 - Evaluator
// ============================================================
// Runs the trained model over the validation loader in inference
// mode and derives the multi-label metrics:
//
//   - per-label 2x2 confusion matrix [[TN, FP], [FN, TP]]
//   - macro F1: unweighted mean of per-label F1, in percent
//   - flat accuracy: fraction of samples whose whole predicted
//     vector equals the whole true vector, in percent
//
// Probabilities come from an elementwise sigmoid over the logits;
// a label is predicted present when its probability reaches the
// configured threshold (0.50 by default). The validation loader
// is unshuffled, so metric computation is order-stable.
//
// A label with no true and no predicted positives has undefined
// precision and recall; it scores F1 = 0 and logs a diagnostic
// warning instead of aborting.

use std::sync::Arc;

use burn::data::dataloader::DataLoader;
use burn::prelude::*;

use crate::data::batcher::PiiBatch;
use crate::domain::labels::LabelSchema;
use crate::ml::model::PiiClassifier;

// --- Per-label confusion matrix ----------------------------------------------
/// Binary confusion counts for one label over the validation set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelConfusion {
    pub true_negatives:  usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives:  usize,
}

impl LabelConfusion {
    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    pub fn precision(&self) -> f64 {
        let predicted = self.true_positives + self.false_positives;
        if predicted == 0 {
            0.0
        } else {
            self.true_positives as f64 / predicted as f64
        }
    }

    pub fn recall(&self) -> f64 {
        let actual = self.true_positives + self.false_negatives;
        if actual == 0 {
            0.0
        } else {
            self.true_positives as f64 / actual as f64
        }
    }

    /// F1 in [0, 1]; 0 when both precision and recall are 0.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Neither ground truth nor prediction ever flagged the label.
    pub fn is_degenerate(&self) -> bool {
        self.true_positives + self.false_positives + self.false_negatives == 0
    }
}

// --- Metrics report ----------------------------------------------------------
/// Final evaluation result; percentages are in [0, 100].
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub per_label:     Vec<LabelConfusion>,
    pub macro_f1:      f64,
    pub flat_accuracy: f64,
    pub sample_count:  usize,
}

impl MetricsReport {
    /// Derive the aggregate metrics from raw counts.
    pub fn from_counts(
        per_label:    Vec<LabelConfusion>,
        exact_matches: usize,
        sample_count: usize,
        schema:       &LabelSchema,
    ) -> Self {
        let mut f1_sum = 0.0;
        for (i, cm) in per_label.iter().enumerate() {
            if cm.is_degenerate() {
                tracing::warn!(
                    "Label '{}' has no true or predicted positives; F1 reported as 0",
                    schema.name(i)
                );
            }
            f1_sum += cm.f1();
        }

        let macro_f1 = if per_label.is_empty() {
            0.0
        } else {
            100.0 * f1_sum / per_label.len() as f64
        };
        let flat_accuracy = if sample_count == 0 {
            0.0
        } else {
            100.0 * exact_matches as f64 / sample_count as f64
        };

        Self { per_label, macro_f1, flat_accuracy, sample_count }
    }

    /// Print the report to stdout in label order.
    pub fn print(&self, schema: &LabelSchema) {
        println!("Validation samples: {}", self.sample_count);
        println!("Macro F1:      {:.2}%", self.macro_f1);
        println!("Flat accuracy: {:.2}%", self.flat_accuracy);
        println!("Per-label confusion matrices [[TN, FP], [FN, TP]]:");
        for (i, cm) in self.per_label.iter().enumerate() {
            println!(
                "  {:<20} [[{}, {}], [{}, {}]]",
                schema.name(i),
                cm.true_negatives,
                cm.false_positives,
                cm.false_negatives,
                cm.true_positives,
            );
        }
    }
}

// --- Evaluation pass ---------------------------------------------------------
/// Run the model over the validation loader and compute metrics.
///
/// The caller passes a model on an inference backend (obtained
/// via `model.valid()`), so dropout is disabled and no gradients
/// are tracked.
pub fn evaluate<B: Backend>(
    model:     &PiiClassifier<B>,
    loader:    Arc<dyn DataLoader<PiiBatch<B>>>,
    threshold: f64,
    schema:    &LabelSchema,
) -> MetricsReport {
    let num_labels = schema.len();
    let mut per_label = vec![LabelConfusion::default(); num_labels];
    let mut exact_matches = 0usize;
    let mut sample_count  = 0usize;

    for batch in loader.iter() {
        let batch_size = batch.batch_size();
        let logits = model.forward(batch.input_ids, batch.attention_mask);
        let probs: Vec<f32> = burn::tensor::activation::sigmoid(logits)
            .into_data()
            .to_vec()
            .unwrap_or_default();
        let truth: Vec<f32> = batch.labels.into_data().to_vec().unwrap_or_default();

        accumulate(
            &mut per_label,
            &mut exact_matches,
            &probs,
            &truth,
            batch_size,
            num_labels,
            threshold,
        );
        sample_count += batch_size;
    }

    MetricsReport::from_counts(per_label, exact_matches, sample_count, schema)
}

/// Threshold one batch of probabilities and fold the outcomes
/// into the running confusion counts.
fn accumulate(
    per_label:     &mut [LabelConfusion],
    exact_matches: &mut usize,
    probs:         &[f32],
    truth:         &[f32],
    batch_size:    usize,
    num_labels:    usize,
    threshold:     f64,
) {
    for row in 0..batch_size {
        let mut row_exact = true;
        for label in 0..num_labels {
            let idx = row * num_labels + label;
            let predicted = probs[idx] as f64 >= threshold;
            let actual = truth[idx] >= 0.5;
            let cm = &mut per_label[label];
            match (actual, predicted) {
                (false, false) => cm.true_negatives += 1,
                (false, true)  => cm.false_positives += 1,
                (true, false)  => cm.false_negatives += 1,
                (true, true)   => cm.true_positives += 1,
            }
            if predicted != actual {
                row_exact = false;
            }
        }
        if row_exact {
            *exact_matches += 1;
        }
    }
}

// --- Standalone evaluation of a saved run ------------------------------------
/// Rebuild the model recorded by a training run, load its latest
/// parameter blob, and evaluate it on `val_dataset`. Used by the
/// `evaluate` subcommand; reloading must reproduce the metrics of
/// the run that saved the blob, given the same validation split.
pub fn run_evaluation(
    cfg:          &crate::application::train_use_case::RunConfig,
    schema:       &LabelSchema,
    val_dataset:  crate::data::dataset::PiiDataset,
    ckpt_manager: &crate::infra::checkpoint::CheckpointManager,
) -> anyhow::Result<MetricsReport> {
    use crate::data::batcher::PiiBatcher;
    use crate::ml::model::{EncoderPreset, PiiClassifierConfig};
    use burn::data::dataloader::DataLoaderBuilder;

    type InferBackend = burn::backend::Wgpu;

    let device = burn::backend::wgpu::WgpuDevice::default();

    let preset = EncoderPreset::resolve(&cfg.encoder)
        .ok_or_else(|| anyhow::anyhow!("unknown encoder identifier '{}'", cfg.encoder))?;
    let model_cfg = PiiClassifierConfig::new(
        preset.encoder_config(cfg.vocab_size, cfg.max_seq_len, cfg.dropout),
        schema.len(),
    );
    let model: PiiClassifier<InferBackend> = model_cfg.init(&device);
    let model = ckpt_manager.load_model(model, &device)?;

    let loader = DataLoaderBuilder::new(PiiBatcher::<InferBackend>::new(device))
        .batch_size(cfg.eval_batch_size)
        .num_workers(1)
        .build(val_dataset);

    Ok(evaluate(&model, loader, cfg.threshold, schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn schema(n: usize) -> LabelSchema {
        LabelSchema::new((0..n).map(|i| format!("label_{i}")).collect())
    }

    fn cm(tn: usize, fp: usize, fn_: usize, tp: usize) -> LabelConfusion {
        LabelConfusion {
            true_negatives:  tn,
            false_positives: fp,
            false_negatives: fn_,
            true_positives:  tp,
        }
    }

    #[test]
    fn test_f1_from_known_counts() {
        // precision = 8/10, recall = 8/12 -> F1 = 2*0.8*(2/3)/(0.8+2/3)
        let c = cm(80, 2, 4, 8);
        assert_relative_eq!(c.precision(), 0.8, epsilon = 1e-12);
        assert_relative_eq!(c.recall(), 8.0 / 12.0, epsilon = 1e-12);
        let expected = 2.0 * 0.8 * (8.0 / 12.0) / (0.8 + 8.0 / 12.0);
        assert_relative_eq!(c.f1(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_label_scores_zero_without_panicking() {
        // All-zero truth, all-zero predictions over 200 samples
        let c = cm(200, 0, 0, 0);
        assert!(c.is_degenerate());
        assert_eq!(c.f1(), 0.0);
        assert_eq!(c.total(), 200);

        let report = MetricsReport::from_counts(vec![c], 200, 200, &schema(1));
        assert_eq!(report.macro_f1, 0.0);
        assert_eq!(report.flat_accuracy, 100.0);
    }

    #[test]
    fn test_macro_f1_averages_labels_equally() {
        // Perfect label (F1=1) and degenerate label (F1=0)
        let perfect = cm(90, 0, 0, 10);
        let empty   = cm(100, 0, 0, 0);
        let report = MetricsReport::from_counts(vec![perfect, empty], 100, 100, &schema(2));
        assert_relative_eq!(report.macro_f1, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_accumulate_counts_and_exact_match() {
        let mut per_label = vec![LabelConfusion::default(); 2];
        let mut exact = 0usize;
        // Row 0: truth [1,0], probs predict [1,0] -> exact match
        // Row 1: truth [1,1], probs predict [0,1] -> one miss
        let probs = [0.9, 0.1, 0.3, 0.8];
        let truth = [1.0, 0.0, 1.0, 1.0];
        accumulate(&mut per_label, &mut exact, &probs, &truth, 2, 2, 0.5);

        assert_eq!(exact, 1);
        assert_eq!(per_label[0], cm(0, 0, 1, 1));
        assert_eq!(per_label[1], cm(1, 0, 0, 1));
        // Each matrix accounts for every sample
        assert_eq!(per_label[0].total(), 2);
        assert_eq!(per_label[1].total(), 2);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut per_label = vec![LabelConfusion::default(); 1];
        let mut exact = 0usize;
        // Exactly 0.5 counts as a positive prediction
        accumulate(&mut per_label, &mut exact, &[0.5], &[1.0], 1, 1, 0.5);
        assert_eq!(per_label[0].true_positives, 1);
    }

    #[test]
    fn test_flat_accuracy_requires_whole_vector_match() {
        // One of 9 labels wrong in every sample: per-label accuracy
        // is high but flat accuracy is 0.
        let mut per_label = vec![LabelConfusion::default(); 9];
        let mut exact = 0usize;
        let mut probs = vec![0.0f32; 9];
        probs[0] = 1.0; // predicted positive
        let truth = vec![0.0f32; 9]; // all actually negative
        accumulate(&mut per_label, &mut exact, &probs, &truth, 1, 9, 0.5);

        let report = MetricsReport::from_counts(per_label, exact, 1, &schema(9));
        assert_eq!(report.flat_accuracy, 0.0);
    }

    #[test]
    fn test_metrics_stay_in_percentage_range() {
        let labels = vec![cm(5, 5, 5, 5), cm(20, 0, 0, 0), cm(0, 0, 0, 20)];
        let report = MetricsReport::from_counts(labels, 7, 20, &schema(3));
        assert!((0.0..=100.0).contains(&report.macro_f1));
        assert!((0.0..=100.0).contains(&report.flat_accuracy));
    }

    // Saving a parameter blob and loading it into a fresh model
    // must reproduce the exact same metrics on the same loader.
    #[test]
    fn test_reloaded_blob_reproduces_metrics() {
        use crate::data::batcher::PiiBatcher;
        use crate::data::dataset::{PiiDataset, PiiSample};
        use crate::infra::checkpoint::CheckpointManager;
        use crate::ml::model::{PiiClassifierConfig, TextEncoderConfig};
        use burn::backend::ndarray::NdArray;
        use burn::backend::Autodiff;
        use burn::data::dataloader::DataLoaderBuilder;
        use burn::module::AutodiffModule;

        type TestBackend = NdArray<f32>;
        type TestAutodiffBackend = Autodiff<TestBackend>;

        let device = Default::default();
        let config = PiiClassifierConfig::new(
            TextEncoderConfig::new(30, 4, 8, 2, 1, 16, 0.0),
            2,
        );
        let model = config.init::<TestAutodiffBackend>(&device);

        let dir = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().to_str().unwrap());
        ckpt.save_model(&model, 1).unwrap();

        let samples: Vec<PiiSample> = (0..5)
            .map(|i| PiiSample {
                input_ids:      vec![(i % 7) as u32 + 1, 2, 0, 0],
                attention_mask: vec![1, 1, 0, 0],
                labels:         vec![(i % 2) as u8, 1],
            })
            .collect();
        let loader = DataLoaderBuilder::new(PiiBatcher::<TestBackend>::new(device))
            .batch_size(2)
            .num_workers(1)
            .build(PiiDataset::new(samples));

        let s = schema(2);
        let original = evaluate(&model.valid(), loader.clone(), 0.5, &s);

        let fresh = config.init::<TestBackend>(&Default::default());
        let restored = ckpt.load_model(fresh, &Default::default()).unwrap();
        let reloaded = evaluate(&restored, loader, 0.5, &s);

        assert_eq!(original.per_label, reloaded.per_label);
        assert_eq!(original.macro_f1, reloaded.macro_f1);
        assert_eq!(original.flat_accuracy, reloaded.flat_accuracy);
    }

    // End-to-end over a real loader with an untrained tiny model:
    // the numbers are arbitrary but every structural invariant
    // must hold.
    #[test]
    fn test_evaluate_invariants_with_real_loader() {
        use crate::data::batcher::PiiBatcher;
        use crate::data::dataset::{PiiDataset, PiiSample};
        use crate::ml::model::{PiiClassifierConfig, TextEncoderConfig};
        use burn::backend::ndarray::NdArray;
        use burn::data::dataloader::DataLoaderBuilder;

        type TestBackend = NdArray<f32>;

        let device = Default::default();
        let model = PiiClassifierConfig::new(
            TextEncoderConfig::new(30, 4, 8, 2, 1, 16, 0.0),
            2,
        )
        .init::<TestBackend>(&device);

        let samples: Vec<PiiSample> = (0..6)
            .map(|i| PiiSample {
                input_ids:      vec![(i % 7) as u32 + 1, 3, 0, 0],
                attention_mask: vec![1, 1, 0, 0],
                labels:         vec![(i % 2) as u8, 0],
            })
            .collect();
        let loader = DataLoaderBuilder::new(PiiBatcher::<TestBackend>::new(device))
            .batch_size(4)
            .num_workers(1)
            .build(PiiDataset::new(samples));

        let s = schema(2);
        let report = evaluate(&model, loader, 0.5, &s);

        assert_eq!(report.sample_count, 6);
        assert_eq!(report.per_label.len(), 2);
        for cm in &report.per_label {
            assert_eq!(cm.total(), 6);
        }
        assert!((0.0..=100.0).contains(&report.macro_f1));
        assert!((0.0..=100.0).contains(&report.flat_accuracy));
    }
}
