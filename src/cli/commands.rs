// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `evaluate`, and all
// their configurable flags. clap's derive macros generate help
// text, error messages, and type conversion.

use clap::{Args, Subcommand};

use crate::application::train_use_case::RunConfig;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the PII classifier on a labelled CSV table
    Train(TrainArgs),

    /// Re-evaluate a saved checkpoint on its validation split
    Evaluate(EvalArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV table with one text column and one 0/1 column per PII category
    #[arg(long, default_value = "data/pii_samples.csv")]
    pub data: String,

    /// Name of the free-text column; every other column is a label
    #[arg(long, default_value = "text")]
    pub text_column: String,

    /// Directory for checkpoints, tokenizer, config, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Encoder identifier: base-uncased, base-cased, or mini-uncased
    #[arg(long, default_value = "base-uncased")]
    pub encoder: String,

    /// Optional pretrained encoder-trunk weights file
    #[arg(long)]
    pub encoder_weights: Option<String>,

    /// Vocabulary size used when a tokenizer has to be built
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Fixed token sequence length; longer text is truncated
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    /// Training batch size
    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    /// Validation batch size
    #[arg(long, default_value_t = 16)]
    pub eval_batch_size: usize,

    /// Number of full passes over the training split
    #[arg(long, default_value_t = 4)]
    pub epochs: usize,

    /// Fixed Adam learning rate
    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    /// Dropout probability inside the encoder and before the head
    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Fraction of samples assigned to the training split
    #[arg(long, default_value_t = 0.8)]
    pub train_fraction: f64,

    /// Probability threshold for predicting a label present
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,

    /// Split/shuffle seed; drawn at random and recorded when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Convert CLI args into the application-layer RunConfig.
    /// A missing seed is resolved here, once, so the persisted
    /// config always names the seed the run actually used.
    pub fn into_config(self) -> RunConfig {
        let seed = self.seed.unwrap_or_else(|| {
            let drawn = rand::random::<u64>();
            tracing::info!("No seed given; drew {} (recorded in run config)", drawn);
            drawn
        });
        RunConfig {
            data_path:       self.data,
            text_column:     self.text_column,
            checkpoint_dir:  self.checkpoint_dir,
            encoder:         self.encoder,
            encoder_weights: self.encoder_weights,
            vocab_size:      self.vocab_size,
            max_seq_len:     self.max_seq_len,
            batch_size:      self.batch_size,
            eval_batch_size: self.eval_batch_size,
            epochs:          self.epochs,
            lr:              self.lr,
            dropout:         self.dropout,
            train_fraction:  self.train_fraction,
            threshold:       self.threshold,
            seed,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Directory where a finished training run was saved
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Table to evaluate on; defaults to the one recorded in the run
    #[arg(long)]
    pub data: Option<String>,
}
