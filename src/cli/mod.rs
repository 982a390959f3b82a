// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates the work to Layer 2 (application).

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "pii-classifier",
    version = "0.1.0",
    about = "Fine-tune a transformer encoder to flag PII categories in text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI layer only
    /// routes, it never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => Self::run_train(args),
            Commands::Evaluate(args) => Self::run_evaluate(args),
        }
    }

    fn run_train(args: TrainArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        tracing::info!("Starting training on '{}'", args.data);
        TrainUseCase::new(args.into_config()).execute()?;
        println!("Training complete. Checkpoint saved.");
        Ok(())
    }

    fn run_evaluate(args: EvalArgs) -> Result<()> {
        use crate::application::eval_use_case::EvalUseCase;

        EvalUseCase::new(args.checkpoint_dir, args.data).execute()
    }
}
