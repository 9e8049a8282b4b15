//! Command line argument parsing for the careline CLI using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::classifier::ClassifierKind;

/// careline - a conversational intent-classification service
#[derive(Parser, Debug, Clone)]
#[command(name = "careline")]
#[command(about = "A conversational intent-classification service for healthcare assistants")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Careline Contributors")]
#[command(long_about = None)]
pub struct CarelineArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl CarelineArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the WebSocket service
    Serve(ServeArgs),

    /// Train the statistical classifier from a catalog
    Train(TrainArgs),

    /// Classify a single query and print the result
    Classify(ClassifyArgs),

    /// Validate an intent catalog
    Validate(ValidateArgs),
}

/// Arguments for running the service
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to the intent catalog JSON file
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Host address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Classification strategy backing every session
    #[arg(long, value_enum, default_value = "rule")]
    pub classifier: ClassifierKind,

    /// Model directory for the neural classifier
    #[arg(short, long, default_value = "model")]
    pub model_dir: PathBuf,
}

/// Arguments for an offline training run
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Path to the intent catalog JSON file
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Directory the trained state is published to
    #[arg(short, long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Training epoch budget
    #[arg(short, long, default_value = "100")]
    pub epochs: usize,

    /// SGD learning rate
    #[arg(long, default_value = "0.05")]
    pub learning_rate: f64,

    /// Fraction of rows held out for validation
    #[arg(long, default_value = "0.2")]
    pub validation_split: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for one-shot classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Path to the intent catalog JSON file
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// The query to classify
    pub query: String,

    /// Classification strategy
    #[arg(long, value_enum, default_value = "rule")]
    pub classifier: ClassifierKind,

    /// Model directory for the neural classifier
    #[arg(short, long, default_value = "model")]
    pub model_dir: PathBuf,
}

/// Arguments for catalog validation
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the intent catalog JSON file
    #[arg(short, long)]
    pub catalog: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let args =
            CarelineArgs::parse_from(["careline", "serve", "--catalog", "data/intents.json"]);
        match args.command {
            Command::Serve(serve) => {
                assert_eq!(serve.port, 8000);
                assert_eq!(serve.classifier, ClassifierKind::Rule);
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_parse_train_with_seed() {
        let args = CarelineArgs::parse_from([
            "careline", "train", "--catalog", "intents.json", "--seed", "42", "--epochs", "10",
        ]);
        match args.command {
            Command::Train(train) => {
                assert_eq!(train.seed, Some(42));
                assert_eq!(train.epochs, 10);
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = CarelineArgs::parse_from(["careline", "-vv", "validate", "--catalog", "x"]);
        assert_eq!(args.verbosity(), 2);

        let args = CarelineArgs::parse_from(["careline", "-q", "validate", "--catalog", "x"]);
        assert_eq!(args.verbosity(), 0);
    }
}
