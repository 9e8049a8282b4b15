//! Command implementations for the careline CLI.

use std::sync::Arc;

use crate::catalog::IntentCatalog;
use crate::classifier::{
    Classifier, ClassifierKind, ModelStore, NeuralClassifier, RuleBasedClassifier, TrainingConfig,
};
use crate::cli::args::*;
use crate::error::Result;
use crate::server::{AppState, ServerConfig, start_server};
use crate::session::recorder::TracingRecorder;
use crate::session::registry::SessionRegistry;

/// Execute a CLI command.
pub fn execute_command(args: CarelineArgs) -> Result<()> {
    match &args.command {
        Command::Serve(serve_args) => serve(serve_args.clone(), &args),
        Command::Train(train_args) => train(train_args.clone(), &args),
        Command::Classify(classify_args) => classify(classify_args.clone(), &args),
        Command::Validate(validate_args) => validate(validate_args.clone(), &args),
    }
}

fn build_classifier(
    kind: ClassifierKind,
    catalog: Arc<IntentCatalog>,
    model_dir: &std::path::Path,
) -> Arc<dyn Classifier> {
    match kind {
        ClassifierKind::Rule => Arc::new(RuleBasedClassifier::new(catalog)),
        ClassifierKind::Neural => {
            Arc::new(NeuralClassifier::new(catalog, ModelStore::new(model_dir)))
        }
    }
}

/// Run the WebSocket service.
fn serve(args: ServeArgs, cli_args: &CarelineArgs) -> Result<()> {
    let catalog = Arc::new(IntentCatalog::from_json_file(&args.catalog)?);
    if cli_args.verbosity() > 0 {
        println!(
            "Loaded catalog with {} intents from {}",
            catalog.len(),
            args.catalog.display()
        );
    }

    let classifier = build_classifier(args.classifier, Arc::clone(&catalog), &args.model_dir);
    let state = AppState {
        registry: Arc::new(SessionRegistry::new()),
        classifier,
        recorder: Arc::new(TracingRecorder::new()),
    };
    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(start_server(&config, state))
}

/// Run an offline training pass and print metrics.
fn train(args: TrainArgs, cli_args: &CarelineArgs) -> Result<()> {
    let catalog = Arc::new(IntentCatalog::from_json_file(&args.catalog)?);
    let config = TrainingConfig {
        epochs: args.epochs,
        learning_rate: args.learning_rate,
        validation_split: args.validation_split,
        seed: args.seed,
        ..TrainingConfig::default()
    };

    let classifier =
        NeuralClassifier::with_config(catalog, ModelStore::new(&args.model_dir), config);
    let report = classifier.train()?;

    if cli_args.verbosity() > 1 {
        for epoch in &report.epochs {
            match (epoch.val_loss, epoch.val_accuracy) {
                (Some(val_loss), Some(val_accuracy)) => println!(
                    "epoch {:>4}  loss {:.4}  accuracy {:.4}  val_loss {:.4}  val_accuracy {:.4}",
                    epoch.epoch, epoch.loss, epoch.accuracy, val_loss, val_accuracy
                ),
                _ => println!(
                    "epoch {:>4}  loss {:.4}  accuracy {:.4}",
                    epoch.epoch, epoch.loss, epoch.accuracy
                ),
            }
        }
    }
    if cli_args.verbosity() > 0 {
        println!(
            "Trained on {} examples in {} ms: accuracy {:.4}, loss {:.4}",
            report.training_examples, report.training_time_ms, report.accuracy, report.loss
        );
        println!("Model published to {}", args.model_dir.display());
    }

    Ok(())
}

/// Classify one query and print the result.
fn classify(args: ClassifyArgs, _cli_args: &CarelineArgs) -> Result<()> {
    let catalog = Arc::new(IntentCatalog::from_json_file(&args.catalog)?);
    let classifier = build_classifier(args.classifier, catalog, &args.model_dir);

    let result = classifier.predict(&args.query)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

/// Load a catalog and check its invariants.
fn validate(args: ValidateArgs, cli_args: &CarelineArgs) -> Result<()> {
    let catalog = IntentCatalog::from_json_file(&args.catalog)?;
    if cli_args.verbosity() > 0 {
        println!(
            "Catalog OK: {} intents, {} training rows",
            catalog.len(),
            catalog.flatten().len()
        );
    }

    Ok(())
}
