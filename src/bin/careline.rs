//! careline CLI binary.

use clap::Parser;
use std::process;

use careline::cli::{args::CarelineArgs, commands::execute_command};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse command line arguments using clap
    let args = CarelineArgs::parse();

    // Map verbosity onto the tracing filter; RUST_LOG still wins when set.
    let default_level = match args.verbosity() {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("careline={default_level}"))),
        )
        .init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
