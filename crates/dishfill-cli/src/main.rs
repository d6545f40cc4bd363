//! Dishfill - dishwasher fill estimation
//!
//! A CLI tool that turns object detections of dishware into a fill percentage
//! and, optionally, a loading suggestion from a language model.

use clap::Parser;
use dishfill_cli::cli::Cli;
use dishfill_cli::commands;
use dishfill_types::OutputFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json_errors = cli.format == Some(OutputFormat::Json);

    if let Err(e) = commands::execute(cli).await {
        if json_errors {
            match serde_json::to_string_pretty(&e.to_response()) {
                Ok(body) => eprintln!("{}", body),
                Err(_) => eprintln!("Error: {}", e),
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}
