//! AnyLint CLI
//!
//! Turns the output of any command-line linter into positioned diagnostics.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Extract {
            linter,
            document,
            input,
            format,
            event,
            isolated,
        } => commands::extract::run_extract(
            cli.config.as_deref(),
            linter,
            document,
            input.as_deref(),
            format,
            *event,
            *isolated,
        ),
        Commands::Plan {
            document,
            event,
            format,
        } => commands::plan::run_plan(cli.config.as_deref(), document, *event, format)
            .map(|_| false),
        Commands::Eval {
            expression,
            document,
            raw,
        } => commands::eval::run_eval(expression, document.as_deref(), raw.as_deref())
            .map(|_| false),
        Commands::Init { force } => commands::init::run_init(*force).map(|_| false),
    }
}
