//! CLI argument definitions

use std::path::PathBuf;

use anylint_core::Event;
use clap::{Parser, Subcommand};

/// AnyLint - diagnostics from any command-line linter
#[derive(Parser)]
#[command(name = "anylint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Document the lint pass is about.
#[derive(clap::Args, Clone)]
pub struct DocumentArgs {
    /// Linted document
    #[arg(short, long)]
    pub document: PathBuf,

    /// Language identifier (defaults to the file extension)
    #[arg(long)]
    pub language: Option<String>,

    /// One-based line of the cursor
    #[arg(long, default_value_t = 1)]
    pub line: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract diagnostics from a linter's output
    Extract {
        /// Linter name from the configuration
        #[arg(short, long)]
        linter: String,

        #[command(flatten)]
        document: DocumentArgs,

        /// File holding the tool output (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Event that triggered the pass
        #[arg(short, long, default_value = "force")]
        event: Event,

        /// Evaluate selectors on an isolated worker thread
        #[arg(long)]
        isolated: bool,
    },

    /// Show the linters that would run for an event
    Plan {
        #[command(flatten)]
        document: DocumentArgs,

        /// Event that triggered the pass
        #[arg(short, long, default_value = "save")]
        event: Event,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Evaluate an expression
    Eval {
        /// Expression source
        expression: String,

        /// Bind `$` to the context of this document
        #[arg(short, long)]
        document: Option<PathBuf>,

        /// Bind `$$` to this JSON value
        #[arg(long)]
        raw: Option<String>,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },
}
