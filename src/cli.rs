//! CLI argument definitions for bakery.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bakery")]
#[command(version)]
#[command(about = "Declarative quality checks for font files", long_about = None)]
#[command(
    after_help = "GETTING STARTED:\n    bakery specs                      List builtin specifications\n    bakery list --spec adobe_fonts    Show the checks a specification resolves to\n    bakery check fonts/*.json         Run the default specification\n\n    Logging goes to stderr; tune it with -v/-vv or the BAKERY_LOG variable."
)]
pub struct Cli {
    /// Suppress all non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a specification against input documents
    Check {
        /// Input files or glob patterns
        #[arg(required = true, value_name = "FILES")]
        files: Vec<String>,
        /// Specification to run (defaults to the configured one)
        #[arg(long, short = 's', value_name = "NAME")]
        spec: Option<String>,
        /// Number of units executed in parallel
        #[arg(long, short = 'j', value_name = "N")]
        jobs: Option<usize>,
        /// Per-unit time limit in milliseconds
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
        /// Only run checks whose id contains this text (repeatable)
        #[arg(long = "checkid", short = 'c', value_name = "TEXT")]
        checkid: Vec<String>,
        /// Skip checks whose id contains this text (repeatable)
        #[arg(long = "exclude-checkid", short = 'x', value_name = "TEXT")]
        exclude_checkid: Vec<String>,
        /// Attribute used to group documents into families
        #[arg(long, value_name = "ATTR")]
        group_by: Option<String>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the sections and checks of a specification
    List {
        /// Specification to list (defaults to the configured one)
        #[arg(long, short = 's', value_name = "NAME")]
        spec: Option<String>,
        /// Compare the resolved checks against a YAML manifest
        #[arg(long, value_name = "PATH")]
        verify_manifest: Option<PathBuf>,
        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// List builtin specifications
    Specs,
    /// Show version information
    Version {
        /// Show commit and build date
        #[arg(long)]
        verbose: bool,
    },
    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Generate a man page
    Man {
        /// Output directory (defaults to the current directory)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}
