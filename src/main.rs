//! CLI entry point for bakery.

mod cli;
mod cmd;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bakery::config::{Config, OutputFormat};

use cli::{Cli, Commands};
use cmd::output::{Output, OutputMode};

/// Environment variable overriding the log filter, e.g. `BAKERY_LOG=bakery=debug`.
const LOG_ENV: &str = "BAKERY_LOG";

fn main() -> Result<()> {
    // Run on a thread with an 8 MB stack so debug builds behave the same on
    // platforms with a smaller default.
    const STACK_SIZE: usize = 8 * 1024 * 1024;

    let thread = std::thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(run)?;

    match thread.join() {
        Ok(Ok(0)) => Ok(()),
        Ok(Ok(code)) => std::process::exit(code),
        Ok(Err(e)) => Err(e),
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn output_mode(quiet: bool, json: bool) -> OutputMode {
    if json {
        OutputMode::Json
    } else if quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Human
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            files,
            spec,
            jobs,
            timeout_ms,
            checkid,
            exclude_checkid,
            group_by,
            json,
        } => {
            let config = Config::load()?;
            let json = json || config.output.format == OutputFormat::Json;
            let output = Output::new(output_mode(cli.quiet, json));
            cmd::check::cmd_check(
                cmd::check::CheckArgs {
                    files,
                    spec,
                    jobs,
                    timeout_ms,
                    include: checkid,
                    exclude: exclude_checkid,
                    group_by,
                },
                &config,
                &output,
            )
        }
        Commands::List {
            spec,
            verify_manifest,
            json,
        } => {
            let output = Output::new(output_mode(cli.quiet, json));
            cmd::list::cmd_list(spec.as_deref(), verify_manifest.as_deref(), &output)
        }
        Commands::Specs => {
            cmd::list::cmd_specs(&Output::new(output_mode(cli.quiet, false)))?;
            Ok(0)
        }
        Commands::Version { verbose } => cmd::util::cmd_version(verbose).map(|_| 0),
        Commands::Completion { shell } => cmd::util::cmd_completion(shell).map(|_| 0),
        Commands::Man { out_dir } => cmd::util::cmd_man(out_dir.as_deref()).map(|_| 0),
    }
}
