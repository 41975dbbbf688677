//! `bakery check`: run a specification over input documents.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use bakery::config::Config;
use bakery::resolver::{Inputs, Selection};
use bakery::runner::{CancelToken, RunOptions, Runner};
use bakery::specifications;

use super::output::{Output, OutputMode};

/// Command-line overrides for a check run
#[derive(Debug, Default)]
pub struct CheckArgs {
    pub files: Vec<String>,
    pub spec: Option<String>,
    pub jobs: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub group_by: Option<String>,
}

/// Expand glob patterns; plain paths are kept even when they do not exist so
/// that loading reports them.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = 0;
        for entry in glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))? {
            paths.push(entry?);
            matched += 1;
        }
        if matched == 0 {
            anyhow::bail!("No input files match '{}'", pattern);
        }
    }
    // Keep the first appearance of each path; later repeats are dropped.
    let mut seen = HashSet::new();
    paths.retain(|path| seen.insert(path.clone()));
    Ok(paths)
}

/// Merge configuration with command-line overrides; flags win.
pub fn run_options(config: &Config, args: &CheckArgs, cancel: CancelToken) -> Result<RunOptions> {
    let jobs = args.jobs.unwrap_or(config.run.jobs);
    if jobs == 0 {
        anyhow::bail!("--jobs must be greater than 0");
    }
    let timeout_ms = args.timeout_ms.or(config.run.timeout_ms);
    if timeout_ms == Some(0) {
        anyhow::bail!("--timeout-ms must be greater than 0");
    }

    let mut selection: Selection = config.checks.selection();
    if !args.include.is_empty() {
        selection.include = args.include.clone();
    }
    selection.exclude.extend(args.exclude.iter().cloned());

    let mut options = RunOptions::default()
        .jobs(jobs)
        .selection(selection)
        .cancel_token(cancel);
    if let Some(ms) = timeout_ms {
        options = options.timeout(Duration::from_millis(ms));
    }
    Ok(options)
}

/// Run the check command; returns the process exit code
pub fn cmd_check(args: CheckArgs, config: &Config, output: &Output) -> Result<i32> {
    let spec_name = args.spec.clone().unwrap_or_else(|| config.specification.clone());
    let spec = specifications::by_name(&spec_name)?;

    let paths = expand_inputs(&args.files)?;
    let group_by = args
        .group_by
        .clone()
        .unwrap_or_else(|| config.inputs.group_by.clone());
    let inputs = Inputs::load(&paths)?.group_by(group_by);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        let _ = ctrlc::set_handler(move || {
            eprintln!("\nInterrupt received, finishing running checks...");
            cancel.cancel();
        });
    }

    let options = run_options(config, &args, cancel)?;
    tracing::info!(
        specification = %spec_name,
        inputs = inputs.documents().len(),
        jobs = options.jobs,
        "running checks"
    );

    let spinner = (output.mode() == OutputMode::Human && output.is_tty()).then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!(
            "Running {} over {} file(s)...",
            spec_name,
            inputs.documents().len()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });

    let report = Runner::new(options).run(&spec, &inputs);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    output.report(&report)?;
    Ok(report.exit_code())
}
