//! `bakery version`, `bakery completion` and `bakery man`.
//!
//! Every generated artifact is named after the clap command so the binary
//! name is declared once, in `cli.rs`.

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bakery::specifications;

use crate::cli::Cli;

/// Lines printed by `bakery version`.
///
/// The verbose form adds build provenance and the builtin specifications
/// with the number of checks each one resolves to.
pub fn version_lines(verbose: bool) -> Result<Vec<String>> {
    let cmd = Cli::command();
    let mut lines = vec![format!("{} {}", cmd.get_name(), env!("CARGO_PKG_VERSION"))];
    if !verbose {
        return Ok(lines);
    }

    lines.push(format!("commit: {}", env!("GIT_SHA")));
    lines.push(format!("built: {}", env!("BUILD_DATE")));
    lines.push("specifications:".to_string());
    for name in specifications::names() {
        let spec = specifications::by_name(name)?;
        lines.push(format!(
            "  {:<14} {} checks in {} sections",
            name,
            spec.len(),
            spec.sections().len()
        ));
    }
    Ok(lines)
}

pub fn cmd_version(verbose: bool) -> Result<()> {
    for line in version_lines(verbose)? {
        println!("{}", line);
    }
    Ok(())
}

/// Render the man page into `out_dir` (default: current directory) and
/// return the written path.
pub fn write_man_page(out_dir: Option<&Path>) -> Result<PathBuf> {
    let cmd = Cli::command();
    let page = out_dir
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}.1", cmd.get_name()));

    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;

    if let Some(dir) = page.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(&page, buffer).with_context(|| format!("Failed to write {}", page.display()))?;
    Ok(page)
}

pub fn cmd_man(out_dir: Option<&Path>) -> Result<()> {
    let page = write_man_page(out_dir)?;
    println!("Man page written to: {}", page.display());
    Ok(())
}

/// Write the completion script for `shell` to `out`.
pub fn write_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

pub fn cmd_completion(shell: Shell) -> Result<()> {
    write_completion(shell, &mut io::stdout());
    Ok(())
}
