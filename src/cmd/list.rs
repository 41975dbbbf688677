//! `bakery list` and `bakery specs`.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use bakery::config::Config;
use bakery::manifest::ExpectedChecks;
use bakery::specification::Specification;
use bakery::specifications;

use super::output::{Output, OutputMode};

#[derive(Debug, Serialize)]
struct CheckEntry<'a> {
    section: &'a str,
    id: &'a str,
    scope: String,
    description: &'a str,
    conditions: Vec<String>,
}

fn entries(spec: &Specification) -> Vec<CheckEntry<'_>> {
    spec.sections()
        .iter()
        .flat_map(|section| {
            section.checks().iter().map(move |check| CheckEntry {
                section: section.name(),
                id: check.id(),
                scope: check.scope().to_string(),
                description: check.description(),
                conditions: check.conditions().iter().map(|c| c.to_string()).collect(),
            })
        })
        .collect()
}

/// List a specification's checks; returns the process exit code
pub fn cmd_list(spec: Option<&str>, verify_manifest: Option<&Path>, output: &Output) -> Result<i32> {
    let name = match spec {
        Some(name) => name.to_string(),
        None => Config::load()?.specification,
    };
    let spec = specifications::by_name(&name)?;

    if let Some(path) = verify_manifest {
        let manifest = ExpectedChecks::load(path)?;
        let diff = manifest.verify(spec.check_ids());
        if output.mode() == OutputMode::Json {
            output.json(&diff)?;
        } else {
            for id in &diff.extra {
                output.error(&format!("unexpected check: {}", id));
            }
            for id in &diff.missing {
                output.error(&format!("missing check: {}", id));
            }
            for id in &diff.duplicates {
                output.info(&format!("listed more than once: {}", id));
            }
            if diff.is_ok() {
                output.success(&format!(
                    "{} matches {} ({} checks)",
                    spec.name(),
                    path.display(),
                    spec.len()
                ));
            }
        }
        return Ok(if diff.is_ok() { 0 } else { 1 });
    }

    let listed = entries(&spec);
    if output.mode() == OutputMode::Json {
        output.json(&listed)?;
        return Ok(0);
    }

    let mut current = "";
    for entry in &listed {
        if entry.section != current {
            output.heading(entry.section);
            current = entry.section;
        }
        output.info(&format!("  {}", entry.id));
        if !entry.description.is_empty() {
            output.info(&format!("      {}", entry.description));
        }
    }
    Ok(0)
}

/// List builtin specifications
pub fn cmd_specs(output: &Output) -> Result<()> {
    if output.mode() == OutputMode::Json {
        let listed: Vec<_> = specifications::BUILTIN
            .iter()
            .map(|(name, summary)| serde_json::json!({ "name": name, "summary": summary }))
            .collect();
        return output.json(&listed);
    }
    for (name, summary) in specifications::BUILTIN {
        output.info(&format!("{:<14} {}", name, summary));
    }
    Ok(())
}
