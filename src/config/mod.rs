//! Configuration for bakery runs.
//!
//! Configuration lives in markdown files with YAML frontmatter:
//!
//! ```markdown
//! ---
//! specification: adobe_fonts
//! run:
//!   jobs: 4
//!   timeout_ms: 30000
//! checks:
//!   exclude: [kerning]
//! ---
//!
//! # Notes for this project
//! ```
//!
//! Merge order (later overrides earlier):
//! 1. Global config (`<config dir>/bakery/config.md`)
//! 2. Project config (`.bakery/config.md`)
//!
//! Command-line flags override both.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;
pub mod validation;

pub use defaults::*;

/// Project configuration path, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".bakery/config.md";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Builtin specification used when none is named on the command line
    #[serde(default = "defaults::default_specification")]
    pub specification: String,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            specification: defaults::default_specification(),
            run: RunConfig::default(),
            inputs: InputsConfig::default(),
            checks: ChecksConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Load the merged global and project configuration.
    ///
    /// Missing files are not an error; defaults fill the gaps.
    pub fn load() -> Result<Self> {
        Self::load_merged_from(global_config_path().as_deref(), Path::new(PROJECT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let (frontmatter, _body) = split_frontmatter(content);
        let frontmatter = frontmatter.context("Failed to extract frontmatter from config")?;

        let config: Config =
            serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")?;
        config.validate()?;

        Ok(config)
    }

    /// Load merged configuration from explicit global and project paths.
    pub fn load_merged_from(global_path: Option<&Path>, project_path: &Path) -> Result<Self> {
        let global_config = global_path
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let project_config = Some(project_path)
            .filter(|p| p.exists())
            .map(PartialConfig::load_from)
            .transpose()?
            .unwrap_or_default();

        let config = global_config.merge_with(project_config);
        config.validate()?;

        tracing::debug!(
            specification = %config.specification,
            jobs = config.run.jobs,
            "configuration loaded"
        );
        Ok(config)
    }
}

/// Returns the path to the global config file, `<config dir>/bakery/config.md`.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("bakery").join("config.md"))
}

/// Split `---` delimited YAML frontmatter from a markdown body.
pub fn split_frontmatter(content: &str) -> (Option<String>, &str) {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return (None, content);
    }

    let rest = &content[3..];
    match rest.find("\n---") {
        Some(end) => {
            let frontmatter = rest[..end].to_string();
            let body = rest[end + 4..].trim_start();
            (Some(frontmatter), body)
        }
        None => (None, content),
    }
}

/// Partial config for merging - all fields optional
#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    pub specification: Option<String>,
    pub run: Option<PartialRunConfig>,
    pub inputs: Option<InputsConfig>,
    pub checks: Option<ChecksConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct PartialRunConfig {
    pub jobs: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl PartialConfig {
    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        let (frontmatter, _body) = split_frontmatter(content);
        let frontmatter = frontmatter.context("Failed to extract frontmatter from config")?;

        serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")
    }

    /// Merge this global config with a project config.
    /// Values from the project config take precedence over global.
    fn merge_with(self, project: PartialConfig) -> Config {
        let global_run = self.run.unwrap_or_default();
        let project_run = project.run.unwrap_or_default();

        Config {
            specification: project
                .specification
                .or(self.specification)
                .unwrap_or_else(defaults::default_specification),
            run: RunConfig {
                jobs: project_run
                    .jobs
                    .or(global_run.jobs)
                    .unwrap_or_else(defaults::default_jobs),
                timeout_ms: project_run.timeout_ms.or(global_run.timeout_ms),
            },
            // Whole sections: project overrides global, or use default
            inputs: project.inputs.or(self.inputs).unwrap_or_default(),
            checks: project.checks.or(self.checks).unwrap_or_default(),
            output: project.output.or(self.output).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests;
