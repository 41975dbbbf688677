//! Validation of loaded configuration.

use anyhow::Result;

use super::defaults::{InputsConfig, RunConfig};
use super::Config;

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.specification.trim().is_empty() {
            anyhow::bail!("specification must not be empty");
        }

        self.run.validate()?;
        self.inputs.validate()
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            anyhow::bail!("run.jobs must be greater than 0");
        }
        if self.timeout_ms == Some(0) {
            anyhow::bail!("run.timeout_ms must be greater than 0 when set");
        }

        Ok(())
    }
}

impl InputsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.group_by.trim().is_empty() {
            anyhow::bail!("inputs.group_by must not be empty");
        }

        Ok(())
    }
}
