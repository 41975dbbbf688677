//! Default values and configuration sections.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::resolver::{Selection, DEFAULT_GROUP_ATTRIBUTE};

/// Macro to generate default functions for serde attributes
macro_rules! default_fn {
    ($name:ident, $type:ty, $value:expr) => {
        pub(crate) fn $name() -> $type {
            $value
        }
    };
}

default_fn!(default_specification, String, "general".to_string());
default_fn!(
    default_jobs,
    usize,
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
);
default_fn!(default_group_by, String, DEFAULT_GROUP_ATTRIBUTE.to_string());

/// Worker pool and time limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Per-unit time limit in milliseconds; no limit when unset
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            timeout_ms: None,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// How input documents are grouped for family-level checks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputsConfig {
    #[serde(default = "default_group_by")]
    pub group_by: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            group_by: default_group_by(),
        }
    }
}

/// Check id substrings to include or exclude
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChecksConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ChecksConfig {
    pub fn selection(&self) -> Selection {
        Selection {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
        }
    }
}

/// Report rendering format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}
