//! Expected-check manifests.
//!
//! A specification may declare the exact list of check ids it expects to end
//! up with once every import is resolved. The comparison runs once, at build
//! time, and a mismatch is fatal: it catches checks silently lost or gained
//! through composition.
//!
//! Manifests can be declared in code or loaded from YAML:
//!
//! ```yaml
//! exclusive: true
//! ids:
//!   - com.adobe.fonts/check/name/empty_records
//!   - com.adobe.fonts/check/consistent_upm
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::errors::{SpecError, SpecResult};

/// Declared list of expected check ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedChecks {
    pub ids: Vec<String>,
    /// Require exact equality instead of a subset relation
    #[serde(default)]
    pub exclusive: bool,
}

impl ExpectedChecks {
    /// Manifest that must match the resolved set exactly.
    pub fn exclusive<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            exclusive: true,
        }
    }

    /// Manifest whose ids must all be present in the resolved set.
    pub fn subset<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            exclusive: false,
        }
    }

    /// Load a manifest from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    /// Compare against the resolved check ids of a specification.
    pub fn verify<'a, I>(&self, resolved: I) -> ManifestDiff
    where
        I: IntoIterator<Item = &'a str>,
    {
        verify(resolved, &self.ids, self.exclusive)
    }
}

/// Difference between a resolved check set and a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDiff {
    /// Resolved ids absent from the manifest (exclusive mode only)
    pub extra: Vec<String>,
    /// Manifest ids absent from the resolved set
    pub missing: Vec<String>,
    /// Ids listed more than once in the manifest; reported, never fatal
    pub duplicates: Vec<String>,
}

impl ManifestDiff {
    pub fn is_ok(&self) -> bool {
        self.extra.is_empty() && self.missing.is_empty()
    }

    /// Convert a mismatch into the build error.
    pub fn into_result(self) -> SpecResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(SpecError::ExpectedChecksMismatch {
                extra: self.extra,
                missing: self.missing,
            })
        }
    }
}

/// Compare resolved check ids against expected ids.
///
/// Exclusive: both directions are checked. Otherwise only missing ids count.
/// Output order follows the resolved order for `extra` and the manifest
/// order for `missing` and `duplicates`.
pub fn verify<'a, I>(resolved: I, expected: &[String], exclusive: bool) -> ManifestDiff
where
    I: IntoIterator<Item = &'a str>,
{
    let resolved: Vec<&str> = resolved.into_iter().collect();
    let resolved_set: HashSet<&str> = resolved.iter().copied().collect();

    let mut expected_set: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();
    for id in expected {
        if !expected_set.insert(id.as_str()) && !duplicates.contains(id) {
            duplicates.push(id.clone());
        }
    }

    let missing = expected
        .iter()
        .filter(|id| !resolved_set.contains(id.as_str()))
        .fold(Vec::new(), |mut acc: Vec<String>, id| {
            if !acc.contains(id) {
                acc.push(id.clone());
            }
            acc
        });

    let extra = if exclusive {
        resolved
            .iter()
            .filter(|id| !expected_set.contains(*id))
            .map(|id| id.to_string())
            .collect()
    } else {
        Vec::new()
    };

    ManifestDiff {
        extra,
        missing,
        duplicates,
    }
}
