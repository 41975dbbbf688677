//! Cross-specification imports.
//!
//! An [`Import`] names identifiers of a frozen source specification to copy
//! into the specification being built. An identifier may be:
//!
//! - a check id: the check is copied into a section named after its source
//!   section
//! - a condition name: the condition is copied
//! - a section name: every check of that section is copied into a section of
//!   the same name
//!
//! Composition is additive only. Importing anything the target already holds
//! is a build error; nothing is ever overridden.

use std::sync::Arc;

use crate::errors::{SpecError, SpecResult};
use crate::specification::{Registry, Specification};

/// One import directive: a source specification and the identifiers to pull.
#[derive(Clone)]
pub struct Import {
    source: Specification,
    names: Vec<String>,
}

impl Import {
    pub fn new<I, S>(source: &Specification, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            source: source.clone(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn source(&self) -> &Specification {
        &self.source
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Merge every identifier named by `import` into `target`.
pub(crate) fn merge(target: &mut Registry, import: &Import) -> SpecResult<()> {
    let source = &import.source;
    let source_name = source.name().to_string();

    for name in &import.names {
        let name = name.trim();

        if let Some((section, check)) = source.find_check(name) {
            target.import_check(section.name(), Arc::clone(check), &source_name)?;
            continue;
        }

        if let Some(condition) = source.condition(name) {
            target.import_condition(Arc::clone(condition), &source_name)?;
            continue;
        }

        if let Some(section) = source.section(name) {
            for check in section.checks() {
                target.import_check(section.name(), Arc::clone(check), &source_name)?;
            }
            continue;
        }

        return Err(SpecError::ImportNotFound {
            id: name.to_string(),
            source_spec: source_name,
        });
    }

    tracing::debug!(
        source = %source_name,
        names = import.names.len(),
        "merged import"
    );
    Ok(())
}
