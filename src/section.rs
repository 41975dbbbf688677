//! Named, ordered groupings of checks.

use std::sync::Arc;

use crate::check::Check;

/// A section groups checks for reporting and for partial composition.
/// Declaration order is kept so reports render deterministically.
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    checks: Vec<Arc<Check>>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checks(&self) -> &[Arc<Check>] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub(crate) fn push(&mut self, check: Arc<Check>) {
        self.checks.push(check);
    }
}
