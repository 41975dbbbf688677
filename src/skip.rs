//! Skip filter: the pluggable applicability policy of a specification.
//!
//! The runner consults the filter before any condition is evaluated. A
//! refusal turns the unit into a SKIP carrying the filter's reason, no matter
//! what the conditions would have said.

use std::sync::Arc;

use crate::document::Context;

/// Decision returned by a skip filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDecision {
    pub proceed: bool,
    pub reason: Option<String>,
}

impl SkipDecision {
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            reason: None,
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            proceed: false,
            reason: Some(reason.into()),
        }
    }

    /// Refuse without giving a reason.
    pub fn skip_silently() -> Self {
        Self {
            proceed: false,
            reason: None,
        }
    }
}

impl Default for SkipDecision {
    fn default() -> Self {
        Self::proceed()
    }
}

/// Decides whether a check should run for a given context.
pub trait SkipFilter: Send + Sync {
    fn decide(&self, check_id: &str, context: &Context) -> SkipDecision;
}

impl<F> SkipFilter for F
where
    F: Fn(&str, &Context) -> SkipDecision + Send + Sync,
{
    fn decide(&self, check_id: &str, context: &Context) -> SkipDecision {
        self(check_id, context)
    }
}

/// Filter that lets every unit proceed. Installed when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceedAll;

impl SkipFilter for ProceedAll {
    fn decide(&self, _check_id: &str, _context: &Context) -> SkipDecision {
        SkipDecision::proceed()
    }
}

/// Shared handle to an installed filter.
pub type SharedSkipFilter = Arc<dyn SkipFilter>;
