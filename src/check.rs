//! Check declarations.
//!
//! A [`Check`] is an explicit declaration: id, description, rationale,
//! required conditions, iteration scope and the function that produces its
//! verdicts. Checks are registered into a specification by value; nothing is
//! discovered implicitly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::condition::ConditionRef;
use crate::document::Context;
use crate::errors::{SpecError, SpecResult};
use crate::event::Verdicts;

/// Hierarchical check id: `namespace/segment/...`, e.g.
/// `com.adobe.fonts/check/name/empty_records`. A single bare segment is
/// accepted for ad-hoc specifications.
const CHECK_ID_PATTERN: &str = r"^[A-Za-z0-9_.\-]+(?:/[A-Za-z0-9_.\-]+)*$";

fn check_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CHECK_ID_PATTERN).expect("check id pattern is valid"))
}

/// Validated check identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckId(String);

impl CheckId {
    pub fn parse(value: &str) -> SpecResult<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(SpecError::InvalidCheckId {
                id: value.to_string(),
                reason: "check id cannot be empty".to_string(),
            });
        }
        if !check_id_regex().is_match(raw) {
            return Err(SpecError::InvalidCheckId {
                id: value.to_string(),
                reason: "expected '/'-separated segments of [A-Za-z0-9_.-]".to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of context a check iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Once per input document
    Single,
    /// Once per group of related documents
    Grouped,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Single => write!(f, "single"),
            Scope::Grouped => write!(f, "grouped"),
        }
    }
}

/// Function producing a check's verdicts for one context.
pub type CheckFn = Arc<dyn Fn(&Context) -> anyhow::Result<Verdicts> + Send + Sync>;

/// Declaration of a single check.
#[derive(Clone)]
pub struct Check {
    id: String,
    description: String,
    rationale: String,
    conditions: Vec<ConditionRef>,
    scope: Scope,
    run: CheckFn,
}

impl Check {
    /// Declare a check. The id is validated when the specification is built.
    pub fn new<F>(id: impl Into<String>, scope: Scope, run: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<Verdicts> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            description: String::new(),
            rationale: String::new(),
            conditions: Vec::new(),
            scope,
            run: Arc::new(run),
        }
    }

    /// Declare a check that runs once per document.
    pub fn single<F>(id: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<Verdicts> + Send + Sync + 'static,
    {
        Self::new(id, Scope::Single, run)
    }

    /// Declare a check that runs once per document group.
    pub fn grouped<F>(id: impl Into<String>, run: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<Verdicts> + Send + Sync + 'static,
    {
        Self::new(id, Scope::Grouped, run)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    /// Require a condition. `"not name"` requires it to be false.
    pub fn requires(mut self, condition: &str) -> Self {
        let reference = ConditionRef::parse(condition);
        if !self.conditions.contains(&reference) {
            self.conditions.push(reference);
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn conditions(&self) -> &[ConditionRef] {
        &self.conditions
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Invoke the check body.
    pub fn run(&self, context: &Context) -> anyhow::Result<Verdicts> {
        (self.run)(context)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("conditions", &self.conditions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{verdicts, Verdict};

    #[test]
    fn test_check_id_accepts_hierarchical_ids() {
        assert!(CheckId::parse("com.adobe.fonts/check/name/empty_records").is_ok());
        assert!(CheckId::parse("a.b/x").is_ok());
        assert!(CheckId::parse("field_not_empty").is_ok());
    }

    #[test]
    fn test_check_id_rejects_malformed_ids() {
        assert!(CheckId::parse("").is_err());
        assert!(CheckId::parse("a//b").is_err());
        assert!(CheckId::parse("a/b/").is_err());
        assert!(CheckId::parse("has space/x").is_err());
    }

    #[test]
    fn test_requires_deduplicates_references() {
        let check = Check::single("a/x", |_| Ok(verdicts(vec![Verdict::pass("ok")])))
            .requires("is_variable")
            .requires("is_variable")
            .requires("not is_regular");
        assert_eq!(check.conditions().len(), 2);
        assert!(check.conditions()[1].negated());
    }

    #[test]
    fn test_scope_helpers() {
        let single = Check::single("a/x", |_| Ok(verdicts(vec![])));
        let grouped = Check::grouped("a/y", |_| Ok(verdicts(vec![])));
        assert_eq!(single.scope(), Scope::Single);
        assert_eq!(grouped.scope(), Scope::Grouped);
    }
}
