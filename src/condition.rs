//! Conditions: named, cached boolean gates over a context.
//!
//! A condition is evaluated at most once per (condition, context) pair in a
//! run. The [`ConditionCache`] hands out one `OnceLock` per key so that
//! concurrent units asking for the same pair block on a single evaluation
//! instead of racing to compute it twice.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::document::Context;
use crate::runner::describe_panic;

/// Predicate backing a condition.
pub type ConditionFn = Arc<dyn Fn(&Context) -> anyhow::Result<bool> + Send + Sync>;

/// A named, pure predicate over a context.
#[derive(Clone)]
pub struct Condition {
    name: String,
    description: String,
    evaluate: ConditionFn,
}

impl Condition {
    pub fn new<F>(name: impl Into<String>, evaluate: F) -> Self
    where
        F: Fn(&Context) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            evaluate: Arc::new(evaluate),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate the predicate directly, bypassing any cache.
    pub fn evaluate(&self, context: &Context) -> anyhow::Result<bool> {
        (self.evaluate)(context)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Reference from a check to a condition, optionally negated (`not name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionRef {
    name: String,
    negated: bool,
}

impl ConditionRef {
    pub fn parse(reference: &str) -> Self {
        let trimmed = reference.trim();
        match trimmed.strip_prefix("not ") {
            Some(rest) => Self {
                name: rest.trim().to_string(),
                negated: true,
            },
            None => Self {
                name: trimmed.to_string(),
                negated: false,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn negated(&self) -> bool {
        self.negated
    }

    /// Apply the reference's polarity to a condition value.
    pub fn holds(&self, value: bool) -> bool {
        value != self.negated
    }
}

impl fmt::Display for ConditionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not {}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

type CacheKey = (String, String);
type CacheCell = Arc<OnceLock<Result<bool, String>>>;

/// Per-run memo of condition results keyed by (condition name, context key).
#[derive(Default)]
pub struct ConditionCache {
    entries: Mutex<HashMap<CacheKey, CacheCell>>,
    evaluations: AtomicUsize,
}

impl ConditionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `condition` for `context`, computing it at most once.
    ///
    /// Errors and panics inside the predicate are captured as `Err(message)`
    /// and cached like any other outcome.
    pub fn evaluate(&self, condition: &Condition, context: &Context) -> Result<bool, String> {
        let cell = {
            let mut entries = self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            entries
                .entry((condition.name().to_string(), context.key()))
                .or_default()
                .clone()
        };

        cell.get_or_init(|| {
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            tracing::debug!(
                condition = condition.name(),
                context = context.descriptor(),
                "evaluating condition"
            );
            match panic::catch_unwind(AssertUnwindSafe(|| condition.evaluate(context))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(format!("{:#}", e)),
                Err(payload) => Err(format!("panicked: {}", describe_panic(&*payload))),
            }
        })
        .clone()
    }

    /// Number of predicate executions performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }
}
