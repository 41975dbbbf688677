//! Result events produced by checks.
//!
//! A check body yields [`Verdict`]s (status plus message). The runner stamps
//! each verdict with the producing check id, turning it into an immutable
//! [`CheckResult`].

use serde::{Deserialize, Serialize};

use crate::status::Status;

/// A single status/message pair yielded by a check body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
}

impl Verdict {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(Status::Pass, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Status::Warn, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(Status::Fail, message)
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(Status::Skip, message)
    }
}

/// Lazy, finite sequence of verdicts returned by one check invocation.
///
/// An `Err` item means the check broke partway through; the runner stops
/// consuming the sequence and resolves the unit to ERROR.
pub type Verdicts = Box<dyn Iterator<Item = anyhow::Result<Verdict>> + Send>;

/// Wrap already computed verdicts into a [`Verdicts`] sequence.
pub fn verdicts(items: Vec<Verdict>) -> Verdicts {
    Box::new(items.into_iter().map(Ok))
}

/// An immutable result event attributed to a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: Status,
    pub message: String,
    pub check_id: String,
}

impl CheckResult {
    pub fn new(check_id: &str, status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            check_id: check_id.to_string(),
        }
    }

    pub fn from_verdict(check_id: &str, verdict: Verdict) -> Self {
        Self::new(check_id, verdict.status, verdict.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdicts_preserves_order() {
        let collected: Vec<Verdict> = verdicts(vec![Verdict::fail("a"), Verdict::pass("b")])
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(collected[0], Verdict::fail("a"));
        assert_eq!(collected[1], Verdict::pass("b"));
    }

    #[test]
    fn test_from_verdict_stamps_check_id() {
        let result = CheckResult::from_verdict("org.x/check/y", Verdict::warn("careful"));
        assert_eq!(result.check_id, "org.x/check/y");
        assert_eq!(result.status, Status::Warn);
        assert_eq!(result.message, "careful");
    }
}
