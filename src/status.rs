//! Check status and worst-of aggregation.
//!
//! Statuses are ordered by severity so that the overall verdict of an
//! execution unit (or a section) is simply the maximum of its parts:
//! `Skip < Pass < Warn < Fail < Error`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a single result event or of an aggregated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The check never produced a substantive verdict
    Skip,
    Pass,
    Warn,
    Fail,
    /// The framework could not obtain a verdict (broken check or condition)
    Error,
}

impl Status {
    /// All statuses, from least to most severe.
    pub const ALL: [Status; 5] = [
        Status::Skip,
        Status::Pass,
        Status::Warn,
        Status::Fail,
        Status::Error,
    ];

    /// Worst status in the iterator, or `None` when it is empty.
    pub fn worst<I>(statuses: I) -> Option<Status>
    where
        I: IntoIterator<Item = Status>,
    {
        statuses.into_iter().max()
    }

    /// Whether this status should make a run exit unsuccessfully.
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Fail | Status::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Skip => "SKIP",
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
