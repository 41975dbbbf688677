//! Run reports.
//!
//! A [`Report`] lists one [`UnitOutcome`] per execution unit, in resolver
//! order, plus per-section rollups. The order never depends on how units were
//! scheduled.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::event::CheckResult;
use crate::resolver::ExecutionUnit;
use crate::status::Status;

/// Number of units per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub skip: usize,
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: Status) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Skip => self.skip,
            Status::Pass => self.pass,
            Status::Warn => self.warn,
            Status::Fail => self.fail,
            Status::Error => self.error,
        }
    }

    pub fn total(&self) -> usize {
        Status::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// Worst status with a non-zero count.
    pub fn worst(&self) -> Option<Status> {
        Status::worst(Status::ALL.iter().copied().filter(|s| self.get(*s) > 0))
    }

    fn slot(&mut self, status: Status) -> &mut usize {
        match status {
            Status::Skip => &mut self.skip,
            Status::Pass => &mut self.pass,
            Status::Warn => &mut self.warn,
            Status::Fail => &mut self.fail,
            Status::Error => &mut self.error,
        }
    }
}

/// Rollup of one section's units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub name: String,
    pub counts: StatusCounts,
    pub worst: Option<Status>,
}

/// Aggregated outcome of one (check, context) unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    #[serde(skip)]
    pub index: usize,
    pub check_id: String,
    pub section: String,
    pub context: String,
    pub status: Status,
    /// First message emitted at the aggregated status
    pub message: String,
    pub results: Vec<CheckResult>,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl UnitOutcome {
    /// Aggregate the results of a unit; the worst status wins.
    ///
    /// `results` must not be empty; the runner always supplies at least one.
    pub fn from_results(unit: &ExecutionUnit, results: Vec<CheckResult>, elapsed: Duration) -> Self {
        let status = Status::worst(results.iter().map(|r| r.status)).unwrap_or(Status::Error);
        let message = results
            .iter()
            .find(|r| r.status == status)
            .map(|r| r.message.clone())
            .unwrap_or_default();

        Self {
            index: unit.index,
            check_id: unit.check.id().to_string(),
            section: unit.section.clone(),
            context: unit.context.descriptor().to_string(),
            status,
            message,
            results,
            duration_ms: elapsed.as_millis() as u64,
            cancelled: false,
        }
    }

    /// Outcome of a unit that was never dispatched.
    pub fn cancelled(unit: &ExecutionUnit) -> Self {
        let result = CheckResult::new(unit.check.id(), Status::Skip, CANCELLED_MESSAGE);
        let mut outcome = Self::from_results(unit, vec![result], Duration::ZERO);
        outcome.cancelled = true;
        outcome
    }
}

pub(crate) const CANCELLED_MESSAGE: &str = "run cancelled before dispatch";

/// Exit status of a cancelled run, as for a process stopped by SIGINT.
pub const CANCELLED_EXIT_CODE: i32 = 130;

/// Complete outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub specification: String,
    pub generated_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub units: Vec<UnitOutcome>,
    pub sections: Vec<SectionSummary>,
    pub totals: StatusCounts,
    pub cancelled: bool,
}

impl Report {
    /// Build a report; units are sorted into resolver order.
    pub fn new(specification: &str, mut units: Vec<UnitOutcome>, elapsed: Duration) -> Self {
        units.sort_by_key(|u| u.index);

        let mut sections: Vec<SectionSummary> = Vec::new();
        let mut totals = StatusCounts::default();
        for unit in &units {
            totals.add(unit.status);
            match sections.iter_mut().find(|s| s.name == unit.section) {
                Some(summary) => summary.counts.add(unit.status),
                None => {
                    let mut counts = StatusCounts::default();
                    counts.add(unit.status);
                    sections.push(SectionSummary {
                        name: unit.section.clone(),
                        counts,
                        worst: None,
                    });
                }
            }
        }
        for summary in &mut sections {
            summary.worst = summary.counts.worst();
        }

        let cancelled = units.iter().any(|u| u.cancelled);

        Self {
            specification: specification.to_string(),
            generated_at: Utc::now(),
            duration_ms: elapsed.as_millis() as u64,
            units,
            sections,
            totals,
            cancelled,
        }
    }

    pub fn section(&self, name: &str) -> Option<&SectionSummary> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Outcomes of one check, in context order.
    pub fn outcomes_for<'a>(&'a self, check_id: &'a str) -> impl Iterator<Item = &'a UnitOutcome> + 'a {
        self.units.iter().filter(move |u| u.check_id == check_id)
    }

    pub fn worst(&self) -> Option<Status> {
        self.totals.worst()
    }

    /// True when any unit ended in FAIL or ERROR.
    pub fn has_failures(&self) -> bool {
        self.units.iter().any(|u| u.status.is_failure())
    }

    /// Process exit status: 130 for an interrupted run, 1 when any unit
    /// failed or errored, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            CANCELLED_EXIT_CODE
        } else if self.has_failures() {
            1
        } else {
            0
        }
    }

    /// (check_id, context, status, message) rows, ignoring timing fields.
    pub fn rows(&self) -> Vec<(String, String, Status, String)> {
        self.units
            .iter()
            .map(|u| (u.check_id.clone(), u.context.clone(), u.status, u.message.clone()))
            .collect()
    }
}
