//! Parallel execution of a specification over inputs.
//!
//! The runner expands the specification into execution units and feeds them
//! to a fixed pool of worker threads through a shared queue. Each worker
//! sends finished outcomes back over an mpsc channel. Per unit:
//!
//! 1. the skip filter is consulted; a refusal is a SKIP with its reason
//! 2. required conditions are evaluated through the per-run cache; the first
//!    one not holding is a SKIP naming it, an evaluation error is an ERROR
//! 3. the check is invoked and its whole verdict sequence consumed
//!
//! Nothing a check or condition does can abort the run: errors and panics
//! are turned into ERROR outcomes for the unit that raised them. Every
//! resolved unit appears in the report exactly once.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::check::Check;
use crate::condition::ConditionCache;
use crate::document::Context;
use crate::event::CheckResult;
use crate::report::{Report, UnitOutcome};
use crate::resolver::{expand, ExecutionUnit, Inputs, Selection};
use crate::skip::{SharedSkipFilter, SkipFilter};
use crate::specification::Specification;
use crate::status::Status;

/// Best-effort text of a panic payload.
pub(crate) fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Cooperative cancellation flag shared between the caller and the workers.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop dispatching new units. Units already running finish normally.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a run
#[derive(Clone)]
pub struct RunOptions {
    /// Maximum number of units executing at once
    pub jobs: usize,
    /// Per-unit time limit; an expired unit is abandoned and reported as ERROR
    pub timeout: Option<Duration>,
    pub cancel: CancelToken,
    pub selection: Selection,
    /// Replaces the specification's own skip filter for this run
    pub skip_filter: Option<SharedSkipFilter>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            timeout: None,
            cancel: CancelToken::new(),
            selection: Selection::default(),
            skip_filter: None,
        }
    }
}

impl RunOptions {
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn skip_filter<F>(mut self, filter: F) -> Self
    where
        F: SkipFilter + 'static,
    {
        self.skip_filter = Some(Arc::new(filter));
        self
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("jobs", &self.jobs)
            .field("timeout", &self.timeout)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("selection", &self.selection)
            .field("skip_filter_override", &self.skip_filter.is_some())
            .finish()
    }
}

/// State shared by every worker of one run.
struct RunState {
    spec: Specification,
    cache: ConditionCache,
    skip_filter: Option<SharedSkipFilter>,
}

impl RunState {
    fn skip_filter(&self) -> &dyn SkipFilter {
        match &self.skip_filter {
            Some(filter) => filter.as_ref(),
            None => self.spec.skip_filter(),
        }
    }
}

/// Executes specifications.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: RunOptions,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run `spec` over `inputs` and collect the report.
    ///
    /// The report is sorted back into resolver order, so repeated runs over
    /// the same inputs list the same outcomes whatever the parallelism.
    pub fn run(&self, spec: &Specification, inputs: &Inputs) -> Report {
        let started = Instant::now();
        let units = expand(spec, inputs, &self.options.selection);
        let total = units.len();
        let workers = self.options.jobs.max(1).min(total.max(1));

        tracing::info!(
            specification = spec.name(),
            units = total,
            workers,
            "starting run"
        );

        let state = Arc::new(RunState {
            spec: spec.clone(),
            cache: ConditionCache::new(),
            skip_filter: self.options.skip_filter.clone(),
        });
        let queue = Arc::new(Mutex::new(units.iter().cloned().collect::<VecDeque<_>>()));
        let (tx, rx) = mpsc::channel::<UnitOutcome>();

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let state = Arc::clone(&state);
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let cancel = self.options.cancel.clone();
            let timeout = self.options.timeout;

            handles.push(thread::spawn(move || loop {
                if cancel.is_cancelled() {
                    tracing::debug!(worker, "cancelled, stopping dispatch");
                    break;
                }
                let next = queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .pop_front();
                let Some(unit) = next else {
                    break;
                };
                if tx.send(execute(&state, unit, timeout)).is_err() {
                    break;
                }
            }));
        }
        drop(tx);

        let mut outcomes: Vec<UnitOutcome> = rx.iter().collect();
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("runner worker thread panicked");
            }
        }

        // Units never reported were either left undispatched or lost with a worker.
        let mut reported = vec![false; total];
        for outcome in &outcomes {
            reported[outcome.index] = true;
        }
        let cancelled = self.options.cancel.is_cancelled();
        let mut undispatched = 0;
        for unit in units.iter().filter(|u| !reported[u.index]) {
            if cancelled {
                undispatched += 1;
                outcomes.push(UnitOutcome::cancelled(unit));
            } else {
                outcomes.push(UnitOutcome::from_results(
                    unit,
                    vec![CheckResult::new(
                        unit.check.id(),
                        Status::Error,
                        "worker stopped before reporting this unit",
                    )],
                    Duration::ZERO,
                ));
            }
        }
        if undispatched > 0 {
            tracing::warn!(undispatched, "run cancelled; remaining units flagged");
        }

        let report = Report::new(spec.name(), outcomes, started.elapsed());
        tracing::info!(
            specification = spec.name(),
            duration_ms = report.duration_ms,
            worst = ?report.worst(),
            condition_evaluations = state.cache.evaluations(),
            "run finished"
        );
        report
    }
}

/// Run with default options.
pub fn run(spec: &Specification, inputs: &Inputs) -> Report {
    Runner::default().run(spec, inputs)
}

fn execute(state: &Arc<RunState>, unit: ExecutionUnit, timeout: Option<Duration>) -> UnitOutcome {
    let started = Instant::now();
    let check_id = unit.check.id().to_string();

    let results = match timeout {
        None => evaluate_unit(state, &unit),
        Some(limit) => {
            let (tx, rx) = mpsc::channel();
            let detached_state = Arc::clone(state);
            let detached_unit = unit.clone();
            // Abandoned on timeout; the send fails silently once rx is gone.
            thread::spawn(move || {
                let _ = tx.send(evaluate_unit(&detached_state, &detached_unit));
            });
            match rx.recv_timeout(limit) {
                Ok(results) => results,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracing::warn!(
                        check = %check_id,
                        context = unit.context.descriptor(),
                        timeout_ms = limit.as_millis() as u64,
                        "unit timed out"
                    );
                    vec![CheckResult::new(
                        &check_id,
                        Status::Error,
                        format!("timed out after {}ms", limit.as_millis()),
                    )]
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => vec![CheckResult::new(
                    &check_id,
                    Status::Error,
                    "check thread exited without a result",
                )],
            }
        }
    };

    let outcome = UnitOutcome::from_results(&unit, results, started.elapsed());
    match outcome.status {
        Status::Error => tracing::error!(
            check = %check_id,
            context = %outcome.context,
            message = %outcome.message,
            "unit errored"
        ),
        status => tracing::debug!(
            check = %check_id,
            context = %outcome.context,
            %status,
            "unit finished"
        ),
    }
    outcome
}

fn evaluate_unit(state: &RunState, unit: &ExecutionUnit) -> Vec<CheckResult> {
    let check = unit.check.as_ref();
    let id = check.id();
    let context = &unit.context;

    let decision = match panic::catch_unwind(AssertUnwindSafe(|| {
        state.skip_filter().decide(id, context)
    })) {
        Ok(decision) => decision,
        Err(payload) => {
            return vec![CheckResult::new(
                id,
                Status::Error,
                format!("skip filter panicked: {}", describe_panic(&*payload)),
            )]
        }
    };
    if !decision.proceed {
        let reason = decision
            .reason
            .unwrap_or_else(|| "skipped by specification filter".to_string());
        return vec![CheckResult::new(id, Status::Skip, reason)];
    }

    for reference in check.conditions() {
        let Some(condition) = state.spec.condition(reference.name()) else {
            return vec![CheckResult::new(
                id,
                Status::Error,
                format!("condition '{}' is not registered", reference.name()),
            )];
        };
        match state.cache.evaluate(condition, context) {
            Ok(value) if reference.holds(value) => {}
            Ok(_) => {
                return vec![CheckResult::new(
                    id,
                    Status::Skip,
                    format!("{} not satisfied", reference),
                )]
            }
            Err(e) => {
                return vec![CheckResult::new(
                    id,
                    Status::Error,
                    format!("condition '{}' failed: {}", reference.name(), e),
                )]
            }
        }
    }

    invoke(check, context)
}

fn invoke(check: &Check, context: &Context) -> Vec<CheckResult> {
    let id = check.id();
    let collected = panic::catch_unwind(AssertUnwindSafe(|| -> anyhow::Result<Vec<CheckResult>> {
        let mut results = Vec::new();
        for verdict in check.run(context)? {
            results.push(CheckResult::from_verdict(id, verdict?));
        }
        Ok(results)
    }));

    match collected {
        Ok(Ok(results)) if results.is_empty() => {
            vec![CheckResult::new(id, Status::Error, "check produced no verdict")]
        }
        Ok(Ok(results)) => results,
        Ok(Err(e)) => vec![CheckResult::new(
            id,
            Status::Error,
            format!("check failed: {:#}", e),
        )],
        Err(payload) => vec![CheckResult::new(
            id,
            Status::Error,
            format!("check panicked: {}", describe_panic(&*payload)),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::document::Document;
    use crate::event::{verdicts, Verdict, Verdicts};
    use crate::skip::SkipDecision;
    use crate::specification::SpecificationBuilder;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn inputs(paths: &[&str]) -> Inputs {
        Inputs::new(paths.iter().map(|p| Document::new(*p, json!({}))).collect())
    }

    #[test]
    fn test_describe_panic_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(describe_panic(&*payload), "static");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(describe_panic(&*payload), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(describe_panic(&*payload), "unknown panic payload");
    }

    #[test]
    fn test_negated_condition_skip_names_reference() {
        let spec = SpecificationBuilder::new("s")
            .condition(Condition::new("is_variable", |_| Ok(true)))
            .check(
                Check::single("a/static_only", |_| Ok(verdicts(vec![Verdict::pass("ok")])))
                    .requires("not is_variable"),
            )
            .build()
            .unwrap();
        let report = Runner::default().run(&spec, &inputs(&["x"]));
        assert_eq!(report.units[0].status, Status::Skip);
        assert_eq!(report.units[0].message, "not is_variable not satisfied");
    }

    #[test]
    fn test_check_error_mid_sequence_becomes_single_error() {
        let spec = SpecificationBuilder::new("s")
            .check(Check::single("a/broken", |_| {
                let items: Vec<anyhow::Result<Verdict>> = vec![
                    Ok(Verdict::pass("first")),
                    Err(anyhow::anyhow!("lost the table")),
                    Ok(Verdict::pass("never seen")),
                ];
                let sequence: Verdicts = Box::new(items.into_iter());
                Ok(sequence)
            }))
            .build()
            .unwrap();
        let report = Runner::default().run(&spec, &inputs(&["x"]));
        let unit = &report.units[0];
        assert_eq!(unit.status, Status::Error);
        assert_eq!(unit.results.len(), 1);
        assert!(unit.message.contains("lost the table"));
    }

    #[test]
    fn test_run_option_filter_overrides_specification_filter() {
        let spec = SpecificationBuilder::new("s")
            .check(Check::single("a/x", |_| Ok(verdicts(vec![Verdict::pass("ok")]))))
            .build()
            .unwrap();
        let options = RunOptions::default()
            .skip_filter(|_: &str, _: &Context| SkipDecision::skip("not today"));
        let report = Runner::new(options).run(&spec, &inputs(&["x"]));
        assert_eq!(report.units[0].status, Status::Skip);
        assert_eq!(report.units[0].message, "not today");
    }

    #[test]
    fn test_single_job_runs_sequentially() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());
        let spec = SpecificationBuilder::new("s")
            .check(Check::single("a/x", move |_| {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                a.fetch_sub(1, Ordering::SeqCst);
                Ok(verdicts(vec![Verdict::pass("ok")]))
            }))
            .build()
            .unwrap();
        let report = Runner::new(RunOptions::default().jobs(1)).run(&spec, &inputs(&["a", "b", "c"]));
        assert_eq!(report.units.len(), 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cancel_before_run_flags_every_unit() {
        let token = CancelToken::new();
        token.cancel();
        let spec = SpecificationBuilder::new("s")
            .check(Check::single("a/x", |_| Ok(verdicts(vec![Verdict::pass("ok")]))))
            .build()
            .unwrap();
        let report = Runner::new(RunOptions::default().cancel_token(token)).run(&spec, &inputs(&["a", "b"]));
        assert!(report.cancelled);
        assert_eq!(report.units.len(), 2);
        assert!(report.units.iter().all(|u| u.cancelled && u.status == Status::Skip));
    }
}
