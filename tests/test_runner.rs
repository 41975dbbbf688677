//! Runner behavior: gating, caching, error isolation, ordering, timeouts and
//! cancellation.

use bakery::check::Check;
use bakery::condition::Condition;
use bakery::document::{Context, Document};
use bakery::event::{verdicts, Verdict, Verdicts};
use bakery::resolver::Inputs;
use bakery::runner::{CancelToken, RunOptions, Runner};
use bakery::skip::SkipDecision;
use bakery::specification::SpecificationBuilder;
use bakery::status::Status;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

mod support;
use support::builders::{counted_check, counted_condition, passing, FontBuilder};

// ============================================================================
// GATING
// ============================================================================

#[test]
fn test_required_field_scenario() {
    let spec = SpecificationBuilder::new("scenario")
        .condition(Condition::new("has_required_field", |ctx| {
            Ok(ctx.descriptor() == "doc1")
        }))
        .check(
            Check::single("field_not_empty", |ctx| {
                let doc = ctx.document().expect("single document");
                let value = doc.get_str("field").unwrap_or_default();
                Ok(verdicts(vec![if value.is_empty() {
                    Verdict::fail("field is empty")
                } else {
                    Verdict::pass("field is set")
                }]))
            })
            .requires("has_required_field"),
        )
        .build()
        .unwrap();

    let inputs = Inputs::new(vec![
        Document::new("doc1", json!({"field": "value"})),
        Document::new("doc2", json!({})),
    ]);
    let report = Runner::default().run(&spec, &inputs);

    assert_eq!(
        report.rows(),
        vec![
            (
                "field_not_empty".to_string(),
                "doc1".to_string(),
                Status::Pass,
                "field is set".to_string()
            ),
            (
                "field_not_empty".to_string(),
                "doc2".to_string(),
                Status::Skip,
                "has_required_field not satisfied".to_string()
            ),
        ]
    );
}

#[test]
fn test_check_never_invoked_when_condition_false() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let spec = SpecificationBuilder::new("s")
        .condition(Condition::new("never", |_| Ok(false)))
        .check(counted_check("a/gated", invocations.clone()).requires("never"))
        .build()
        .unwrap();
    let inputs = Inputs::new(vec![
        FontBuilder::new("a.json").build(),
        FontBuilder::new("b.json").build(),
    ]);

    let report = Runner::default().run(&spec, &inputs);

    assert_eq!(invocations.load(Ordering::SeqCst), 0);
    assert!(report.units.iter().all(|u| u.status == Status::Skip));
}

#[test]
fn test_first_unsatisfied_condition_short_circuits() {
    let second = Arc::new(AtomicUsize::new(0));
    let spec = SpecificationBuilder::new("s")
        .condition(Condition::new("first", |_| Ok(false)))
        .condition(counted_condition("second", second.clone(), |_| true))
        .check(passing("a/x").requires("first").requires("second"))
        .build()
        .unwrap();
    let report = Runner::default().run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));

    assert_eq!(report.units[0].message, "first not satisfied");
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

// ============================================================================
// CONDITION CACHE
// ============================================================================

#[test]
fn test_condition_evaluated_once_per_context_across_checks() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let mut builder = SpecificationBuilder::new("s").condition(counted_condition(
        "shared",
        evaluations.clone(),
        |_| true,
    ));
    for i in 0..6 {
        builder = builder.check(passing(&format!("a/check_{}", i)).requires("shared"));
    }
    let spec = builder.build().unwrap();
    let inputs = Inputs::new(vec![
        FontBuilder::new("a.json").build(),
        FontBuilder::new("b.json").build(),
        FontBuilder::new("c.json").build(),
    ]);

    let report = Runner::new(RunOptions::default().jobs(8)).run(&spec, &inputs);

    assert_eq!(report.units.len(), 18);
    assert_eq!(evaluations.load(Ordering::SeqCst), 3);
}

#[test]
fn test_negated_and_plain_references_share_one_evaluation() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let spec = SpecificationBuilder::new("s")
        .condition(counted_condition("is_variable_font", evaluations.clone(), |_| false))
        .check(passing("a/variable_only").requires("is_variable_font"))
        .check(passing("a/static_only").requires("not is_variable_font"))
        .build()
        .unwrap();
    let report = Runner::default().run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));

    let statuses: Vec<Status> = report.units.iter().map(|u| u.status).collect();
    assert_eq!(statuses, vec![Status::Skip, Status::Pass]);
    assert_eq!(evaluations.load(Ordering::SeqCst), 1);
}

#[test]
fn test_fresh_cache_per_run() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let spec = SpecificationBuilder::new("s")
        .condition(counted_condition("c", evaluations.clone(), |_| true))
        .check(passing("a/x").requires("c"))
        .build()
        .unwrap();
    let inputs = Inputs::new(vec![FontBuilder::new("a").build()]);
    let runner = Runner::default();
    runner.run(&spec, &inputs);
    runner.run(&spec, &inputs);
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
}

// ============================================================================
// ERROR ISOLATION
// ============================================================================

#[test]
fn test_condition_error_becomes_error_for_dependents() {
    let spec = SpecificationBuilder::new("s")
        .condition(Condition::new("broken", |_| anyhow::bail!("table is corrupt")))
        .check(passing("a/dependent").requires("broken"))
        .check(passing("a/independent"))
        .build()
        .unwrap();
    let report = Runner::default().run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));

    assert_eq!(report.units[0].status, Status::Error);
    assert_eq!(
        report.units[0].message,
        "condition 'broken' failed: table is corrupt"
    );
    assert_eq!(report.units[1].status, Status::Pass);
}

#[test]
fn test_check_failing_midway_is_isolated() {
    let spec = SpecificationBuilder::new("s")
        .check(Check::single("a/broken", |_| {
            let items: Vec<anyhow::Result<Verdict>> = vec![
                Ok(Verdict::pass("partial")),
                Err(anyhow::anyhow!("unexpected end of table")),
            ];
            let sequence: Verdicts = Box::new(items.into_iter());
            Ok(sequence)
        }))
        .check(Check::single("a/panics", |_| panic!("index out of range")))
        .check(passing("a/fine"))
        .build()
        .unwrap();
    let inputs = Inputs::new(vec![
        FontBuilder::new("a").build(),
        FontBuilder::new("b").build(),
    ]);

    let report = Runner::new(RunOptions::default().jobs(2)).run(&spec, &inputs);

    assert_eq!(report.units.len(), 6);
    let statuses: Vec<Status> = report.units.iter().map(|u| u.status).collect();
    assert_eq!(
        statuses,
        vec![
            Status::Error,
            Status::Error,
            Status::Error,
            Status::Error,
            Status::Pass,
            Status::Pass
        ]
    );
    assert!(report.units[0].message.contains("unexpected end of table"));
    assert!(report.units[2].message.contains("index out of range"));
}

#[test]
fn test_empty_verdict_sequence_is_error() {
    let spec = SpecificationBuilder::new("s")
        .check(Check::single("a/silent", |_| Ok(verdicts(vec![]))))
        .build()
        .unwrap();
    let report = Runner::default().run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));
    assert_eq!(report.units[0].status, Status::Error);
    assert_eq!(report.units[0].message, "check produced no verdict");
}

#[test]
fn test_domain_failures_pass_through_untouched() {
    let spec = SpecificationBuilder::new("s")
        .check(Check::single("a/mixed", |_| {
            Ok(verdicts(vec![
                Verdict::warn("first warning"),
                Verdict::fail("first failure"),
                Verdict::fail("second failure"),
            ]))
        }))
        .build()
        .unwrap();
    let report = Runner::default().run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));
    let unit = &report.units[0];
    assert_eq!(unit.status, Status::Fail);
    assert_eq!(unit.message, "first failure");
    assert_eq!(unit.results.len(), 3);
    assert!(unit.results.iter().all(|r| r.check_id == "a/mixed"));
}

// ============================================================================
// SKIP FILTER
// ============================================================================

#[test]
fn test_skip_filter_wins_over_conditions() {
    let evaluations = Arc::new(AtomicUsize::new(0));
    let spec = SpecificationBuilder::new("s")
        .condition(counted_condition("always", evaluations.clone(), |_| true))
        .check(passing("a/x").requires("always"))
        .check(passing("a/y").requires("always"))
        .skip_filter(|check_id: &str, ctx: &Context| {
            if check_id == "a/x" && ctx.descriptor() == "b.json" {
                SkipDecision::skip("not applicable to b")
            } else {
                SkipDecision::proceed()
            }
        })
        .build()
        .unwrap();
    let inputs = Inputs::new(vec![
        FontBuilder::new("a.json").build(),
        FontBuilder::new("b.json").build(),
    ]);

    let report = Runner::new(RunOptions::default().jobs(1)).run(&spec, &inputs);

    let rows = report.rows();
    assert_eq!(rows[0].2, Status::Pass);
    assert_eq!(rows[1].2, Status::Skip);
    assert_eq!(rows[1].3, "not applicable to b");
    assert_eq!(rows[2].2, Status::Pass);
    assert_eq!(rows[3].2, Status::Pass);
    // b.json's evaluation is still needed by a/y
    assert_eq!(evaluations.load(Ordering::SeqCst), 2);
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_reports_identical_across_runs_and_parallelism() {
    let spec = SpecificationBuilder::new("s")
        .condition(Condition::new("odd", |ctx| Ok(ctx.descriptor().ends_with('1'))))
        .check(Check::single("a/slow", |ctx| {
            let delay = ctx.descriptor().len() as u64 % 3;
            thread::sleep(Duration::from_millis(delay));
            Ok(verdicts(vec![Verdict::pass(format!("checked {}", ctx.descriptor()))]))
        }))
        .check(passing("a/gated").requires("odd"))
        .check(Check::grouped("a/family", |ctx| {
            Ok(verdicts(vec![Verdict::pass(format!(
                "{} members",
                ctx.documents().len()
            ))]))
        }))
        .build()
        .unwrap();
    let inputs = Inputs::new(
        (0..12)
            .map(|i| {
                FontBuilder::new(&format!("font{}", i))
                    .family(if i % 2 == 0 { "Even" } else { "Odd" })
                    .build()
            })
            .collect(),
    );

    let sequential = Runner::new(RunOptions::default().jobs(1)).run(&spec, &inputs);
    let parallel = Runner::new(RunOptions::default().jobs(8)).run(&spec, &inputs);
    let again = Runner::new(RunOptions::default().jobs(8)).run(&spec, &inputs);

    assert_eq!(sequential.rows(), parallel.rows());
    assert_eq!(parallel.rows(), again.rows());
    assert_eq!(sequential.units.len(), 12 + 12 + 2);
    assert_eq!(sequential.sections, parallel.sections);
}

// ============================================================================
// TIMEOUT AND CANCELLATION
// ============================================================================

#[test]
fn test_timeout_maps_to_error_and_run_continues() {
    let spec = SpecificationBuilder::new("s")
        .check(Check::single("a/hangs", |_| {
            thread::sleep(Duration::from_millis(500));
            Ok(verdicts(vec![Verdict::pass("too late")]))
        }))
        .check(passing("a/quick"))
        .build()
        .unwrap();
    let options = RunOptions::default()
        .jobs(2)
        .timeout(Duration::from_millis(50));
    let report = Runner::new(options).run(&spec, &Inputs::new(vec![FontBuilder::new("a").build()]));

    assert_eq!(report.units[0].status, Status::Error);
    assert_eq!(report.units[0].message, "timed out after 50ms");
    assert_eq!(report.units[1].status, Status::Pass);
}

#[test]
fn test_cancellation_flags_undispatched_units() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let spec = SpecificationBuilder::new("s")
        .check(Check::single("a/x", move |_| {
            trigger.cancel();
            Ok(verdicts(vec![Verdict::pass("ran")]))
        }))
        .build()
        .unwrap();
    let inputs = Inputs::new(
        (0..5)
            .map(|i| FontBuilder::new(&format!("f{}", i)).build())
            .collect(),
    );

    let report = Runner::new(RunOptions::default().jobs(1).cancel_token(token)).run(&spec, &inputs);

    assert!(report.cancelled);
    assert_eq!(report.exit_code(), 130);
    assert_eq!(report.units.len(), 5);
    assert_eq!(report.units[0].status, Status::Pass);
    assert!(!report.units[0].cancelled);
    for unit in &report.units[1..] {
        assert!(unit.cancelled);
        assert_eq!(unit.status, Status::Skip);
        assert_eq!(unit.message, "run cancelled before dispatch");
    }
}

#[test]
fn test_every_unit_reported_exactly_once() {
    let spec = SpecificationBuilder::new("s")
        .check(passing("a/x"))
        .check(Check::grouped("a/g", |_| Ok(verdicts(vec![Verdict::pass("ok")]))))
        .build()
        .unwrap();
    let inputs = Inputs::new(vec![
        FontBuilder::new("1").family("A").build(),
        FontBuilder::new("2").family("A").build(),
        FontBuilder::new("3").build(),
    ]);
    let report = Runner::new(RunOptions::default().jobs(3)).run(&spec, &inputs);
    let mut indices: Vec<usize> = report.units.iter().map(|u| u.index).collect();
    indices.dedup();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(report.totals.pass, 5);
}
