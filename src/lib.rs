//! # Bakery - declarative quality checks
//!
//! Bakery runs declarative *specifications* of quality checks over parsed
//! input documents (font files, in the builtin specifications) and reports a
//! graded verdict per check and input.
//!
//! ## Core Concepts
//!
//! - **Checks**: explicit declarations with an id, required conditions and a
//!   scope (one document, or a group of related documents)
//! - **Conditions**: named predicates over a context, evaluated at most once
//!   per context in a run
//! - **Specifications**: frozen registries of sections, checks and conditions,
//!   composable through additive imports and pinned by expected-check
//!   manifests
//! - **Runner**: expands a specification over the inputs and executes every
//!   unit on a worker pool, never letting a broken check abort the run
//!
//! ## Modules
//!
//! - [`specification`] - Building and querying specifications
//! - [`check`] / [`condition`] / [`section`] - Declarations
//! - [`import`] / [`manifest`] - Composition and its verification
//! - [`resolver`] - Expansion into execution units
//! - [`runner`] - Parallel execution with timeouts and cancellation
//! - [`report`] - Aggregated results
//! - [`specifications`] - Builtin `general` and `adobe_fonts` specifications
//! - [`config`] - Project and global configuration
//!
//! ## Example
//!
//! ```no_run
//! use bakery::check::Check;
//! use bakery::condition::Condition;
//! use bakery::document::Document;
//! use bakery::event::{verdicts, Verdict};
//! use bakery::resolver::Inputs;
//! use bakery::runner::Runner;
//! use bakery::specification::SpecificationBuilder;
//!
//! let spec = SpecificationBuilder::new("demo")
//!     .condition(Condition::new("has_name", |ctx| {
//!         Ok(ctx.documents().iter().all(|d| d.get_str("name").is_some()))
//!     }))
//!     .check(
//!         Check::single("demo/check/name_not_empty", |ctx| {
//!             let empty = ctx.documents().iter().any(|d| d.get_str("name") == Some(""));
//!             Ok(verdicts(vec![if empty {
//!                 Verdict::fail("name is empty")
//!             } else {
//!                 Verdict::pass("name is set")
//!             }]))
//!         })
//!         .requires("has_name"),
//!     )
//!     .build()
//!     .expect("valid specification");
//!
//! let inputs = Inputs::load(&["a.json", "b.json"]).expect("readable inputs");
//! let report = Runner::default().run(&spec, &inputs);
//! println!("worst status: {:?}", report.worst());
//! ```

pub mod check;
pub mod condition;
pub mod config;
pub mod document;
pub mod errors;
pub mod event;
pub mod import;
pub mod manifest;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod section;
pub mod skip;
pub mod specification;
pub mod specifications;
pub mod status;

pub use check::{Check, CheckId, Scope};
pub use condition::{Condition, ConditionRef};
pub use document::{Context, Document, DocumentGroup, GroupKey};
pub use errors::{SpecError, SpecResult};
pub use event::{verdicts, CheckResult, Verdict, Verdicts};
pub use report::Report;
pub use resolver::{Inputs, Selection};
pub use runner::{CancelToken, RunOptions, Runner};
pub use specification::{Specification, SpecificationBuilder};
pub use status::Status;
