//! Augur - runtime branch-distance heuristics for search-based test generation.
//!
//! Augur converts crisp boolean outcomes inside an instrumented
//! system-under-test into graded "how close to true / how close to false"
//! scores, and aggregates them into a per-execution map of
//! coverage-objective fitness. A search algorithm reads the aggregated
//! signal to decide which test mutations to keep; without the gradient it
//! sees only flat 0/1 feedback and cannot climb toward uncovered
//! branches.
//!
//! The engine is semantically transparent: instrumented expressions keep
//! their native results, short-circuit behavior and errors, while a
//! secondary numeric signal is folded into the [`tracer::ExecutionTracer`].
//!
//! # Example
//!
//! ```
//! use augur::heuristics::{BooleanEvaluator, CmpOp, Value};
//! use augur::tracer::ExecutionTracer;
//!
//! let mut tracer = ExecutionTracer::new();
//! tracer.reset();
//! let mut eval = BooleanEvaluator::new();
//!
//! // x === 42, observed with x = 40: false, but close.
//! let result = eval.compare(
//!     &mut tracer,
//!     &Value::from(40.0),
//!     CmpOp::StrictEq,
//!     &Value::from(42.0),
//!     "calc.js",
//!     7,
//!     0,
//! );
//! assert!(!result);
//!
//! let snapshot = tracer.snapshot();
//! let to_true = &snapshot.objectives["branch_calc.js_00007_0_true"];
//! assert!(to_true.value > 0.0 && to_true.value < 1.0);
//! ```

pub mod config;
pub mod core;
pub mod heuristics;
pub mod tracer;

pub use config::Config;
pub use core::{Error, Result};
pub use heuristics::{BooleanEvaluator, CmpOp, Truthness, Value};
pub use tracer::{Action, CoverageSnapshot, ExecutionTracer, TargetInfo};
