//! End-to-end tests driving the public API the way an instrumented
//! program and its test-generation framework would.

use std::collections::BTreeSet;

use augur::config::Config;
use augur::heuristics::{BooleanEvaluator, CmpOp, Value};
use augur::tracer::{Action, ExecutionTracer};

fn fresh_tracer() -> ExecutionTracer {
    let mut tracer = ExecutionTracer::new();
    tracer.reset();
    tracer
}

#[derive(Debug, PartialEq)]
struct SutError(&'static str);

// ---------------------------------------------------------------------------
// Full execution round trips
// ---------------------------------------------------------------------------

/// Simulates one instrumented action:
///
/// ```js
/// function classify(x) {
///   if (x === 42 && x < 100) { ... }
/// }
/// ```
///
/// executed with `x = 40`, then checks the fitness read-back.
#[test]
fn test_instrumented_branch_round_trip() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();

    tracer.set_action(&Action::new(0, BTreeSet::from(["x".to_string()])));
    tracer.entering_statement("classify.js", 2, 0);

    let x = 40.0;
    let taken: Result<bool, SutError> = eval.evaluate_and(
        &mut tracer,
        |eval, tracer| {
            Ok(eval.compare(
                tracer,
                &Value::from(x),
                CmpOp::StrictEq,
                &Value::from(42.0),
                "classify.js",
                2,
                1,
            ))
        },
        |eval, tracer| {
            Ok(eval.compare(
                tracer,
                &Value::from(x),
                CmpOp::Lt,
                &Value::from(100.0),
                "classify.js",
                2,
                2,
            ))
        },
        true,
        "classify.js",
        2,
        0,
    );
    tracer.completed_statement("classify.js", 2, 0);

    assert_eq!(taken, Ok(false));

    let snapshot = tracer.snapshot();
    // Reaching the statement covered the file and the line.
    assert_eq!(snapshot.objectives["file_classify.js"].value, 1.0);
    assert_eq!(snapshot.objectives["line_classify.js_00002"].value, 1.0);
    // The false branch of the conjunction is covered, the true branch is
    // graded: x was only 2 away from 42.
    assert_eq!(
        snapshot.objectives["branch_classify.js_00002_0_false"].value,
        1.0
    );
    let to_true = snapshot.objectives["branch_classify.js_00002_0_true"].value;
    assert!(to_true > 0.0 && to_true < 1.0);
    // The nested comparisons reported their own branch objectives too.
    assert_eq!(
        snapshot.objectives["branch_classify.js_00002_2_true"].value,
        1.0
    );
    assert!(snapshot.objectives["branch_classify.js_00002_1_true"].value > 0.0);
    // The statement stack drained.
    assert!(snapshot.additional_infos[0].statement_stack().is_empty());
    assert_eq!(
        snapshot.additional_infos[0].last_executed_statement(),
        Some("statement_classify.js_00002_0")
    );
    assert!(snapshot.additional_infos[0].input_variables().contains("x"));
}

/// A closer input must score the same objective higher: the signal a
/// search climbs.
#[test]
fn test_gradient_improves_across_executions() {
    let mut best = Vec::new();
    for x in [500.0, 90.0, 43.0] {
        let mut tracer = fresh_tracer();
        let mut eval = BooleanEvaluator::new();
        eval.compare(
            &mut tracer,
            &Value::from(x),
            CmpOp::StrictEq,
            &Value::from(42.0),
            "calc.js",
            1,
            0,
        );
        best.push(tracer.objective_coverage()["branch_calc.js_00001_0_true"].value);
    }
    assert!(best[0] < best[1]);
    assert!(best[1] < best[2]);
}

#[test]
fn test_multi_action_execution() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();

    tracer.set_action(&Action::new(0, BTreeSet::from(["a".to_string()])));
    eval.compare(
        &mut tracer,
        &Value::from(10.0),
        CmpOp::Lt,
        &Value::from(5.0),
        "api.js",
        3,
        0,
    );

    tracer.set_action(&Action::new(1, BTreeSet::from(["b".to_string()])));
    eval.compare(
        &mut tracer,
        &Value::from(4.0),
        CmpOp::Lt,
        &Value::from(5.0),
        "api.js",
        3,
        0,
    );

    let snapshot = tracer.snapshot();
    assert_eq!(snapshot.additional_infos.len(), 2);
    assert_eq!(snapshot.action_index, 1);
    // The second action flipped the branch; it owns the best value.
    let covered = &snapshot.objectives["branch_api.js_00003_0_true"];
    assert_eq!(covered.value, 1.0);
    assert_eq!(covered.action_index, 1);
}

#[test]
fn test_reset_between_executions_discards_everything() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();
    eval.compare(
        &mut tracer,
        &Value::from(1.0),
        CmpOp::Lt,
        &Value::from(2.0),
        "a.js",
        1,
        0,
    );
    assert!(tracer.number_of_objectives("branch_") > 0);

    tracer.reset();
    assert_eq!(tracer.number_of_objectives(""), 0);
    assert_eq!(tracer.additional_infos().len(), 1);
}

// ---------------------------------------------------------------------------
// Exception-semantics flows
// ---------------------------------------------------------------------------

#[test]
fn test_left_error_propagates_through_conjunction() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();
    let result: Result<bool, SutError> = eval.evaluate_and(
        &mut tracer,
        |_, _| Err(SutError("boom")),
        |eval, tracer| {
            Ok(eval.compare(
                tracer,
                &Value::from(42.0),
                CmpOp::StrictEq,
                &Value::from(42.0),
                "err.js",
                2,
                1,
            ))
        },
        true,
        "err.js",
        2,
        0,
    );
    assert_eq!(result, Err(SutError("boom")));
    // The aborted evaluation still produced a graded objective.
    let to_true = tracer.objective_coverage()["branch_err.js_00002_0_true"].value;
    assert!(to_true > 0.0 && to_true < 1.0);
}

#[test]
fn test_speculative_probe_error_never_escapes() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();
    let result: Result<bool, SutError> = eval.evaluate_and(
        &mut tracer,
        |eval, tracer| {
            Ok(eval.compare(
                tracer,
                &Value::from(0.0),
                CmpOp::StrictEq,
                &Value::from(42.0),
                "err.js",
                5,
                1,
            ))
        },
        |_, _| Err(SutError("never fires natively")),
        true,
        "err.js",
        5,
        0,
    );
    // Native short-circuit: left is false, the right error is observed
    // for scoring only.
    assert_eq!(result, Ok(false));
    assert_eq!(
        tracer.objective_coverage()["branch_err.js_00005_0_false"].value,
        1.0
    );
}

#[test]
fn test_ternary_records_partial_credit_on_error() {
    let mut tracer = fresh_tracer();
    let mut eval = BooleanEvaluator::new();
    let result: Result<f64, SutError> = eval.handle_ternary(
        &mut tracer,
        |_, _| Err(SutError("arm failed")),
        "tern.js",
        4,
        0,
    );
    assert_eq!(result, Err(SutError("arm failed")));
    assert_eq!(
        tracer.objective_coverage()["statement_tern.js_00004_0"].value,
        0.5
    );

    // A later successful pass upgrades the same objective.
    let result: Result<f64, SutError> =
        eval.handle_ternary(&mut tracer, |_, _| Ok(1.5), "tern.js", 4, 0);
    assert_eq!(result, Ok(1.5));
    assert_eq!(
        tracer.objective_coverage()["statement_tern.js_00004_0"].value,
        1.0
    );
}

#[test]
fn test_executing_method_upgrades_on_completion() {
    let mut tracer = fresh_tracer();
    tracer.executing_method("svc.js", 10, 0, false);
    tracer.executing_method("svc.js", 10, 0, true);
    assert_eq!(
        tracer.objective_coverage()["success_call_svc.js_00010_0"].value,
        1.0
    );
}

// ---------------------------------------------------------------------------
// Worker confinement and configuration
// ---------------------------------------------------------------------------

#[test]
fn test_per_worker_tracers_merge() {
    let mut workers: Vec<ExecutionTracer> = Vec::new();
    for (index, x) in [(0usize, 50.0), (1usize, 42.0)] {
        let mut tracer = fresh_tracer();
        let mut eval = BooleanEvaluator::new();
        tracer.set_action(&Action::new(index, BTreeSet::new()));
        eval.compare(
            &mut tracer,
            &Value::from(x),
            CmpOp::StrictEq,
            &Value::from(42.0),
            "w.js",
            1,
            0,
        );
        workers.push(tracer);
    }

    let mut merged = fresh_tracer();
    for worker in &workers {
        merged.merge_from(worker);
    }
    let covered = &merged.objective_coverage()["branch_w.js_00001_0_true"];
    assert_eq!(covered.value, 1.0);
    assert_eq!(covered.action_index, 1);
}

#[test]
fn test_config_disables_objective_kinds() {
    let mut config = Config::default();
    config.objectives.branches = false;
    let mut tracer = ExecutionTracer::with_config(&config);
    tracer.reset();
    let mut eval = BooleanEvaluator::new();
    let result = eval.compare(
        &mut tracer,
        &Value::from(1.0),
        CmpOp::Lt,
        &Value::from(2.0),
        "cfg.js",
        1,
        0,
    );
    // The native result is unaffected; only the recording is skipped.
    assert!(result);
    assert!(eval.pending().unwrap().is_true());
    assert_eq!(tracer.number_of_objectives("branch_"), 0);
}

#[test]
fn test_snapshot_json_export() {
    let mut tracer = fresh_tracer();
    tracer.entering_statement("app.js", 1, 0);
    tracer.completed_statement("app.js", 1, 0);
    let json = tracer.snapshot().to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed["objectives"]["line_app.js_00001"]["value"].is_number());
    assert_eq!(parsed["action_index"], 0);
}
