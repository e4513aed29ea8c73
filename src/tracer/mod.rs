//! Execution-scoped coverage state.
//!
//! [`ExecutionTracer`] aggregates the best observed value per coverage
//! objective during one test execution, together with per-action
//! diagnostics (statement call-stack, input variables). The driving
//! framework resets it before each execution and reads it back
//! afterwards as the fitness signal.
//!
//! One logical test action executes to completion on a single thread
//! before the next begins. Hosts that execute actions concurrently must
//! confine one tracer per worker and fold the results together with
//! [`ExecutionTracer::merge_from`] afterwards; the process-wide
//! [`global`] handle exists for single-threaded embedders only.

pub mod objectives;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::{Config, ObjectivesConfig};
use crate::core::Result;
use crate::heuristics::Truthness;

/// Best graded score observed so far for one coverage objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetInfo {
    /// Objective identifier (see [`objectives`]).
    pub id: String,
    /// Best observed value in [0, 1]; 1 means covered.
    pub value: f64,
    /// Index of the action that achieved the best value.
    pub action_index: usize,
}

/// Per-action execution diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdditionalInfo {
    statement_stack: Vec<String>,
    last_executed_statement: Option<String>,
    input_variables: BTreeSet<String>,
}

impl AdditionalInfo {
    /// Markers of the statements currently executing, outermost first.
    pub fn statement_stack(&self) -> &[String] {
        &self.statement_stack
    }

    /// Marker of the most recently completed statement.
    pub fn last_executed_statement(&self) -> Option<&str> {
        self.last_executed_statement.as_deref()
    }

    /// Names of the input variables this action consumed.
    pub fn input_variables(&self) -> &BTreeSet<String> {
        &self.input_variables
    }
}

/// A test action the driving framework is about to execute.
#[derive(Debug, Clone, Default)]
pub struct Action {
    /// Position of the action in the test.
    pub index: usize,
    /// Names of the input variables the action uses.
    pub input_variables: BTreeSet<String>,
}

impl Action {
    /// Create a new action.
    pub fn new(index: usize, input_variables: BTreeSet<String>) -> Self {
        Self {
            index,
            input_variables,
        }
    }
}

/// Read-back view of one execution's coverage, consumed by the driving
/// framework to compute fitness.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageSnapshot {
    /// Best observed value per objective, sorted by id.
    pub objectives: BTreeMap<String, TargetInfo>,
    /// Per-action diagnostics, one entry per action index encountered.
    pub additional_infos: Vec<AdditionalInfo>,
    /// Index of the last executing action.
    pub action_index: usize,
}

impl CoverageSnapshot {
    /// Serialize the snapshot to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Execution-scoped coverage state, mutated inline by every instrumented
/// call site.
#[derive(Debug)]
pub struct ExecutionTracer {
    objective_coverage: HashMap<String, TargetInfo>,
    additional_infos: Vec<AdditionalInfo>,
    action_index: usize,
    input_variables: BTreeSet<String>,
    objectives_config: ObjectivesConfig,
    track_input_variables: bool,
}

impl Default for ExecutionTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionTracer {
    /// Create a tracer with default configuration.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create a tracer honoring the given configuration.
    pub fn with_config(config: &Config) -> Self {
        Self {
            objective_coverage: HashMap::new(),
            additional_infos: vec![AdditionalInfo::default()],
            action_index: 0,
            input_variables: BTreeSet::new(),
            objectives_config: config.objectives.clone(),
            track_input_variables: config.tracer.track_input_variables,
        }
    }

    /// Reinitialize for a new test execution.
    ///
    /// Must be called once at the start of every execution; everything
    /// recorded before it belongs to the previous execution and is
    /// discarded.
    pub fn reset(&mut self) {
        let leaked: usize = self
            .additional_infos
            .iter()
            .map(|info| info.statement_stack.len())
            .sum();
        if leaked > 0 {
            tracing::warn!(
                leaked,
                "discarding statement markers left by an aborted execution"
            );
        }
        tracing::debug!(
            objectives = self.objective_coverage.len(),
            actions = self.additional_infos.len(),
            "tracer reset"
        );
        self.objective_coverage.clear();
        self.additional_infos.clear();
        self.additional_infos.push(AdditionalInfo::default());
        self.action_index = 0;
        self.input_variables.clear();
    }

    /// Switch to a new test action.
    ///
    /// A changed index appends a fresh per-action record; an action that
    /// declares a non-empty input-variable set replaces the current one.
    pub fn set_action(&mut self, action: &Action) {
        if action.index != self.action_index {
            tracing::trace!(index = action.index, "action switch");
            self.action_index = action.index;
            self.additional_infos.push(AdditionalInfo::default());
        }
        if self.track_input_variables && !action.input_variables.is_empty() {
            self.input_variables = action.input_variables.clone();
            self.current_info_mut().input_variables = action.input_variables.clone();
        }
    }

    /// Fold a new observation into the objective map.
    ///
    /// Values are best-so-far: the stored value for an id never
    /// decreases within one execution. The action index records which
    /// action achieved the current best.
    ///
    /// # Panics
    ///
    /// Panics if `value` is outside [0, 1].
    pub fn update_objective(&mut self, id: &str, value: f64) {
        assert!(
            (0.0..=1.0).contains(&value),
            "objective value out of [0, 1]: {value} for {id}"
        );
        match self.objective_coverage.get_mut(id) {
            Some(existing) => {
                if value > existing.value {
                    existing.value = value;
                    existing.action_index = self.action_index;
                }
            }
            None => {
                self.objective_coverage.insert(
                    id.to_string(),
                    TargetInfo {
                        id: id.to_string(),
                        value,
                        action_index: self.action_index,
                    },
                );
            }
        }
    }

    /// Record that an instrumented statement is about to execute: full
    /// credit for the enclosing file- and line-level objectives, and a
    /// marker pushed on the current action's statement stack.
    pub fn entering_statement(&mut self, file: &str, line: u32, stmt_id: u32) {
        if self.objectives_config.files {
            self.update_objective(&objectives::file_id(file), 1.0);
        }
        if self.objectives_config.lines {
            self.update_objective(&objectives::line_id(file, line), 1.0);
        }
        let marker = objectives::statement_id(file, line, stmt_id);
        self.current_info_mut().statement_stack.push(marker);
    }

    /// Record that the statement pushed by the matching
    /// [`entering_statement`] completed.
    ///
    /// # Panics
    ///
    /// Panics if the popped marker does not match: the rewriter emitted
    /// unbalanced enter/complete pairs, which is an instrumentation bug,
    /// not a recoverable condition.
    ///
    /// [`entering_statement`]: Self::entering_statement
    pub fn completed_statement(&mut self, file: &str, line: u32, stmt_id: u32) {
        let expected = objectives::statement_id(file, line, stmt_id);
        let info = self.current_info_mut();
        let popped = info.statement_stack.pop();
        assert!(
            popped.as_deref() == Some(expected.as_str()),
            "unbalanced statement stack: expected {expected}, popped {popped:?}"
        );
        info.last_executed_statement = Some(expected);
    }

    /// Record the outcome of an instrumented call: full credit when it
    /// completed without error, half credit when it was entered but
    /// aborted.
    pub fn executing_method(&mut self, file: &str, line: u32, index: u32, completed: bool) {
        if self.objectives_config.success_calls {
            let value = if completed { 1.0 } else { 0.5 };
            self.update_objective(&objectives::success_call_id(file, line, index), value);
        }
    }

    /// Report a branch truthness at an instrumented comparison or
    /// `&&`/`||` call site: the true side scores the true-branch
    /// objective, the false side the false-branch objective.
    pub(crate) fn update_branch(
        &mut self,
        file: &str,
        line: u32,
        branch: u32,
        truthness: &Truthness,
    ) {
        if !self.objectives_config.branches {
            return;
        }
        self.update_objective(
            &objectives::branch_id(file, line, branch, true),
            truthness.of_true(),
        );
        self.update_objective(
            &objectives::branch_id(file, line, branch, false),
            truthness.of_false(),
        );
    }

    /// Report credit for a ternary arm at its statement objective.
    pub(crate) fn update_statement(&mut self, file: &str, line: u32, index: u32, credit: f64) {
        if !self.objectives_config.statements {
            return;
        }
        self.update_objective(&objectives::statement_id(file, line, index), credit);
    }

    /// Best observed value per objective id.
    pub fn objective_coverage(&self) -> &HashMap<String, TargetInfo> {
        &self.objective_coverage
    }

    /// Per-action diagnostics, one entry per action index encountered.
    pub fn additional_infos(&self) -> &[AdditionalInfo] {
        &self.additional_infos
    }

    /// Index of the action currently executing.
    pub fn action_index(&self) -> usize {
        self.action_index
    }

    /// Input variables declared by the current action.
    pub fn input_variables(&self) -> &BTreeSet<String> {
        &self.input_variables
    }

    /// Number of objectives whose id starts with `prefix`.
    pub fn number_of_objectives(&self, prefix: &str) -> usize {
        self.objective_coverage
            .keys()
            .filter(|id| id.starts_with(prefix))
            .count()
    }

    /// Copy the current state into a serializable snapshot.
    pub fn snapshot(&self) -> CoverageSnapshot {
        CoverageSnapshot {
            objectives: self
                .objective_coverage
                .iter()
                .map(|(id, info)| (id.clone(), info.clone()))
                .collect(),
            additional_infos: self.additional_infos.clone(),
            action_index: self.action_index,
        }
    }

    /// Fold another tracer's results into this one.
    ///
    /// Concurrent hosts run one tracer per worker; the driving framework
    /// merges them after the workers complete. Objective values keep the
    /// per-id maximum; per-action records are appended in worker order.
    /// Workers are expected to use disjoint action indices.
    pub fn merge_from(&mut self, other: &ExecutionTracer) {
        for info in other.objective_coverage.values() {
            match self.objective_coverage.get_mut(&info.id) {
                Some(existing) => {
                    if info.value > existing.value {
                        existing.value = info.value;
                        existing.action_index = info.action_index;
                    }
                }
                None => {
                    self.objective_coverage.insert(info.id.clone(), info.clone());
                }
            }
        }
        self.additional_infos
            .extend(other.additional_infos.iter().cloned());
        tracing::debug!(
            objectives = self.objective_coverage.len(),
            "merged worker tracer"
        );
    }

    fn current_info_mut(&mut self) -> &mut AdditionalInfo {
        if self.additional_infos.is_empty() {
            self.additional_infos.push(AdditionalInfo::default());
        }
        let last = self.additional_infos.len() - 1;
        &mut self.additional_infos[last]
    }
}

static TRACER: Lazy<Mutex<ExecutionTracer>> = Lazy::new(|| Mutex::new(ExecutionTracer::new()));

/// Process-wide tracer for single-threaded embedders.
///
/// The mutex guards the handoff between the SUT thread and the driving
/// framework, not concurrent test actions: one logical action must run
/// to completion before the next begins, and the state must not be read
/// concurrently with the next `reset()`.
pub fn global() -> &'static Mutex<ExecutionTracer> {
    &TRACER
}
