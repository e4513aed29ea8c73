//! Boolean operator evaluation with graded outcomes.
//!
//! [`BooleanEvaluator`] stands in for the host's comparison and logical
//! operators at instrumented call sites. The real result is always
//! computed with the native operator semantics and returned unchanged; a
//! [`Truthness`] gradient is derived on the side and folded into an
//! [`ExecutionTracer`]. Short-circuit and error semantics of the original
//! expressions are preserved exactly, with one documented exception: a
//! speculatively probed pure right operand may raise an error that native
//! evaluation would never have triggered, and that error is observed for
//! scoring but swallowed.
//!
//! SUT errors are modeled as the `Err` arm of the operand thunks'
//! `Result`; re-raising is returning that error to the caller.

use crate::tracer::ExecutionTracer;

use super::truthness::{
    equality_truthness_number, equality_truthness_string, less_than_truthness,
    less_than_truthness_string, Truthness,
};
use super::value::Value;
use super::{EXCEPTION, FLAG_NO_EXCEPTION};

/// Comparison operators understood by [`BooleanEvaluator::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// Loose equality (`==`).
    Eq,
    /// Strict equality (`===`).
    StrictEq,
    /// Loose inequality (`!=`).
    Ne,
    /// Strict inequality (`!==`).
    StrictNe,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CmpOp {
    /// Parse an operator from its source form, as emitted by the
    /// code-rewriting step.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Self::Eq),
            "===" => Some(Self::StrictEq),
            "!=" => Some(Self::Ne),
            "!==" => Some(Self::StrictNe),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Source form of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::StrictEq => "===",
            Self::Ne => "!=",
            Self::StrictNe => "!==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// One evaluated operand: its native result and the truthness assigned
/// to it, with the error (if any) carried for the re-raise decision.
struct Probe<E> {
    value: Result<bool, E>,
    truthness: Truthness,
}

/// Evaluates comparisons and logical combinators on dynamically-typed
/// operands.
///
/// The evaluator is the explicit context threaded through an
/// instrumented expression tree; operand thunks receive it (plus the
/// tracer) so nested instrumented sub-expressions share the same state.
#[derive(Debug, Default)]
pub struct BooleanEvaluator {
    /// Truthness pending from the most recent sub-expression.
    ///
    /// At most one value is pending at a time, valid for the lifetime of
    /// one evaluation call tree. Every combinator that evaluates a
    /// sub-expression consumes this slot immediately afterwards, so
    /// unrelated boolean sub-expressions never observe each other's
    /// gradient.
    last: Option<Truthness>,
}

impl BooleanEvaluator {
    /// Create a new evaluator with an empty pending slot.
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Truthness pending from the most recent comparison, if any.
    pub fn pending(&self) -> Option<Truthness> {
        self.last
    }

    /// Drop any pending truthness.
    ///
    /// Statement-level instrumentation calls this at expression
    /// boundaries so a gradient never leaks past the expression that
    /// produced it.
    pub fn clear_pending(&mut self) {
        self.last = None;
    }

    /// Evaluate `left op right`.
    ///
    /// Returns the native result, reports the true/false branch
    /// objectives at `(file, line, branch)`, and leaves the truthness in
    /// the pending slot for an enclosing combinator.
    pub fn compare(
        &mut self,
        tracer: &mut ExecutionTracer,
        left: &Value,
        op: CmpOp,
        right: &Value,
        file: &str,
        line: u32,
        branch: u32,
    ) -> bool {
        let (result, truthness) = compare_values(left, op, right);
        tracer.update_branch(file, line, branch, &truthness);
        self.last = Some(truthness);
        result
    }

    /// Emulate `left && right` with native short-circuit semantics.
    ///
    /// `right_is_pure` marks a side-effect-free right operand that may be
    /// probed purely for its gradient even when the left operand already
    /// short-circuits. An error raised by such a probe could never fire
    /// natively, so it is used for scoring and swallowed; a left error,
    /// or a right error when the left operand was truthy, is re-raised
    /// unchanged.
    pub fn evaluate_and<E>(
        &mut self,
        tracer: &mut ExecutionTracer,
        left: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<bool, E>,
        right: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<bool, E>,
        right_is_pure: bool,
        file: &str,
        line: u32,
        branch: u32,
    ) -> Result<bool, E> {
        let left_probe = self.probe(tracer, left);
        let left_is_true = matches!(left_probe.value, Ok(true));

        let (truthness, right_probe) = if left_is_true || right_is_pure {
            let right_probe = self.probe(tracer, right);
            let of_true =
                (left_probe.truthness.of_true() + right_probe.truthness.of_true()) / 2.0;
            // A right operand evaluated after a left error never ran under
            // native semantics; its falsehood evidence is discounted.
            let right_of_false = if left_probe.value.is_err() {
                right_probe.truthness.of_false() / 2.0
            } else {
                right_probe.truthness.of_false()
            };
            let of_false = left_probe.truthness.of_false().max(right_of_false);
            (Truthness::new(of_true, of_false), Some(right_probe))
        } else {
            // Without the right operand the truth of the whole expression
            // is unconfirmed; its falsehood is already guaranteed.
            (
                Truthness::new(
                    left_probe.truthness.of_true() / 2.0,
                    left_probe.truthness.of_false(),
                ),
                None,
            )
        };

        tracer.update_branch(file, line, branch, &truthness);
        self.last = Some(truthness);

        let left_value = left_probe.value?;
        match right_probe {
            Some(probe) if left_value => {
                let right_value = probe.value?;
                Ok(left_value && right_value)
            }
            // Left was falsy: short-circuit. A probed right operand's
            // error (if any) is swallowed here.
            _ => Ok(false),
        }
    }

    /// Emulate `left || right`; the exact mirror of [`evaluate_and`].
    ///
    /// The right operand is evaluated when the left operand is falsy, or
    /// speculatively when marked pure; its error is re-raised only in
    /// the former case.
    ///
    /// [`evaluate_and`]: Self::evaluate_and
    pub fn evaluate_or<E>(
        &mut self,
        tracer: &mut ExecutionTracer,
        left: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<bool, E>,
        right: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<bool, E>,
        right_is_pure: bool,
        file: &str,
        line: u32,
        branch: u32,
    ) -> Result<bool, E> {
        let left_probe = self.probe(tracer, left);
        let left_is_false = matches!(left_probe.value, Ok(false));

        let (truthness, right_probe) = if left_is_false || right_is_pure {
            let right_probe = self.probe(tracer, right);
            let right_of_true = if left_probe.value.is_err() {
                right_probe.truthness.of_true() / 2.0
            } else {
                right_probe.truthness.of_true()
            };
            let of_true = left_probe.truthness.of_true().max(right_of_true);
            let of_false =
                (left_probe.truthness.of_false() + right_probe.truthness.of_false()) / 2.0;
            (Truthness::new(of_true, of_false), Some(right_probe))
        } else {
            (
                Truthness::new(
                    left_probe.truthness.of_true(),
                    left_probe.truthness.of_false() / 2.0,
                ),
                None,
            )
        };

        tracer.update_branch(file, line, branch, &truthness);
        self.last = Some(truthness);

        let left_value = left_probe.value?;
        match right_probe {
            Some(probe) if !left_value => {
                let right_value = probe.value?;
                Ok(left_value || right_value)
            }
            // Left was truthy: short-circuit, probe errors swallowed.
            _ => Ok(true),
        }
    }

    /// Emulate `!value`.
    ///
    /// Inverts any pending truthness in place; the native result is
    /// untouched.
    pub fn handle_not(&mut self, value: bool) -> bool {
        if let Some(truthness) = self.last.take() {
            self.last = Some(truthness.invert());
        }
        !value
    }

    /// Emulate the taken arm of a ternary.
    ///
    /// The pending slot is cleared on entry and again on every exit path,
    /// so code after the ternary never observes gradient from inside the
    /// arm. Reaching the arm records full credit at the statement
    /// objective; an error records half credit and is re-raised.
    pub fn handle_ternary<T, E>(
        &mut self,
        tracer: &mut ExecutionTracer,
        arm: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<T, E>,
        file: &str,
        line: u32,
        index: u32,
    ) -> Result<T, E> {
        self.last = None;
        let outcome = arm(self, tracer);
        let credit = if outcome.is_ok() { 1.0 } else { 0.5 };
        tracer.update_statement(file, line, index, credit);
        self.last = None;
        outcome
    }

    /// Evaluate one operand, consuming whatever truthness its nested
    /// comparisons left in the pending slot.
    fn probe<E>(
        &mut self,
        tracer: &mut ExecutionTracer,
        operand: impl FnOnce(&mut Self, &mut ExecutionTracer) -> Result<bool, E>,
    ) -> Probe<E> {
        self.last = None;
        let value = operand(self, tracer);
        let truthness = match (&value, self.last.take()) {
            (Ok(_), Some(truthness)) => truthness.rescale_from_min(FLAG_NO_EXCEPTION),
            (Ok(outcome), None) => Truthness::crisp(*outcome),
            (Err(_), _) => Truthness::new(EXCEPTION, EXCEPTION),
        };
        Probe { value, truthness }
    }
}

/// Evaluate `left op right` without tracer interaction.
///
/// Returns the native result together with the truthness gradient. The
/// two are computed independently: the gradients for `>=`, `<=` and `>`
/// come from inverting the `<` heuristic, while the native result always
/// follows the host operator (`NaN >= x` stays false even though it is
/// the logical negation of `NaN < x`).
pub fn compare_values(left: &Value, op: CmpOp, right: &Value) -> (bool, Truthness) {
    match op {
        CmpOp::StrictEq => strict_equality(left, right),
        CmpOp::StrictNe => {
            let (result, truthness) = strict_equality(left, right);
            (!result, truthness.invert())
        }
        CmpOp::Eq => loose_equality(left, right),
        CmpOp::Ne => {
            let (result, truthness) = loose_equality(left, right);
            (!result, truthness.invert())
        }
        CmpOp::Lt => less_than(left, right),
        CmpOp::Ge => {
            let (_, truthness) = less_than(left, right);
            (left.native_ge(right), truthness.invert())
        }
        CmpOp::Le => {
            let (_, truthness) = less_than(right, left);
            (left.native_le(right), truthness.invert())
        }
        CmpOp::Gt => {
            let (_, truthness) = compare_values(left, CmpOp::Le, right);
            (left.native_gt(right), truthness.invert())
        }
    }
}

fn strict_equality(left: &Value, right: &Value) -> (bool, Truthness) {
    let result = left.strict_eq(right);
    let truthness = match (left, right) {
        (Value::Number(a), Value::Number(b)) => equality_truthness_number(*a, *b),
        (Value::Text(a), Value::Text(b)) => equality_truthness_string(a, b),
        _ => Truthness::crisp(result),
    };
    (result, truthness)
}

fn loose_equality(left: &Value, right: &Value) -> (bool, Truthness) {
    match (left, right) {
        (Value::Number(_), Value::Number(_)) | (Value::Text(_), Value::Text(_)) => {
            strict_equality(left, right)
        }
        (Value::Number(_), Value::Text(_)) | (Value::Text(_), Value::Number(_)) => {
            let (a, b) = (left.text_form(), right.text_form());
            (a == b, equality_truthness_string(&a, &b))
        }
        _ => {
            let result = left.loose_eq(right);
            (result, Truthness::crisp(result))
        }
    }
}

fn less_than(left: &Value, right: &Value) -> (bool, Truthness) {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a < b, less_than_truthness(*a, *b)),
        (Value::Text(_), Value::Text(_))
        | (Value::Number(_), Value::Text(_))
        | (Value::Text(_), Value::Number(_)) => {
            let (a, b) = (left.text_form(), right.text_form());
            let truthness = less_than_truthness_string(&a, &b);
            (a < b, truthness)
        }
        _ => {
            let result = left.native_lt(right);
            (result, Truthness::crisp(result))
        }
    }
}
