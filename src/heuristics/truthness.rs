//! Graded boolean outcomes and their derivation from distances.
//!
//! A [`Truthness`] replaces a crisp boolean with a pair of scores: how
//! close the expression came to being true, and how close to being
//! false. The side matching the real outcome is 1.0; the other side is a
//! sub-1 gradient the search can climb toward the uncovered branch.

use serde::Serialize;

use super::distance::{distance_to_equality_number, left_alignment_distance};
use super::FLAG_NO_EXCEPTION;

/// Graded (of_true, of_false) score standing in for a boolean outcome.
///
/// Both sides live in the open-closed interval (0, 1]. Truthness is
/// immutable; every operation returns a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Truthness {
    of_true: f64,
    of_false: f64,
}

impl Truthness {
    /// Create a new truthness.
    ///
    /// # Panics
    ///
    /// Panics if either side is outside (0, 1]. A side of exactly 0 is
    /// never valid: it gives the search no gradient to climb.
    pub fn new(of_true: f64, of_false: f64) -> Self {
        assert!(
            of_true > 0.0 && of_true <= 1.0,
            "of_true out of (0, 1]: {of_true}"
        );
        assert!(
            of_false > 0.0 && of_false <= 1.0,
            "of_false out of (0, 1]: {of_false}"
        );
        Self { of_true, of_false }
    }

    /// Crisp truthness for an outcome that carries no usable gradient.
    ///
    /// The side matching the outcome is 1.0; the other side sits at the
    /// [`FLAG_NO_EXCEPTION`] floor so the opposite branch still registers
    /// as reached.
    pub fn crisp(outcome: bool) -> Self {
        if outcome {
            Self::new(1.0, FLAG_NO_EXCEPTION)
        } else {
            Self::new(FLAG_NO_EXCEPTION, 1.0)
        }
    }

    /// How close the expression came to being true, in (0, 1].
    pub fn of_true(&self) -> f64 {
        self.of_true
    }

    /// How close the expression came to being false, in (0, 1].
    pub fn of_false(&self) -> f64 {
        self.of_false
    }

    /// The two sides swapped.
    ///
    /// Derives a relation from its logical negation, e.g. `>=` from `<`.
    pub fn invert(&self) -> Self {
        Self {
            of_true: self.of_false,
            of_false: self.of_true,
        }
    }

    /// Stretch the non-maximal sides onto the floor `base`.
    ///
    /// An enclosing combinator uses this so nested heuristics compose
    /// onto a consistent minimum gradient regardless of nesting depth:
    /// a side that is already 1 stays 1, any other side is mapped into
    /// `[base, 1)`.
    pub fn rescale_from_min(&self, base: f64) -> Self {
        Self::new(
            rescale(self.of_true, base),
            rescale(self.of_false, base),
        )
    }

    /// Whether the real outcome was true.
    pub fn is_true(&self) -> bool {
        self.of_true >= 1.0
    }

    /// Whether the real outcome was false.
    pub fn is_false(&self) -> bool {
        self.of_false >= 1.0
    }
}

fn rescale(side: f64, base: f64) -> f64 {
    if side >= 1.0 {
        1.0
    } else {
        base + (1.0 - base) * side
    }
}

/// Map a non-negative distance into [0, 1).
///
/// Monotonically increasing, 0 only at distance 0, approaching 1 as the
/// distance grows. The canonical `d / (d + 1)` curve is used; note that
/// for distances near `f64::MAX` the quotient rounds to 1.0, which is why
/// the equality derivation computes the complement in reciprocal form.
///
/// # Panics
///
/// Panics if the distance is negative or NaN.
pub fn normalize_distance(distance: f64) -> f64 {
    assert!(distance >= 0.0, "negative distance: {distance}");
    distance / (distance + 1.0)
}

/// Truthness of `a == b` for two numbers.
pub fn equality_truthness_number(a: f64, b: f64) -> Truthness {
    equality_truthness(distance_to_equality_number(a, b), a == b)
}

/// Truthness of `a == b` for two strings.
pub fn equality_truthness_string(a: &str, b: &str) -> Truthness {
    equality_truthness(left_alignment_distance(a, b), a == b)
}

/// Truthness of an equality with a precomputed distance.
///
/// `of_true` is the complement of the normalized distance, computed as
/// `1 / (1 + d)` so it stays strictly positive even at the sentinel
/// distance. When the values are equal, `of_false` keeps the small
/// positive floor: the opposite branch must always have a gradient.
fn equality_truthness(distance: f64, equal: bool) -> Truthness {
    let of_true = 1.0 / (1.0 + distance);
    let of_false = if equal { FLAG_NO_EXCEPTION } else { 1.0 };
    Truthness::new(of_true, of_false)
}

/// Truthness of `a < b` for two numbers.
///
/// The satisfied side is 1; the unsatisfied side falls off with the
/// distance between the operands.
pub fn less_than_truthness(a: f64, b: f64) -> Truthness {
    let distance = distance_to_equality_number(a, b);
    Truthness::new(
        if a < b { 1.0 } else { 1.0 / (1.1 + distance) },
        if a >= b { 1.0 } else { 1.0 / (1.1 + distance) },
    )
}

/// Truthness of `a < b` for two strings, ordered lexicographically and
/// graded by positional distance.
pub fn less_than_truthness_string(a: &str, b: &str) -> Truthness {
    let distance = left_alignment_distance(a, b);
    Truthness::new(
        if a < b { 1.0 } else { 1.0 / (1.1 + distance) },
        if a >= b { 1.0 } else { 1.0 / (1.1 + distance) },
    )
}
