//! Branch-distance heuristics.
//!
//! Everything needed to turn a crisp boolean outcome into a graded
//! search signal: distance metrics between primitive values, the
//! [`Truthness`] score type, and the [`BooleanEvaluator`] that mirrors
//! the host's operators while emitting gradients.

mod distance;
mod engine;
mod truthness;
mod value;

pub use distance::{
    distance_to_equality_number, distance_to_equality_string, left_alignment_distance,
    MAX_CHAR_DISTANCE,
};
pub use engine::{compare_values, BooleanEvaluator, CmpOp};
pub use truthness::{
    equality_truthness_number, equality_truthness_string, less_than_truthness,
    less_than_truthness_string, normalize_distance, Truthness,
};
pub use value::Value;

/// Minimum non-zero heuristic floor: the code was reached, but the
/// outcome carries no usable gradient.
pub const FLAG_NO_EXCEPTION: f64 = 0.01;

/// Floor assigned when an operand evaluation aborted with an error. An
/// aborted evaluation is judged further from both outcomes than a
/// merely-unresolved one.
pub const EXCEPTION: f64 = FLAG_NO_EXCEPTION / 2.0;
