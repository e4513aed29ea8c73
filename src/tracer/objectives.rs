//! Stable, human-readable coverage-objective identifiers.
//!
//! Identifiers follow the `{kind}_{file}_{line}_{id}` convention so the
//! driving framework can group objectives by prefix. Line numbers are
//! zero-padded so lexicographic order matches source order.

/// Objective id for reaching a file at all.
pub fn file_id(file: &str) -> String {
    format!("file_{file}")
}

/// Objective id for reaching a line.
pub fn line_id(file: &str, line: u32) -> String {
    format!("line_{file}_{line:05}")
}

/// Objective id for one side of a branch.
pub fn branch_id(file: &str, line: u32, branch: u32, then_branch: bool) -> String {
    let side = if then_branch { "true" } else { "false" };
    format!("branch_{file}_{line:05}_{branch}_{side}")
}

/// Objective id for a statement; also used as the marker pushed on the
/// per-action statement stack.
pub fn statement_id(file: &str, line: u32, index: u32) -> String {
    format!("statement_{file}_{line:05}_{index}")
}

/// Objective id for a call completing without error.
pub fn success_call_id(file: &str, line: u32, index: u32) -> String {
    format!("success_call_{file}_{line:05}_{index}")
}
