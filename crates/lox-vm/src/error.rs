//! Runtime diagnostics.
//!
//! Mirrors [`lox_compiler::error::CompileError`]'s shape: a plain struct
//! implementing `Display` + `std::error::Error`, carrying the source line
//! of the failing instruction alongside the message the spec's wire
//! format actually prints.

use std::fmt;

/// One runtime error. `line` is the source line of the instruction that
/// faulted — kept for callers that want richer diagnostics (e.g. a future
/// `--verbose` flag) even though the required stderr format
/// (`Runtime error: <message>\n`) does not include it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub line: u32,
    pub message: String,
}

impl RuntimeError {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        RuntimeError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}
