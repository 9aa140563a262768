//! Compile-time diagnostics.
//!
//! Mirrors the teacher's `CodeGenError` shape (a plain enum implementing
//! `Display` + `std::error::Error`) rather than a `thiserror` derive,
//! since the compiler crate carries no such dependency.

use std::fmt;

/// One compile-time error, already formatted with its location the way
/// §6 of the spec requires: ` at end`, ` at 'LEXEME'`, or empty for
/// scanner-originated errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub line: u32,
    pub location: String,
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[line {}] Error{}: {}",
            self.line, self.location, self.message
        )
    }
}

impl std::error::Error for CompileError {}
