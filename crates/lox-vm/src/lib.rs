//! Lox VM: the stack-based bytecode interpreter.
//!
//! Executes a [`lox_core::Chunk`] against an operand stack and a globals
//! table, reporting runtime errors with the source line of the failing
//! instruction.

pub mod error;
pub mod globals;
pub mod vm;

pub use error::RuntimeError;
pub use globals::Globals;
pub use vm::Vm;
