//! Library half of the `lox` binary: the phase-tagged driver, the REPL
//! loop, and exit-code mapping, split out of `main.rs` so the CLI's
//! end-to-end behavior is unit-testable without spawning the binary.

pub mod driver;
pub mod repl;

pub use driver::{interpret, LoxError};
