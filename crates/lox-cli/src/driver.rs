//! The driver: wires scanner → compiler → VM together and tags the
//! result with the phase that produced it, per §4.6 and §6 of the spec.

use std::fmt;
use std::io::Write;

use lox_compiler::{compile, CompileError};
use lox_core::chunk::Chunk;
use lox_vm::{RuntimeError, Vm};

/// Top-level result of running one piece of source, tagged by the phase
/// that failed. Never itself printed — each variant's payload already
/// implements the exact wire format §6 requires; `lox-cli`'s callers use
/// the tag only to pick an exit code.
#[derive(Debug)]
pub enum LoxError {
    Compile(Vec<CompileError>),
    Runtime(RuntimeError),
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoxError::Compile(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            LoxError::Runtime(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoxError {}

/// Compile `source` into a fresh chunk, stopping before execution. Used
/// directly by `--dump` (to disassemble before running) and internally
/// by [`interpret`].
pub fn compile_chunk(source: &str) -> Result<Chunk, Vec<CompileError>> {
    let mut chunk = Chunk::new();
    compile(source, &mut chunk)?;
    Ok(chunk)
}

/// Compile and run `source` against `vm`, writing `OP_PRINT` output to
/// `stdout`. `vm`'s operand stack always starts empty for a call; its
/// globals table is whatever the caller carried in — see the REPL for
/// the policy that makes cross-call persistence a CLI-level choice
/// (SPEC_FULL.md's REDESIGN FLAGS).
pub fn interpret<W: Write>(source: &str, vm: &mut Vm, stdout: &mut W) -> Result<(), LoxError> {
    let chunk = compile_chunk(source).map_err(LoxError::Compile)?;
    vm.interpret(&chunk, stdout).map_err(LoxError::Runtime)
}

/// Print every compile error to stderr in the exact `[line N]
/// Error<location>: <message>` wire format (§6), one per line.
pub fn report_compile_errors(errors: &[CompileError]) {
    for err in errors {
        eprintln!("{err}");
    }
}
