//! Interactive read-eval-print loop.
//!
//! One [`lox_vm::Vm`] lives for the whole session, so globals declared on
//! one line are visible on the next (SPEC_FULL.md's REDESIGN FLAGS: the
//! spec leaves this an implementor's choice; resetting per line would
//! make `var`s forgotten one keystroke later, which is not a usable
//! REPL). Each line is compiled and run independently — a compile error
//! on one line does not end the session.

use std::io::{self, BufRead, Write};

use lox_core::disassemble::disassemble_chunk;
use lox_vm::Vm;

use crate::driver::{self, LoxError};

const PROMPT: &str = "> ";

/// Run the REPL to completion. Terminates on end-of-input or a line that
/// is `exit` once trimmed, case-insensitively. Always returns exit code
/// 0 — per-line compile/runtime errors are reported to stderr and do not
/// end the session.
pub fn run(dump: bool) -> i32 {
    let mut vm = Vm::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{PROMPT}");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => break,
        };
        if bytes_read == 0 {
            break; // end-of-input
        }

        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        if dump {
            match driver::compile_chunk(&line) {
                Ok(chunk) => print!("{}", disassemble_chunk(&chunk, "repl")),
                Err(errors) => {
                    driver::report_compile_errors(&errors);
                    continue;
                }
            }
        }

        match driver::interpret(&line, &mut vm, &mut stdout) {
            Ok(()) => {}
            Err(LoxError::Compile(errors)) => driver::report_compile_errors(&errors),
            Err(LoxError::Runtime(err)) => eprintln!("{err}"),
        }
    }

    0
}
