//! End-to-end tests driving the built `lox` binary, covering every
//! scenario in spec.md §8 plus the CLI's exit-code contract (§6).

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write as _;
use tempfile::NamedTempFile;

fn lox() -> Command {
    Command::cargo_bin("lox").unwrap()
}

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

#[test]
fn scenario_arithmetic_precedence() {
    let file = script("print 1 + 2 * 3;");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn scenario_globals_and_reassignment() {
    let file = script("var a = 2; var b = 3; print a + b; a = a + 10; print a;");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("5\n12\n");
}

#[test]
fn scenario_if_else() {
    let file = script("var x = 1; if (x == 1) print \"yes\"; else print \"no\";");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("yes\n");
}

#[test]
fn scenario_while_loop() {
    let file = script("var i = 0; while (i < 3) { print i; i = i + 1; }");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("0\n1\n2\n");
}

#[test]
fn scenario_division_by_zero_exits_70() {
    let file = script("print 1 / 0;");
    lox()
        .arg(file.path())
        .assert()
        .code(70)
        .stderr("Runtime error: Division by zero.\n");
}

#[test]
fn scenario_undefined_variable_exits_70() {
    let file = script("print undefined_var;");
    lox()
        .arg(file.path())
        .assert()
        .code(70)
        .stderr("Runtime error: Undefined variable 'undefined_var'.\n");
}

#[test]
fn scenario_unary_and_truthiness() {
    let file = script("print -(3 + 4); print !nil; print !!0;");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("-7\ntrue\ntrue\n");
}

#[test]
fn usage_error_on_multiple_arguments_exits_64() {
    lox()
        .arg("one.lox")
        .arg("two.lox")
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Usage: lox [script]"));
}

#[test]
fn compile_error_exits_65() {
    let file = script("print 1");
    lox()
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Error at end"));
}

#[test]
fn unterminated_string_is_a_compile_error() {
    let file = script("print \"abc;");
    lox()
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Unterminated string."));
}

#[test]
fn nested_blocks_execute() {
    let file = script("var a = 1; { var unused = a; print a + 1; }");
    lox()
        .arg(file.path())
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn dump_flag_prints_disassembly_before_running() {
    let file = script("print 1 + 2;");
    lox()
        .arg("--dump")
        .arg(file.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("OP_CONSTANT")
                .and(predicate::str::contains("OP_RETURN"))
                .and(predicate::str::contains("3\n")),
        );
}

#[test]
fn missing_file_exits_with_an_io_error_code() {
    lox()
        .arg("/nonexistent/path/does/not/exist.lox")
        .assert()
        .code(74);
}

#[test]
fn repl_exits_cleanly_on_exit_command() {
    lox()
        .write_stdin("print 1 + 1;\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2\n"));
}

#[test]
fn repl_persists_globals_across_lines() {
    lox()
        .write_stdin("var a = 10;\nprint a + 5;\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("15\n"));
}

#[test]
fn repl_terminates_on_eof_without_exit_command() {
    lox()
        .write_stdin("print 42;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("42\n"));
}
