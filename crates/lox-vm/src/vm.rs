//! The stack-based bytecode virtual machine.
//!
//! A single-threaded fetch-decode-dispatch loop over a [`Chunk`]'s code.
//! No preemption, no suspension points: one `run` call either halts at
//! `OP_RETURN` or returns the first [`RuntimeError`] it hits.

use std::io::Write;
use std::rc::Rc;

use lox_core::chunk::Chunk;
use lox_core::opcode::OpCode;
use lox_core::value::Value;

use crate::error::RuntimeError;
use crate::globals::Globals;

/// Initial operand stack capacity. Grows by `Vec`'s own doubling policy
/// past this; chosen generously enough that typical programs never
/// reallocate.
const STACK_INITIAL_CAPACITY: usize = 256;

pub struct Vm {
    stack: Vec<Value>,
    globals: Globals,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            stack: Vec::with_capacity(STACK_INITIAL_CAPACITY),
            globals: Globals::new(),
        }
    }

    /// Execute `chunk` to completion, writing `OP_PRINT` output to
    /// `stdout`. The operand stack starts empty for every call; the
    /// globals table is **not** reset — see `lox-cli`'s driver for the
    /// REPL-persistence policy this enables.
    pub fn interpret<W: Write>(
        &mut self,
        chunk: &Chunk,
        stdout: &mut W,
    ) -> Result<(), RuntimeError> {
        self.stack.clear();
        let mut ip = 0usize;

        loop {
            let line = chunk.line_at(ip);
            let op = OpCode::from_byte(chunk.code[ip])
                .unwrap_or_else(|| panic!("corrupt chunk: invalid opcode byte at {ip}"));
            ip += 1;

            match op {
                OpCode::Constant => {
                    let idx = chunk.code[ip];
                    ip += 1;
                    self.push(chunk.read_constant(idx).clone());
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::GetGlobal => {
                    let name = self.read_name(chunk, ip);
                    ip += 1;
                    match self.globals.get(&name) {
                        Some(value) => {
                            let value = value.clone();
                            self.push(value);
                        }
                        None => {
                            return Err(RuntimeError::new(
                                line,
                                format!("Undefined variable '{name}'."),
                            ))
                        }
                    }
                }
                OpCode::DefineGlobal => {
                    let name = self.read_name(chunk, ip);
                    ip += 1;
                    let value = self.pop();
                    self.globals.define(name, value);
                }
                OpCode::SetGlobal => {
                    let name = self.read_name(chunk, ip);
                    ip += 1;
                    // Assignment yields the value: it stays on the
                    // stack rather than being popped (§4.5, §9).
                    let value = self.peek(0).clone();
                    if !self.globals.assign(&name, value) {
                        return Err(RuntimeError::new(
                            line,
                            format!("Undefined variable '{name}'."),
                        ));
                    }
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                }
                OpCode::Greater => self.numeric_binary(line, |a, b| Value::Bool(a > b))?,
                OpCode::Less => self.numeric_binary(line, |a, b| Value::Bool(a < b))?,
                OpCode::Add => self.numeric_binary(line, |a, b| Value::Number(a + b))?,
                OpCode::Subtract => self.numeric_binary(line, |a, b| Value::Number(a - b))?,
                OpCode::Multiply => self.numeric_binary(line, |a, b| Value::Number(a * b))?,
                OpCode::Divide => {
                    self.check_numeric_operands(line)?;
                    let b = self.pop().as_number().unwrap();
                    let a = self.pop().as_number().unwrap();
                    if b == 0.0 {
                        return Err(RuntimeError::new(line, "Division by zero."));
                    }
                    self.push(Value::Number(a / b));
                }
                OpCode::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(!value.is_truthy()));
                }
                OpCode::Negate => {
                    let Some(n) = self.peek(0).as_number() else {
                        return Err(RuntimeError::new(line, "Operand must be a number."));
                    };
                    *self.stack.last_mut().unwrap() = Value::Number(-n);
                }
                OpCode::Print => {
                    let value = self.pop();
                    // Trailing-newline and exact display form are part of
                    // the wire contract (§6); an I/O failure writing to
                    // stdout is outside what the language can recover
                    // from, so we surface it as a panic rather than a Lox
                    // runtime error.
                    writeln!(stdout, "{value}").expect("failed to write to stdout");
                }
                OpCode::Jump => {
                    let offset = self.read_u16(chunk, ip);
                    ip += 2;
                    ip += offset as usize;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16(chunk, ip);
                    ip += 2;
                    if !self.peek(0).is_truthy() {
                        self.pop();
                        ip += offset as usize;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_u16(chunk, ip);
                    ip += 2;
                    ip -= offset as usize;
                }
                OpCode::Return => return Ok(()),
            }
        }
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("stack underflow: unbalanced bytecode")
    }

    fn peek(&self, distance: usize) -> &Value {
        let len = self.stack.len();
        &self.stack[len - 1 - distance]
    }

    fn read_u16(&self, chunk: &Chunk, at: usize) -> u16 {
        let hi = chunk.code[at] as u16;
        let lo = chunk.code[at + 1] as u16;
        (hi << 8) | lo
    }

    /// Read the `ObjString` name out of the constant pool at the index
    /// encoded at `at`. The compiler guarantees every global opcode's
    /// operand indexes a string constant; this is a chunk invariant, not
    /// user-facing behavior, so it panics rather than threading a
    /// `RuntimeError` through a case that cannot arise from this crate's
    /// own compiler.
    fn read_name(&self, chunk: &Chunk, at: usize) -> Rc<str> {
        let idx = chunk.code[at];
        match chunk.read_constant(idx) {
            Value::ObjString(s) => s.clone(),
            other => panic!("corrupt chunk: global opcode operand is not a string: {other:?}"),
        }
    }

    fn check_numeric_operands(&self, line: u32) -> Result<(), RuntimeError> {
        if self.peek(0).as_number().is_some() && self.peek(1).as_number().is_some() {
            Ok(())
        } else {
            Err(RuntimeError::new(line, "Operands must be numbers."))
        }
    }

    fn numeric_binary(
        &mut self,
        line: u32,
        op: impl Fn(f64, f64) -> Value,
    ) -> Result<(), RuntimeError> {
        self.check_numeric_operands(line)?;
        let b = self.pop().as_number().unwrap();
        let a = self.pop().as_number().unwrap();
        self.push(op(a, b));
        Ok(())
    }
}
