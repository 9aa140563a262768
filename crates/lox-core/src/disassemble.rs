//! Debug-only human-readable bytecode dump.
//!
//! Mirrors the disassembler convention common to bytecode-VM ports of
//! Lox: one line per instruction, the byte offset, the source line (or
//! `|` when unchanged from the previous instruction), the mnemonic, and
//! any operand. Never consulted by the VM's execution path — purely a
//! developer aid wired up behind the CLI's `--dump` flag and exercised by
//! tests that assert on the emitted opcode stream.

use crate::chunk::Chunk;
use crate::opcode::OpCode;
use std::fmt::Write as _;

/// Render every instruction in `chunk` as multi-line text.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");
    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Render the single instruction at `offset`, returning the offset of the
/// next instruction.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    if offset > 0 && chunk.line_at(offset) == chunk.line_at(offset - 1) {
        let _ = write!(out, "   | ");
    } else {
        let _ = write!(out, "{:4} ", chunk.line_at(offset));
    }

    let Some(op) = OpCode::from_byte(chunk.code[offset]) else {
        let _ = writeln!(out, "Unknown opcode {}", chunk.code[offset]);
        return offset + 1;
    };

    match op {
        OpCode::Constant | OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal => {
            let idx = chunk.code[offset + 1];
            let _ = writeln!(
                out,
                "{:-16} {:4} '{}'",
                op.mnemonic(),
                idx,
                chunk.read_constant(idx)
            );
            offset + 2
        }
        OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop => {
            let hi = chunk.code[offset + 1] as usize;
            let lo = chunk.code[offset + 2] as usize;
            let jump = (hi << 8) | lo;
            let target = if op == OpCode::Loop {
                offset + 3 - jump
            } else {
                offset + 3 + jump
            };
            let _ = writeln!(out, "{:-16} {:4} -> {}", op.mnemonic(), offset, target);
            offset + 3
        }
        simple => {
            let _ = writeln!(out, "{}", simple.mnemonic());
            offset + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn disassembles_a_constant_instruction() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(7.0));
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(idx, 1);
        chunk.write_op(OpCode::Return, 1);

        let text = disassemble_chunk(&chunk, "test");
        assert!(text.contains("OP_CONSTANT"));
        assert!(text.contains("'7'"));
        assert!(text.contains("OP_RETURN"));
    }
}
