//! The VM's global-variable binding table.
//!
//! A linear associative structure keyed by `ObjString` name with
//! byte-equality (an `Rc<str>`'s `Hash`/`Eq` already delegate to the
//! pointee, so a plain `HashMap` gives the required byte-equal lookup —
//! see §3 of the spec), bounded to 256 entries. Exceeding the cap is a
//! known, preserved quirk (§9): later definitions are silently dropped
//! rather than erroring.
use std::collections::HashMap;
use std::rc::Rc;

use lox_core::value::Value;

/// The known limit named in §9: the compiler's single-byte constant
/// index can only ever name 256 distinct strings per chunk, so the
/// globals table is never asked to hold more than that from a single
/// compilation in practice. The cap here guards the case a REPL session
/// accumulates globals across many `interpret` calls.
const MAX_GLOBALS: usize = 256;

#[derive(Debug, Default)]
pub struct Globals {
    map: HashMap<Rc<str>, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Globals::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// `var` declarations always succeed once under the cap; redefining
    /// an existing global is always allowed regardless of the cap (it
    /// doesn't grow the table).
    pub fn define(&mut self, name: Rc<str>, value: Value) {
        if self.map.len() >= MAX_GLOBALS && !self.map.contains_key(&name) {
            tracing::warn!(%name, "global table full, dropping definition");
            return;
        }
        self.map.insert(name, value);
    }

    /// Assignment to an undeclared global is a runtime error; returns
    /// `false` so the VM can raise it with the right source line.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.map.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}
