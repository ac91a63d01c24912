//! The executing account's bytecode plus `JUMPDEST` validity memoization.

use std::cell::RefCell;
use std::collections::HashMap;

const JUMPDEST: u8 = 0x5B;
const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7F;

/// A contract's bytecode, with a cache of which positions are valid jump
/// destinations. `JUMP`/`JUMPI` are hot, and recomputing the PUSH-data-skip
/// scan from the start of code on every jump would make long-running loops
/// quadratic, so both positive and negative answers are memoized.
#[derive(Debug, Clone)]
pub struct CodeStream {
    code: Vec<u8>,
    jumpdest_cache: RefCell<HashMap<usize, bool>>,
}

impl CodeStream {
    /// Wraps `code` for execution.
    pub fn new(code: Vec<u8>) -> Self {
        Self { code, jumpdest_cache: RefCell::new(HashMap::new()) }
    }

    /// The raw bytecode.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Code length in bytes.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Whether there is no code at all.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// The opcode byte at `pos`, or `None` past the end of code (reads past
    /// the end behave as an implicit `STOP`, per the yellow paper).
    pub fn opcode_at(&self, pos: usize) -> Option<u8> {
        self.code.get(pos).copied()
    }

    /// Whether `pos` is a valid `JUMP`/`JUMPI` target: `code[pos] == 0x5B`
    /// and `pos` does not fall inside the immediate-data window of a
    /// preceding `PUSH1..PUSH32`.
    pub fn is_valid_opcode(&self, pos: usize) -> bool {
        if let Some(&cached) = self.jumpdest_cache.borrow().get(&pos) {
            return cached;
        }
        let valid = self.compute_is_valid_opcode(pos);
        self.jumpdest_cache.borrow_mut().insert(pos, valid);
        valid
    }

    fn compute_is_valid_opcode(&self, pos: usize) -> bool {
        if self.code.get(pos) != Some(&JUMPDEST) {
            return false;
        }
        // Walk from the start of code tracking PUSH immediate-data windows;
        // this is the only way to tell a real JUMPDEST byte from one that
        // merely appears inside a preceding PUSH's pushed literal.
        let mut i = 0usize;
        while i < pos {
            let op = self.code[i];
            if (PUSH1..=PUSH32).contains(&op) {
                let data_len = (op - PUSH1 + 1) as usize;
                i += 1 + data_len;
            } else {
                i += 1;
            }
        }
        i == pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_jumpdest_is_valid() {
        let code = CodeStream::new(vec![JUMPDEST]);
        assert!(code.is_valid_opcode(0));
    }

    #[test]
    fn jumpdest_byte_inside_push_data_is_invalid() {
        // PUSH1 0x5B -- the 0x5B is data, not an opcode.
        let code = CodeStream::new(vec![PUSH1, JUMPDEST]);
        assert!(!code.is_valid_opcode(1));
    }

    #[test]
    fn jumpdest_after_push_data_window_is_valid() {
        // PUSH2 0x00 0x00, then JUMPDEST at position 3.
        let code = CodeStream::new(vec![0x61, 0x00, 0x00, JUMPDEST]);
        assert!(code.is_valid_opcode(3));
    }

    #[test]
    fn non_jumpdest_byte_is_invalid() {
        let code = CodeStream::new(vec![0x01]);
        assert!(!code.is_valid_opcode(0));
    }

    #[test]
    fn negative_answers_are_memoized_too() {
        let code = CodeStream::new(vec![PUSH1, JUMPDEST]);
        assert!(!code.is_valid_opcode(1));
        assert!(code.jumpdest_cache.borrow().contains_key(&1));
    }

    #[test]
    fn past_end_of_code_has_no_opcode() {
        let code = CodeStream::new(vec![0x01]);
        assert_eq!(code.opcode_at(5), None);
    }
}
