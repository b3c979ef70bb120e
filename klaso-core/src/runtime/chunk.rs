//! Compiled instruction chunk
//!
//! One chunk per compiled method body or field initializer: a flat opcode
//! vector plus a constant pool. Jump operands are relative to the next
//! instruction and are always forward (the body IR has no loops).

use crate::model::value::Value;

/// One instruction of a compiled body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Push constant pool entry
    Const(u16),
    /// Push the n-th call argument
    Param(u8),
    /// Push instance field at layout index
    GetField(u16),
    /// Pop a value, store it at layout index, push it back
    SetField(u16),
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Unconditional relative jump
    Jump(i16),
    /// Pop; jump if falsy
    JumpIfFalse(i16),
    /// Peek; jump if falsy (short-circuit `and`)
    JumpIfFalsePeek(i16),
    /// Peek; jump if truthy (short-circuit `or`)
    JumpIfTruePeek(i16),
    Pop,
    /// Dispatch through the receiving instance's vtable
    Invoke { slot: u16, argc: u8 },
    /// Direct call into the defining class's private table
    CallPrivate { index: u16, argc: u8 },
    Return,
}

/// A compiled body: instructions plus constant pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    ops: Vec<Op>,
    consts: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn consts(&self) -> &[Value] {
        &self.consts
    }

    pub fn constant(&self, index: u16) -> Option<&Value> {
        self.consts.get(index as usize)
    }

    /// Append an instruction, returning its position (used for patching)
    pub fn emit(&mut self, op: Op) -> usize {
        self.ops.push(op);
        self.ops.len() - 1
    }

    /// Intern a constant, returning its pool index
    ///
    /// `None` when the pool is full (caller reports the limit error with
    /// class context this chunk does not carry).
    pub fn add_const(&mut self, value: Value) -> Option<u16> {
        if self.consts.len() > u16::MAX as usize {
            return None;
        }
        self.consts.push(value);
        Some((self.consts.len() - 1) as u16)
    }

    /// Point the jump at `at` to the current end of the chunk
    ///
    /// `None` when the distance does not fit the operand (caller reports
    /// the limit error with class context this chunk does not carry).
    pub fn patch_jump(&mut self, at: usize) -> Option<()> {
        let offset = i16::try_from(self.ops.len() - at - 1).ok()?;
        match &mut self.ops[at] {
            Op::Jump(o)
            | Op::JumpIfFalse(o)
            | Op::JumpIfFalsePeek(o)
            | Op::JumpIfTruePeek(o) => *o = offset,
            other => unreachable!("patch_jump on non-jump op {other:?}"),
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_and_patch_jump() {
        let mut chunk = Chunk::new();
        let c = chunk.add_const(Value::Bool(true)).unwrap();
        chunk.emit(Op::Const(c));
        let jump = chunk.emit(Op::JumpIfFalse(0));
        chunk.emit(Op::Const(c));
        chunk.emit(Op::Pop);
        chunk.patch_jump(jump).unwrap();
        // Jump lands just past the two ops that follow it
        assert_eq!(chunk.ops()[jump], Op::JumpIfFalse(2));
    }

    #[test]
    fn test_patch_jump_rejects_distance_past_operand_range() {
        let mut chunk = Chunk::new();
        let jump = chunk.emit(Op::Jump(0));
        for _ in 0..=i16::MAX as usize {
            chunk.emit(Op::Pop);
        }
        // One past the operand's range; the op is left unpatched
        assert!(chunk.patch_jump(jump).is_none());
        assert_eq!(chunk.ops()[jump], Op::Jump(0));
    }

    #[test]
    fn test_constant_pool_indices() {
        let mut chunk = Chunk::new();
        let a = chunk.add_const(Value::Int(1)).unwrap();
        let b = chunk.add_const(Value::Int(2)).unwrap();
        assert_eq!((a, b), (0, 1));
        assert_eq!(chunk.constant(b), Some(&Value::Int(2)));
        assert_eq!(chunk.constant(99), None);
    }
}
