//! Finished compiled units.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use tempo_core::TypeHash;

use super::instr::Instr;
use super::opcode::OpCode;

bitflags! {
    /// Properties the VM needs to know about a code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CodeFlags: u8 {
        /// No call to an impure function was emitted.
        const PURE = 1 << 0;
        /// Class initializer.
        const CTOR = 1 << 1;
        /// Destructor body.
        const DTOR = 1 << 2;
        /// Host callback; no interpreted instructions.
        const BUILTIN = 1 << 3;
        /// Results are cached per argument tuple.
        const MEMOIZE = 1 << 4;
    }
}

/// Shared handle to finished code.
pub type SharedCode = Arc<Code>;

/// One compiled unit: a function body, class initializer, spawned body or
/// top-level program.
///
/// Immutable once built. Call sites hold it through [`SharedCode`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Code {
    /// Display name, e.g. `class Osc` or `spork~code:12`.
    pub name: String,
    /// Instructions.
    pub instrs: Vec<Instr>,
    /// Bytes of frame the VM reserves (high-water mark of all scopes).
    pub frame_size: u32,
    /// Bytes the code expects on entry: receiver, arguments and variadic pack.
    pub stack_depth: u32,
    /// Flags.
    pub flags: CodeFlags,
    /// Host callback identity for built-in callables.
    pub native: Option<TypeHash>,
}

impl Code {
    /// Create empty code.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Code standing for a host callback.
    pub fn native(name: impl Into<String>, callback: TypeHash) -> Self {
        Self {
            name: name.into(),
            flags: CodeFlags::BUILTIN,
            native: Some(callback),
            ..Self::default()
        }
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Whether the code has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Instruction at `pc`.
    pub fn instr(&self, pc: usize) -> Option<&Instr> {
        self.instrs.get(pc)
    }

    /// The opcode sequence.
    pub fn opcodes(&self) -> Vec<OpCode> {
        self.instrs.iter().map(|i| i.op).collect()
    }

    /// Number of instructions with the given opcode.
    pub fn count(&self, op: OpCode) -> usize {
        self.instrs.iter().filter(|i| i.op == op).count()
    }

    /// Index of the first instruction with the given opcode.
    pub fn find(&self, op: OpCode) -> Option<usize> {
        self.instrs.iter().position(|i| i.op == op)
    }

    /// Assert that the opcode sequence matches exactly.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch in '{}'.\nExpected: {:?}\nActual:   {:?}",
            self.name,
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Assert that the given opcodes appear in order, not necessarily contiguous.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "code '{}' frame={} depth={} flags={:?}",
            self.name, self.frame_size, self.stack_depth, self.flags
        )?;
        for (pc, instr) in self.instrs.iter().enumerate() {
            writeln!(f, "  {pc:04} {instr}")?;
        }
        Ok(())
    }
}
